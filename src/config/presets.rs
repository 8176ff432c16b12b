//! Built-in patch sets for the store demo's container setup.
//!
//! Each preset targets one file at a fixed workspace-relative path and
//! takes its value from the command-line argument.

use crate::config::schema::{Metadata, Operation, PatchConfig, PatchDefinition};

pub const DOCKER_ENV: &str = "docker_env";
pub const DOCKERFILE: &str = "docker-magento/Dockerfile";
pub const COMPOSE_FILE: &str = "docker-compose.yml";

pub const HOSTNAME_MARKER: &str = "MAGENTO_URL";
pub const SAMPLE_DATA_LINE: &str = "RUN chmod +x /usr/local/bin/install-sampledata";
pub const PHP_IMAGE: &str = "alexcheng/apache2-php5";
pub const STORE_SERVICE: &str = "web";

/// Point the store at the public tunnel hostname.
pub fn set_hostname(file: &str) -> PatchConfig {
    single(
        "set-hostname",
        "store hostname for the tunnel URL",
        PatchDefinition {
            id: "store-hostname".to_string(),
            file: file.to_string(),
            operation: Operation::ReplaceValue {
                marker: HOSTNAME_MARKER.to_string(),
                separator: "=".to_string(),
                value: None,
            },
            require_match: false,
        },
    )
}

/// Stop the image build from installing sample data.
pub fn remove_sample_data(file: &str) -> PatchConfig {
    single(
        "remove-sample-data",
        "skip the sample data installer",
        PatchDefinition {
            id: "drop-sample-data".to_string(),
            file: file.to_string(),
            operation: Operation::RemoveLine {
                line: SAMPLE_DATA_LINE.to_string(),
            },
            require_match: false,
        },
    )
}

/// Build the store image on a different PHP base image tag.
pub fn set_php(file: &str) -> PatchConfig {
    single(
        "set-php",
        "PHP base image version",
        PatchDefinition {
            id: "php-base-image".to_string(),
            file: file.to_string(),
            operation: Operation::ReplaceTag {
                marker: PHP_IMAGE.to_string(),
                delimiter: ":".to_string(),
                value: None,
            },
            require_match: false,
        },
    )
}

/// Run the store container from a different image tag.
pub fn set_magento_version(file: &str, service: &str) -> PatchConfig {
    single(
        "set-magento-version",
        "store image tag",
        PatchDefinition {
            id: "store-image-tag".to_string(),
            file: file.to_string(),
            operation: Operation::SetImageTag {
                service: service.to_string(),
                delimiter: ":".to_string(),
                value: None,
            },
            require_match: false,
        },
    )
}

/// Substitute a placeholder everywhere in `file`.
pub fn replace_placeholder(file: &str, placeholder: &str) -> PatchConfig {
    single(
        "replace-placeholder",
        "placeholder substitution",
        PatchDefinition {
            id: "fill-placeholder".to_string(),
            file: file.to_string(),
            operation: Operation::ReplaceAll {
                placeholder: placeholder.to_string(),
                value: None,
            },
            require_match: false,
        },
    )
}

fn single(name: &str, description: &str, patch: PatchDefinition) -> PatchConfig {
    PatchConfig {
        meta: Metadata {
            name: name.to_string(),
            description: Some(description.to_string()),
        },
        patches: vec![patch],
    }
}
