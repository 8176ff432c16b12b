//! Typed view of a compose document.
//!
//! Only the fields the patcher touches are modelled; everything else is
//! carried through the flattened mappings so a load/save cycle keeps the
//! document's key set.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeFile {
    pub services: BTreeMap<String, Service>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// An image reference split at the first delimiter: `repository:tag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub repository: &'a str,
    pub tag: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    pub fn parse(image: &'a str, delimiter: &str) -> Self {
        match image.split_once(delimiter) {
            Some((repository, tag)) => Self {
                repository,
                tag: Some(tag),
            },
            None => Self {
                repository: image,
                tag: None,
            },
        }
    }

    pub fn with_tag(&self, delimiter: &str, tag: &str) -> String {
        format!("{}{delimiter}{tag}", self.repository)
    }
}
