pub mod applicator;
pub mod loader;
pub mod presets;
pub mod schema;

pub use applicator::{
    apply_patches, check_patches, ApplicationError, ApplyOptions, ApplyReport, FileChange,
    PatchResult,
};
pub use loader::{discover_patch_files, load_from_path, load_from_str, ConfigError};
pub use schema::{
    Metadata, Operation, PatchConfig, PatchDefinition, ValidationError, ValidationIssue,
};
