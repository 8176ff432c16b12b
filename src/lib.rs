//! Tunnel Patcher: configuration patching for a containerized store demo
//!
//! Rewrites the handful of local files (environment file, Dockerfile,
//! compose file) that have to change before the demo store can be served
//! through a public tunnel URL.
//!
//! # Architecture
//!
//! Every operation compiles down to a single primitive: [`Rewrite`], a
//! verified whole-file replacement. Operations themselves are pure
//! transforms over in-memory content:
//!
//! - [`text`]: line and placeholder edits (`KEY=value`, Dockerfile lines, tags)
//! - [`compose`]: typed updates to a compose document's `services.<name>.image`
//!
//! [`config`] describes patches as data (TOML patch sets and built-in
//! presets) and applies them file by file.
//!
//! # Safety
//!
//! - Atomic file writes (tempfile + fsync + rename)
//! - Content verification before overwrite
//! - Workspace boundary enforcement
//! - Idempotent operations
//!
//! # Example
//!
//! ```no_run
//! use tunnel_patcher::config::{apply_patches, presets, ApplyOptions};
//! use std::path::Path;
//!
//! let config = presets::set_hostname(presets::DOCKER_ENV);
//! let options = ApplyOptions {
//!     argument: Some("abc123.ngrok.io".to_string()),
//!     strict: false,
//! };
//!
//! let report = apply_patches(&config, Path::new("."), &options);
//! for (id, result) in &report.results {
//!     match result {
//!         Ok(outcome) => println!("{id}: {outcome}"),
//!         Err(e) => eprintln!("{id}: {e}"),
//!     }
//! }
//! ```

pub mod compose;
pub mod config;
pub mod edit;
pub mod plan;
pub mod safety;
pub mod text;

// Re-exports
pub use compose::{ComposeEditor, ComposeError, ComposeFile, ImageTagUpdate};
pub use config::{
    apply_patches, check_patches, load_from_path, load_from_str, ApplicationError, ApplyOptions,
    ApplyReport, ConfigError, PatchConfig, PatchResult,
};
pub use edit::{ContentVerification, Rewrite, RewriteError, RewriteResult};
pub use plan::{Plan, Transform};
pub use safety::{SafetyError, WorkspaceGuard};
pub use text::{TextEditor, TextError, TextOperation};
