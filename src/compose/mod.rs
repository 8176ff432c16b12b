pub mod editor;
pub mod errors;
pub mod schema;

pub use editor::{ComposeEditor, ImageTagUpdate};
pub use errors::ComposeError;
pub use schema::{ComposeFile, ImageRef, Service};
