pub mod editor;
pub mod errors;
pub mod lines;
pub mod operations;

pub use editor::TextEditor;
pub use errors::TextError;
pub use operations::TextOperation;
