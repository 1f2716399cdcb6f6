// Models module for Noetter filesystem-based storage
// All fields use camelCase for consistency with the front-end

pub mod common;
pub mod config;
pub mod note;
pub mod tag;

pub use common::ViewState;
pub use config::Settings;
pub use note::{CurrentNote, FileDescription, PartialFileDescription};
pub use tag::TagNode;
