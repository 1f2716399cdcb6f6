// Commands module - feature operations used by the application host

pub mod attachments;
pub mod common;
pub mod editor;
pub mod note;
pub mod session;
pub mod settings;
pub mod tags;
