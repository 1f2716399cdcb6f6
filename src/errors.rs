// Error taxonomy for Noetter
// Every filesystem failure is recoverable and surfaces as a rejected operation

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("NOT_FOUND: {0}")]
    NotFound(String),
    #[error("DIRECTORY_LIST_FAILURE: {0}")]
    DirectoryList(String),
    #[error("WRITE_FAILURE: {0}")]
    Write(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("ATTACHMENT_INVALID: {0}")]
    Attachment(String),
}

impl AppError {
    pub fn isNotFound(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        match value.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(value.to_string()),
            _ => Self::Io(value.to_string()),
        }
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(value: base64::DecodeError) -> Self {
        Self::Attachment(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
