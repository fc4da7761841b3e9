use thiserror::Error;

#[derive(Debug, Error)]
pub enum TuiError {
    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to install log subscriber: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, TuiError>;
