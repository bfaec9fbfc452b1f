use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Malformed model: {0}")]
    Malformed(String),
    #[error("Invalid action {action} in state {state}")]
    InvalidAction { state: String, action: String },
    #[error("Config parsing failed: {0}")]
    Config(#[from] serde_json::Error),
    #[error("Config file could not be read: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
