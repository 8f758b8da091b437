use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    // Transport errors
    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Request timed out: {operation}")]
    Timeout { operation: String },

    // Lookup errors
    #[error("Not found: {what}")]
    NotFound { what: String },

    // Input errors
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ClientError {
    pub fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ClientError::NotFound { what: what.into() }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode { source: err }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Transport {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
