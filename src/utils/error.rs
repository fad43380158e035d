use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Malformed escape sequence at byte {offset}")]
    MalformedEscape { offset: usize },

    #[error("Invalid passenger name in segment {segment_index}: {reason}")]
    InvalidPassengerName {
        segment_index: usize,
        reason: String,
    },

    #[error("Unrepresentable value for {field}: {value} ({reason})")]
    UnrepresentableValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for {field}: {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;
