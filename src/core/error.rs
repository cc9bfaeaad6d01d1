//! Error types for the logger system and the CloudWatch hook

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// A single event is larger than the service accepts
    #[error("Log event too large: {size} bytes exceeds the {max} byte limit")]
    EventTooLarge { size: usize, max: usize },

    /// The log group or stream already exists
    #[error("Resource already exists: {resource}")]
    ResourceAlreadyExists { resource: String },

    /// The log group or stream does not exist
    #[error("Resource not found: {resource}")]
    ResourceNotFound { resource: String },

    /// The upload presented a stale or unexpected sequence token
    #[error("Invalid sequence token (expected {})", .expected.as_deref().unwrap_or("none"))]
    InvalidSequenceToken { expected: Option<String> },

    /// The request was rejected as malformed
    #[error("Invalid parameter for {operation}: {message}")]
    InvalidParameter { operation: String, message: String },

    /// Any other failure reported by the logs service
    #[error("CloudWatch Logs {operation} failed: {message}")]
    Service { operation: String, message: String },

    /// A batched upload failed; reported on the next write
    #[error("Previous batch upload failed: {0}")]
    BatchUploadFailed(#[source] Box<LoggerError>),

    /// Channel send error
    #[error("Failed to send log event to batch worker")]
    ChannelSendError,

    /// Hook already shut down
    #[error("Hook already stopped")]
    HookStopped,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create an event too large error
    pub fn event_too_large(size: usize, max: usize) -> Self {
        LoggerError::EventTooLarge { size, max }
    }

    pub fn already_exists(resource: impl Into<String>) -> Self {
        LoggerError::ResourceAlreadyExists {
            resource: resource.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        LoggerError::ResourceNotFound {
            resource: resource.into(),
        }
    }

    pub fn invalid_parameter(operation: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidParameter {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a service error for the named API operation
    pub fn service(operation: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Service {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether the error reports a create call for something that already exists
    pub fn is_already_exists(&self) -> bool {
        matches!(self, LoggerError::ResourceAlreadyExists { .. })
    }
}
