use crate::event::{EventLog, EventValue, Field};

/// Result alias that carries the custom [`AlgovizError`] type.
pub type Result<T> = std::result::Result<T, AlgovizError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum AlgovizError {
    /// Free-form message for failures that do not warrant a dedicated
    /// variant, such as a plugged algorithm reporting its own problem.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Configuration or log JSON could not be parsed.
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    /// An event named an attribute that does not exist on its target.
    #[error("unknown field `{field}` for index {index}")]
    UnknownField { field: String, index: i64 },
    /// An event carried a value of the wrong kind for its field.
    #[error("field `{field}` cannot hold {value:?}")]
    ValueMismatch { field: Field, value: EventValue },
    #[error("index {index} out of bounds for sequence of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("unknown algorithm `{0}`")]
    UnknownAlgorithm(String),
    /// The algorithm under capture failed. The events recorded up to the
    /// failure are preserved in `partial`.
    #[error("capture of `{}` failed after {} events: {}", .partial.name, .partial.len(), .source)]
    CaptureFailed {
        partial: Box<EventLog>,
        #[source]
        source: Box<AlgovizError>,
    },
}

impl AlgovizError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for AlgovizError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for AlgovizError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
