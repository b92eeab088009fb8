/// Result alias used throughout the crate.
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Errors surfaced by the recorder and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum RecorderError {
    /// Bad input (sizes, buffer lengths, option values rejected locally).
    #[error("validation error: {0}")]
    Validation(String),

    /// The platform could not construct an encoder for the requested configuration.
    #[error("encoder unavailable: {0}")]
    EncoderUnavailable(String),

    /// The encoder failed while running or finalizing.
    #[error("encode error: {0}")]
    Encode(String),

    /// Options or other JSON input could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, typically IO with context attached.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecorderError {
    /// Build a [`RecorderError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RecorderError::EncoderUnavailable`].
    pub fn encoder_unavailable(msg: impl Into<String>) -> Self {
        Self::EncoderUnavailable(msg.into())
    }

    /// Build a [`RecorderError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`RecorderError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this is the setup failure the recorder recovers from with a default encoder.
    pub fn is_encoder_unavailable(&self) -> bool {
        matches!(self, Self::EncoderUnavailable(_))
    }
}
