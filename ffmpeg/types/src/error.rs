/*!
    Error type shared by the ffmpeg crates.
*/

use thiserror::Error;

/**
    Result alias using the shared [`Error`] type.
*/
pub type Result<T, E = Error> = std::result::Result<T, E>;

/**
    Errors raised while describing, configuring or writing media.
*/
#[derive(Debug, Error)]
pub enum Error {
    /// A stream index that was never registered.
    #[error("stream index {index} out of range ({count} streams)")]
    OutOfRange { index: usize, count: usize },

    /// An operation called in the wrong lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A format profile that failed validation.
    #[error("invalid configuration: {0}")]
    ConfigurationInvalid(String),

    /// The declared container format does not fit the destination filename.
    #[error("format '{format}' does not match filename '{filename}'")]
    FormatMismatch { format: String, filename: String },

    /// The destination could not be opened or its header could not be written.
    #[error("failed to open resource: {0}")]
    ResourceOpenFailed(String),

    /// A format option could not be applied. Reported, never fatal.
    #[error("can't set option {name} to {value}: {reason}")]
    OptionApplicationFailed {
        name: String,
        value: String,
        reason: String,
    },

    #[error("codec error: {0}")]
    Codec(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn out_of_range(index: usize, count: usize) -> Self {
        Self::OutOfRange { index, count }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::ConfigurationInvalid(msg.into())
    }

    pub fn format_mismatch(format: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::FormatMismatch {
            format: format.into(),
            filename: filename.into(),
        }
    }

    pub fn resource_open(msg: impl Into<String>) -> Self {
        Self::ResourceOpenFailed(msg.into())
    }

    pub fn codec(msg: impl Into<String>) -> Self {
        Self::Codec(msg.into())
    }

    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /**
        Returns true for errors caused by calling an operation at the wrong time,
        as opposed to failures of the underlying resource.
    */
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::OutOfRange { .. } | Self::InvalidState(_))
    }
}
