/// Convenience result type used across batchmark.
pub type BatchResult<T> = Result<T, BatchError>;

/// Top-level error taxonomy for capture, compositing and packaging.
///
/// Every variant that concerns a single source image carries the offending file name so a
/// batch failure can be surfaced to the user as one message.
#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    /// The captured template contains no objects; the batch is never started.
    #[error("no template defined: add at least one text object before running a batch")]
    EmptyTemplate,

    /// A source image's bytes could not be interpreted as an image.
    #[error("decode error in '{file}': {reason}")]
    Decode {
        /// Original file name of the source image.
        file: String,
        /// Underlying decoder message.
        reason: String,
    },

    /// The off-screen scene could not be rasterized or encoded.
    #[error("rasterize error in '{file}': {reason}")]
    Rasterize {
        /// Original file name of the source image.
        file: String,
        /// Underlying renderer or encoder message.
        reason: String,
    },

    /// The run was cancelled between two images.
    #[error("batch cancelled after {completed} of {total} images")]
    Cancelled {
        /// Images handled (composited or skipped) before cancellation was observed.
        completed: usize,
        /// Total images in the batch.
        total: usize,
    },

    /// The zip container could not be written or finalized.
    #[error("archive error: {0}")]
    Archive(String),

    /// Invalid user-provided data (template objects, options, colours).
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BatchError {
    /// Build a [`BatchError::Decode`] value.
    pub fn decode(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Decode {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`BatchError::Rasterize`] value.
    pub fn rasterize(file: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Rasterize {
            file: file.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a [`BatchError::Archive`] value.
    pub fn archive(msg: impl Into<String>) -> Self {
        Self::Archive(msg.into())
    }

    /// Build a [`BatchError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`BatchError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// File name of the source image this error is about, if any.
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::Decode { file, .. } | Self::Rasterize { file, .. } => Some(file),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for BatchError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<serde_json::Error> for BatchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
