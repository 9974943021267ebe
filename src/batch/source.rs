use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{BatchError, BatchResult};

/// Prefix prepended to every original file name in the archive.
pub const DEFAULT_NAME_PREFIX: &str = "processed_";

/// One input of a batch: the user-visible file name plus its encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceImage {
    /// Original file name (no directories), used to derive the output name.
    pub name: String,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

impl SourceImage {
    /// Wrap in-memory bytes.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file; the name is the path's final component.
    pub fn from_path(path: &Path) -> BatchResult<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                BatchError::validation(format!("'{}' has no usable file name", path.display()))
            })?
            .to_owned();
        let bytes =
            std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
        Ok(Self { name, bytes })
    }

    /// Archive entry name: `prefix` followed by the original name, unchanged.
    pub fn output_name(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.name)
    }
}
