use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::Context;
use zip::write::SimpleFileOptions;

use crate::batch::compositor::BatchReport;
use crate::foundation::error::{BatchError, BatchResult};

/// Name of the manifest listing images skipped under [`crate::FailurePolicy::SkipAndContinue`].
pub const FAILURES_MANIFEST: &str = "failures.json";

/// One encoded composite, ready to be packaged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeResult {
    /// Archive entry name (`processed_<original>`).
    pub name: String,
    /// Pixel width; always the source image's width.
    pub width: u32,
    /// Pixel height; always the source image's height.
    pub height: u32,
    /// Encoded image bytes.
    pub bytes: Vec<u8>,
}

/// Consumer of composites in input order.
///
/// `begin` is called once before the first push. `abort` is called when the run stops early;
/// a sink must not expose partial output afterwards.
pub trait CompositeSink {
    /// Called once with the number of source images in the batch.
    fn begin(&mut self, total: usize) -> BatchResult<()>;
    /// Accept the next composite.
    fn push(&mut self, result: CompositeResult) -> BatchResult<()>;
    /// Discard everything pushed so far.
    fn abort(&mut self);
}

/// Finalized archive bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveBlob {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl ArchiveBlob {
    /// Raw zip bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Entry names in the order they were written.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Consume the blob and return the zip bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Save the archive to `path`, creating parent directories as needed.
    pub fn write_to_path(&self, path: &Path) -> BatchResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory '{}'", parent.display()))?;
        }
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write archive '{}'", path.display()))?;
        Ok(())
    }
}

/// Packages composites into an in-memory zip archive.
///
/// Entries are deflated and carry a fixed timestamp, so the same inputs always produce the same
/// bytes. Repeated names get a numeric suffix before the extension (`a.png`, `a-2.png`, ...).
pub struct ZipPackager {
    writer: zip::ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
    used: HashSet<String>,
    aborted: bool,
}

impl Default for ZipPackager {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipPackager {
    /// Create an empty packager.
    pub fn new() -> Self {
        Self {
            writer: zip::ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
            used: HashSet::new(),
            aborted: false,
        }
    }

    /// Entry names written so far.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    fn options() -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default())
    }

    fn write_entry(&mut self, name: &str, bytes: &[u8]) -> BatchResult<String> {
        if self.aborted {
            return Err(BatchError::archive("archive was aborted"));
        }

        let name = unique_name(&self.used, name);
        self.writer.start_file(name.as_str(), Self::options())?;
        self.writer
            .write_all(bytes)
            .map_err(|e| BatchError::archive(format!("write entry '{name}': {e}")))?;

        self.used.insert(name.clone());
        self.entries.push(name.clone());
        Ok(name)
    }

    /// Finalize the archive.
    ///
    /// When `report` lists skipped images a `failures.json` manifest is added last.
    pub fn finish(mut self, report: &BatchReport) -> BatchResult<ArchiveBlob> {
        if self.aborted {
            return Err(BatchError::archive("archive was aborted"));
        }

        if !report.skipped.is_empty() {
            let manifest = serde_json::to_vec_pretty(&report.skipped)?;
            self.write_entry(FAILURES_MANIFEST, &manifest)?;
        }

        let bytes = self.writer.finish()?.into_inner();
        tracing::debug!(
            entries = self.entries.len(),
            bytes = bytes.len(),
            "archive finalized"
        );
        Ok(ArchiveBlob {
            bytes,
            entries: self.entries,
        })
    }
}

impl CompositeSink for ZipPackager {
    fn begin(&mut self, total: usize) -> BatchResult<()> {
        if !self.entries.is_empty() || self.aborted {
            *self = Self::new();
        }
        self.entries.reserve(total);
        Ok(())
    }

    fn push(&mut self, result: CompositeResult) -> BatchResult<()> {
        let name = self.write_entry(&result.name, &result.bytes)?;
        if name != result.name {
            tracing::debug!(requested = %result.name, %name, "renamed colliding archive entry");
        }
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
        self.entries.clear();
        self.used.clear();
        self.writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    }
}

fn unique_name(used: &HashSet<String>, name: &str) -> String {
    if !used.contains(name) {
        return name.to_owned();
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    (2..)
        .map(|n| format!("{stem}-{n}{ext}"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| name.to_owned())
}

/// Sink that keeps composites in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    total: Option<usize>,
    results: Vec<CompositeResult>,
    aborted: bool,
}

impl InMemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total announced by `begin`, if it was called.
    pub fn total(&self) -> Option<usize> {
        self.total
    }

    /// Composites in input order.
    pub fn results(&self) -> &[CompositeResult] {
        &self.results
    }

    /// Whether the last run was aborted.
    pub fn aborted(&self) -> bool {
        self.aborted
    }
}

impl CompositeSink for InMemorySink {
    fn begin(&mut self, total: usize) -> BatchResult<()> {
        self.total = Some(total);
        self.results.clear();
        self.aborted = false;
        Ok(())
    }

    fn push(&mut self, result: CompositeResult) -> BatchResult<()> {
        self.results.push(result);
        Ok(())
    }

    fn abort(&mut self) {
        self.results.clear();
        self.aborted = true;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/batch/archive.rs"]
mod tests;
