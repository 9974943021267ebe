use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    assets::fonts::FontSources,
    batch::source::DEFAULT_NAME_PREFIX,
    config::store::SettingsStore,
    foundation::error::{BatchError, BatchResult},
    render::encode::OutputFormat,
};

/// Settings-store key holding persisted [`BatchOptions`].
pub const OPTIONS_KEY: &str = "batch_options";

/// What a run does when one source image cannot be decoded or rasterized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failure and produce no archive.
    #[default]
    Abort,
    /// Record the failure, keep going, and add a failure manifest to the archive.
    SkipAndContinue,
}

impl FromStr for FailurePolicy {
    type Err = BatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" | "skip_and_continue" => Ok(Self::SkipAndContinue),
            other => Err(BatchError::validation(format!(
                "unknown failure policy '{other}' (expected abort|skip)"
            ))),
        }
    }
}

/// Tunables for one batch run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    /// Encoding of every composite.
    pub output_format: OutputFormat,
    /// Behaviour on a per-image failure.
    pub failure_policy: FailurePolicy,
    /// Where text objects look up their fonts.
    pub fonts: FontSources,
    /// Prepended to each original file name.
    pub name_prefix: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            failure_policy: FailurePolicy::default(),
            fonts: FontSources::default(),
            name_prefix: DEFAULT_NAME_PREFIX.to_owned(),
        }
    }
}

impl BatchOptions {
    /// Reject options a run cannot honour.
    pub fn validate(&self) -> BatchResult<()> {
        self.output_format.validate()?;
        if self.name_prefix.contains(['/', '\\']) {
            return Err(BatchError::validation(format!(
                "name prefix '{}' must not contain path separators",
                self.name_prefix
            )));
        }
        Ok(())
    }

    /// Persisted options from `store`, or defaults when nothing is stored.
    pub fn load(store: &dyn SettingsStore) -> BatchResult<Self> {
        match store.get(OPTIONS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Self::default()),
        }
    }

    /// Persist these options into `store`.
    pub fn save(&self, store: &mut dyn SettingsStore) -> BatchResult<()> {
        store.set(OPTIONS_KEY, serde_json::to_value(self)?)
    }

    /// Apply `BATCHMARK_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> BatchResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides read through `lookup`, which maps a variable name to its value.
    ///
    /// Recognised variables: `BATCHMARK_FAILURE_POLICY` (`abort`|`skip`),
    /// `BATCHMARK_OUTPUT_FORMAT` (`png`|`jpeg`), `BATCHMARK_JPEG_QUALITY` (`1..=100`) and
    /// `BATCHMARK_FONT_DIRS` (a platform path list, appended to the configured directories).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> BatchResult<()> {
        if let Some(v) = lookup("BATCHMARK_FAILURE_POLICY") {
            self.failure_policy = v.parse()?;
        }

        let quality = lookup("BATCHMARK_JPEG_QUALITY")
            .map(|v| {
                v.trim().parse::<u8>().map_err(|_| {
                    BatchError::validation(format!("BATCHMARK_JPEG_QUALITY '{v}' is not 0..=255"))
                })
            })
            .transpose()?;

        if let Some(v) = lookup("BATCHMARK_OUTPUT_FORMAT") {
            self.output_format = match v.trim().to_ascii_lowercase().as_str() {
                "png" => OutputFormat::Png,
                "jpeg" | "jpg" => OutputFormat::Jpeg {
                    quality: OutputFormat::DEFAULT_JPEG_QUALITY,
                },
                other => {
                    return Err(BatchError::validation(format!(
                        "unknown output format '{other}' (expected png|jpeg)"
                    )));
                }
            };
        }
        if let (Some(q), OutputFormat::Jpeg { quality }) = (quality, &mut self.output_format) {
            *quality = q;
        }

        if let Some(v) = lookup("BATCHMARK_FONT_DIRS") {
            self.fonts
                .font_dirs
                .extend(std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()));
        }

        self.validate()
    }

    /// Append extra font directories.
    pub fn with_font_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.fonts.font_dirs.extend(dirs);
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/options.rs"]
mod tests;
