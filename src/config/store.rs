use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::Value;

use crate::foundation::error::{BatchError, BatchResult};

/// Key/value persistence for user settings.
///
/// One implementation is chosen when the program starts and handed to every consumer; nothing
/// downstream inspects the platform to pick a backend.
pub trait SettingsStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> BatchResult<Option<Value>>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: Value) -> BatchResult<()>;
    /// Remove `key`. Removing a missing key is not an error.
    fn delete(&mut self, key: &str) -> BatchResult<()>;
    /// Remove every key.
    fn clear(&mut self) -> BatchResult<()>;
}

/// Volatile store, for tests and one-off runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> BatchResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> BatchResult<()> {
        self.values.insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> BatchResult<()> {
        self.values.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> BatchResult<()> {
        self.values.clear();
        Ok(())
    }
}

/// Store backed by a single JSON object on disk.
///
/// The file is read once on open and rewritten after every mutation.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: serde_json::Map<String, Value>,
}

impl JsonFileStore {
    /// Open `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> BatchResult<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => serde_json::Map::new(),
            Ok(text) => match serde_json::from_str::<Value>(&text)? {
                Value::Object(map) => map,
                other => {
                    return Err(BatchError::serde(format!(
                        "settings file '{}' must hold a JSON object, found {}",
                        path.display(),
                        json_kind(&other)
                    )));
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => serde_json::Map::new(),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("read settings '{}'", path.display()))
                    .into());
            }
        };
        Ok(Self { path, values })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> BatchResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create directory '{}'", parent.display()))?;
        }

        let text = serde_json::to_string_pretty(&self.values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, text)
            .with_context(|| format!("write settings '{}'", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace settings '{}'", self.path.display()))?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> BatchResult<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> BatchResult<()> {
        self.values.insert(key.to_owned(), value);
        self.persist()
    }

    fn delete(&mut self, key: &str) -> BatchResult<()> {
        if self.values.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn clear(&mut self) -> BatchResult<()> {
        self.values.clear();
        self.persist()
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/store.rs"]
mod tests;
