use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    foundation::error::{BatchError, BatchResult},
    template::model::{ObjectKind, Template, TemplateObject},
};

/// Snapshot of the reference editing canvas, in the canvas library's JSON form.
///
/// Objects are kept as raw JSON so that kinds this crate does not draw (images, groups, paths)
/// still round-trip; only editable text is ever parsed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorScene {
    /// Canvas library version that wrote the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Objects in z-order.
    #[serde(default)]
    pub objects: Vec<serde_json::Value>,
    /// Background image layer, never part of a template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<serde_json::Value>,
}

impl EditorScene {
    /// Parse a canvas JSON document.
    pub fn from_json_str(json: &str) -> BatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a canvas JSON document from disk.
    pub fn from_path(path: &Path) -> BatchResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read editor scene '{}'", path.display()))?;
        Self::from_json_str(&json)
    }
}

fn type_tag(obj: &serde_json::Value) -> Option<&str> {
    obj.get("type").and_then(serde_json::Value::as_str)
}

/// Capture the template from the live editing scene.
///
/// Returns the scene's editable text objects in scene order. Everything else (background
/// image, shapes, static text, unknown kinds) is left out. An empty result is returned as-is;
/// it is the compositor that refuses to run without a template.
#[tracing::instrument(skip(scene), fields(objects = scene.objects.len()))]
pub fn capture_template(scene: &EditorScene) -> BatchResult<Template> {
    let mut captured = Vec::new();
    for (index, obj) in scene.objects.iter().enumerate() {
        let Some(kind) = type_tag(obj).and_then(ObjectKind::from_tag) else {
            continue;
        };
        if !kind.is_editable_text() {
            continue;
        }

        let parsed: TemplateObject = serde_json::from_value(obj.clone()).map_err(|e| {
            BatchError::serde(format!("scene object {index} ({kind:?}): {e}"))
        })?;
        captured.push(parsed);
    }

    tracing::debug!(captured = captured.len(), "template captured");
    Ok(Template::new(captured))
}

#[cfg(test)]
#[path = "../../tests/unit/template/capture.rs"]
mod tests;
