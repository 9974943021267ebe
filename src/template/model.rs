use std::path::Path;

use anyhow::Context;
use kurbo::{Affine, Point};
use serde::{Deserialize, Serialize};

use crate::{
    assets::fonts::TextAlign,
    foundation::color::{Rgba8, deserialize_opt_paint},
    foundation::error::{BatchError, BatchResult},
};

/// Type tag of a canvas object, as written in its `type` field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Single-box editable text.
    #[serde(rename = "i-text")]
    IText,
    /// Editable text that wraps at its box width.
    #[serde(rename = "textbox")]
    Textbox,
    /// Static (non-editable) text.
    #[serde(rename = "text")]
    Text,
    /// Filled/stroked rectangle.
    #[serde(rename = "rect")]
    Rect,
}

impl ObjectKind {
    /// Parse a canvas `type` tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "i-text" => Some(Self::IText),
            "textbox" => Some(Self::Textbox),
            "text" => Some(Self::Text),
            "rect" => Some(Self::Rect),
            _ => None,
        }
    }

    /// Text the user can edit on the reference canvas; these make up a captured template.
    pub fn is_editable_text(self) -> bool {
        matches!(self, Self::IText | Self::Textbox)
    }

    /// Any kind that renders glyphs.
    pub fn is_text(self) -> bool {
        matches!(self, Self::IText | Self::Textbox | Self::Text)
    }
}

/// Horizontal anchor of `left`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    /// `left` is the box's left edge.
    #[default]
    Left,
    /// `left` is the box's horizontal center.
    Center,
    /// `left` is the box's right edge.
    Right,
}

impl OriginX {
    fn factor(self) -> f64 {
        match self {
            Self::Left => 0.0,
            Self::Center => 0.5,
            Self::Right => 1.0,
        }
    }
}

/// Vertical anchor of `top`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    /// `top` is the box's top edge.
    #[default]
    Top,
    /// `top` is the box's vertical center.
    Center,
    /// `top` is the box's bottom edge.
    Bottom,
}

impl OriginY {
    fn factor(self) -> f64 {
        match self {
            Self::Top => 0.0,
            Self::Center => 0.5,
            Self::Bottom => 1.0,
        }
    }
}

/// Font slant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    /// Upright.
    #[default]
    Normal,
    /// Italic.
    Italic,
    /// Oblique; resolved like italic.
    Oblique,
}

/// Numeric font weight (`100..=900`).
///
/// Deserializes from the canvas forms: `"normal"`, `"bold"`, `"lighter"`, `"bolder"`,
/// numbers and numeric strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    /// Regular weight (400).
    pub const NORMAL: Self = Self(400);
    /// Bold weight (700).
    pub const BOLD: Self = Self(700);
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl Serialize for FontWeight {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u16(self.0)
    }
}

impl<'de> Deserialize<'de> for FontWeight {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Num(f64),
            Name(String),
        }

        let weight = match Repr::deserialize(deserializer)? {
            Repr::Num(n) => n,
            Repr::Name(s) => match s.trim().to_ascii_lowercase().as_str() {
                "normal" | "" => 400.0,
                "bold" | "bolder" => 700.0,
                "lighter" => 300.0,
                other => other.parse::<f64>().map_err(|_| {
                    serde::de::Error::custom(format!("invalid fontWeight \"{s}\""))
                })?,
            },
        };
        if !weight.is_finite() {
            return Err(serde::de::Error::custom("fontWeight must be finite"));
        }
        Ok(Self(weight.clamp(1.0, 1000.0).round() as u16))
    }
}

fn one() -> f64 {
    1.0
}

fn yes() -> bool {
    true
}

fn default_fill() -> Option<Rgba8> {
    Some(Rgba8::BLACK)
}

fn default_font_family() -> String {
    "Times New Roman".to_owned()
}

fn default_font_size() -> f64 {
    40.0
}

/// One annotation captured from the reference canvas.
///
/// Field names and defaults follow the canvas library's object JSON, so objects serialized by
/// the editor deserialize directly; unknown fields are ignored. Position and size are in the
/// reference canvas's pixel space and are replayed unscaled on every batch image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateObject {
    /// Object type tag.
    #[serde(rename = "type")]
    pub kind: ObjectKind,
    /// X of the origin point.
    #[serde(default)]
    pub left: f64,
    /// Y of the origin point.
    #[serde(default)]
    pub top: f64,
    /// Unscaled box width; `0` lets text size itself from its layout.
    #[serde(default)]
    pub width: f64,
    /// Unscaled box height; `0` lets text size itself from its layout.
    #[serde(default)]
    pub height: f64,
    /// Horizontal scale.
    #[serde(default = "one")]
    pub scale_x: f64,
    /// Vertical scale.
    #[serde(default = "one")]
    pub scale_y: f64,
    /// Clockwise rotation in degrees around the origin point.
    #[serde(default)]
    pub angle: f64,
    /// Mirror horizontally around the box center.
    #[serde(default)]
    pub flip_x: bool,
    /// Mirror vertically around the box center.
    #[serde(default)]
    pub flip_y: bool,
    /// Whole-object opacity.
    #[serde(default = "one")]
    pub opacity: f64,
    /// Hidden objects are skipped.
    #[serde(default = "yes")]
    pub visible: bool,
    /// Horizontal origin anchor.
    #[serde(default)]
    pub origin_x: OriginX,
    /// Vertical origin anchor.
    #[serde(default)]
    pub origin_y: OriginY,
    /// Fill colour (glyphs for text, interior for rectangles).
    #[serde(default = "default_fill", deserialize_with = "deserialize_opt_paint")]
    pub fill: Option<Rgba8>,
    /// Outline colour (rectangles only).
    #[serde(default, deserialize_with = "deserialize_opt_paint")]
    pub stroke: Option<Rgba8>,
    /// Outline width in object units.
    #[serde(default = "one")]
    pub stroke_width: f64,
    /// Box background painted behind the object.
    #[serde(default, deserialize_with = "deserialize_opt_paint")]
    pub background_color: Option<Rgba8>,
    /// Text content.
    #[serde(default)]
    pub text: String,
    /// CSS-like family list.
    #[serde(default = "default_font_family")]
    pub font_family: String,
    /// Font size in pixels.
    #[serde(default = "default_font_size")]
    pub font_size: f64,
    /// Font weight.
    #[serde(default)]
    pub font_weight: FontWeight,
    /// Font slant.
    #[serde(default)]
    pub font_style: FontStyle,
    /// Line alignment inside the box.
    #[serde(default)]
    pub text_align: TextAlign,
}

impl TemplateObject {
    /// A left/top anchored editable text object with canvas defaults.
    pub fn text(text: impl Into<String>, left: f64, top: f64) -> Self {
        Self {
            kind: ObjectKind::IText,
            left,
            top,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            flip_x: false,
            flip_y: false,
            opacity: 1.0,
            visible: true,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
            fill: default_fill(),
            stroke: None,
            stroke_width: 1.0,
            background_color: None,
            text: text.into(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: FontWeight::NORMAL,
            font_style: FontStyle::Normal,
            text_align: TextAlign::Left,
        }
    }

    /// A left/top anchored filled rectangle.
    pub fn rect(left: f64, top: f64, width: f64, height: f64, fill: Rgba8) -> Self {
        Self {
            kind: ObjectKind::Rect,
            width,
            height,
            fill: Some(fill),
            ..Self::text("", left, top)
        }
    }

    /// Check numeric fields before drawing.
    pub fn validate(&self) -> BatchResult<()> {
        let numbers = [
            ("left", self.left),
            ("top", self.top),
            ("width", self.width),
            ("height", self.height),
            ("scaleX", self.scale_x),
            ("scaleY", self.scale_y),
            ("angle", self.angle),
            ("opacity", self.opacity),
            ("strokeWidth", self.stroke_width),
            ("fontSize", self.font_size),
        ];
        for (name, v) in numbers {
            if !v.is_finite() {
                return Err(BatchError::validation(format!(
                    "{:?} object field {name} must be finite",
                    self.kind
                )));
            }
        }
        if self.width < 0.0 || self.height < 0.0 {
            return Err(BatchError::validation(format!(
                "{:?} object width/height must be >= 0",
                self.kind
            )));
        }
        if self.kind.is_text() && self.font_size <= 0.0 {
            return Err(BatchError::validation("text fontSize must be > 0"));
        }
        Ok(())
    }

    /// Map object-local box coordinates (`(0,0)..(w,h)`) into scene coordinates.
    ///
    /// `(w, h)` is the box actually drawn, which for text may come from layout when the captured
    /// size is zero. Rotation and scale are applied around the origin point; flips mirror around
    /// the box center.
    pub fn placement(&self, w: f64, h: f64) -> Affine {
        let rotate = Affine::rotate(self.angle.to_radians());
        let scale = Affine::scale_non_uniform(self.scale_x, self.scale_y);
        let to_center = (rotate * scale)
            * Point::new(
                (0.5 - self.origin_x.factor()) * w,
                (0.5 - self.origin_y.factor()) * h,
            );
        let center = (self.left + to_center.x, self.top + to_center.y);
        let flip = Affine::scale_non_uniform(
            if self.flip_x { -1.0 } else { 1.0 },
            if self.flip_y { -1.0 } else { 1.0 },
        );

        Affine::translate(center) * rotate * scale * flip * Affine::translate((-w / 2.0, -h / 2.0))
    }
}

/// Ordered list of template objects; the first object is drawn first (bottom of the z-order).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    objects: Vec<TemplateObject>,
}

impl Template {
    /// Wrap an ordered object list.
    pub fn new(objects: Vec<TemplateObject>) -> Self {
        Self { objects }
    }

    /// Objects in z-order.
    pub fn objects(&self) -> &[TemplateObject] {
        &self.objects
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Return `true` when there is nothing to stamp.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Validate every object.
    pub fn validate(&self) -> BatchResult<()> {
        for (i, obj) in self.objects.iter().enumerate() {
            obj.validate()
                .map_err(|e| BatchError::validation(format!("template object {i}: {e}")))?;
        }
        Ok(())
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(json: &str) -> BatchResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON array of objects from disk.
    pub fn from_path(path: &Path) -> BatchResult<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read template '{}'", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Pretty JSON, loadable with [`Template::from_json_str`].
    pub fn to_json_pretty(&self) -> BatchResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/template/model.rs"]
mod tests;
