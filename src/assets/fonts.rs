use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use usvg::fontdb;

use crate::foundation::{
    color::Rgba8,
    error::{BatchError, BatchResult},
};

/// Where the font book looks for faces.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FontSources {
    /// Load the platform's installed fonts.
    pub system_fonts: bool,
    /// Extra directories scanned recursively for font files.
    pub font_dirs: Vec<PathBuf>,
}

impl Default for FontSources {
    fn default() -> Self {
        Self {
            system_fonts: true,
            font_dirs: Vec::new(),
        }
    }
}

/// A face resolved for one `(family, weight, style)` request.
#[derive(Clone, Debug)]
pub struct ResolvedFont {
    /// Database identifier, stable for the lifetime of the [`FontBook`].
    pub id: fontdb::ID,
    /// Primary family name of the face that was picked.
    pub family: String,
    /// Raw font file bytes.
    pub data: Arc<Vec<u8>>,
    /// Face index inside `data` (non-zero for collections).
    pub index: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FaceRequest {
    family: String,
    weight: u16,
    italic: bool,
    strict: bool,
}

const SANS_SERIF_FAMILIES: &[&str] = &[
    "Arial",
    "Helvetica",
    "Liberation Sans",
    "DejaVu Sans",
    "Noto Sans",
    "Roboto",
];
const SERIF_FAMILIES: &[&str] = &[
    "Times New Roman",
    "Liberation Serif",
    "DejaVu Serif",
    "Noto Serif",
];
const MONOSPACE_FAMILIES: &[&str] = &[
    "Courier New",
    "Liberation Mono",
    "DejaVu Sans Mono",
    "Noto Sans Mono",
];

/// Faces tried after the requested family for glyphs it does not cover, mostly CJK.
const FALLBACK_FAMILIES: &[&str] = &[
    "Microsoft YaHei",
    "PingFang SC",
    "Noto Sans CJK SC",
    "Source Han Sans SC",
    "Noto Sans SC",
    "WenQuanYi Micro Hei",
    "SimHei",
    "SimSun",
];

/// Font discovery for template text, backed by a `fontdb` database.
///
/// Family names match case-insensitively, as in CSS. Generic families (`sans-serif`, `serif`,
/// `monospace`) are pointed at installed faces when the database is built. Resolution never
/// fails while at least one face is loaded: unknown families fall back to the generic
/// sans-serif family and then to the first face in the database.
pub struct FontBook {
    db: fontdb::Database,
    families: HashMap<String, String>,
    resolved: HashMap<FaceRequest, Option<ResolvedFont>>,
}

impl FontBook {
    /// Build a font book from the configured sources.
    pub fn new(sources: &FontSources) -> Self {
        let mut db = fontdb::Database::new();
        if sources.system_fonts {
            db.load_system_fonts();
        }
        for dir in &sources.font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }

        let mut book = Self {
            db,
            families: HashMap::new(),
            resolved: HashMap::new(),
        };
        book.reindex();
        tracing::debug!(
            faces = book.db.len(),
            families = book.families.len(),
            "font book ready"
        );
        book
    }

    /// Register a font file held in memory.
    pub fn add_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
        self.reindex();
    }

    fn reindex(&mut self) {
        let names: BTreeSet<String> = self
            .db
            .faces()
            .flat_map(|f| f.families.iter().map(|(name, _)| name.clone()))
            .collect();

        if let Some(name) = pick_generic(&names, SANS_SERIF_FAMILIES, |n| {
            n.contains("sans") && !n.contains("mono")
        }) {
            self.db.set_sans_serif_family(name);
        }
        if let Some(name) = pick_generic(&names, SERIF_FAMILIES, |n| {
            n.contains("serif") && !n.contains("sans")
        }) {
            self.db.set_serif_family(name);
        }
        if let Some(name) = pick_generic(&names, MONOSPACE_FAMILIES, |n| n.contains("mono")) {
            self.db.set_monospace_family(name);
        }

        self.families = names
            .into_iter()
            .map(|name| (name.to_lowercase(), name))
            .collect();
        self.resolved.clear();
    }

    /// Number of faces available.
    pub fn face_count(&self) -> usize {
        self.db.len()
    }

    /// Resolve a canvas `fontFamily` value (a CSS-like family list) to a concrete face.
    pub fn resolve(&mut self, family: &str, weight: u16, italic: bool) -> Option<ResolvedFont> {
        let key = FaceRequest {
            family: family.trim().to_lowercase(),
            weight,
            italic,
            strict: false,
        };
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }

        let found = self.query(family, weight, italic, false);
        if found.is_none() {
            tracing::warn!(family, "no font face available");
        }
        self.resolved.insert(key, found.clone());
        found
    }

    /// Resolve `family` followed by the faces used for glyphs it lacks.
    ///
    /// The first entry is what [`FontBook::resolve`] returns; the rest are the generic
    /// sans-serif face and any installed CJK families, without duplicates. Empty when no face
    /// is loaded at all.
    pub fn resolve_chain(&mut self, family: &str, weight: u16, italic: bool) -> Vec<ResolvedFont> {
        let Some(primary) = self.resolve(family, weight, italic) else {
            return Vec::new();
        };

        let mut chain = vec![primary];
        let fallbacks = std::iter::once("sans-serif").chain(FALLBACK_FAMILIES.iter().copied());
        for name in fallbacks {
            if let Some(font) = self.resolve_installed(name, weight, italic)
                && !chain.iter().any(|f| f.id == font.id)
            {
                chain.push(font);
            }
        }
        chain
    }

    fn resolve_installed(
        &mut self,
        family: &str,
        weight: u16,
        italic: bool,
    ) -> Option<ResolvedFont> {
        let key = FaceRequest {
            family: family.to_lowercase(),
            weight,
            italic,
            strict: true,
        };
        if let Some(hit) = self.resolved.get(&key) {
            return hit.clone();
        }
        let found = self.query(family, weight, italic, true);
        self.resolved.insert(key, found.clone());
        found
    }

    fn query(
        &self,
        family: &str,
        weight: u16,
        italic: bool,
        strict: bool,
    ) -> Option<ResolvedFont> {
        let mut families: Vec<fontdb::Family<'_>> = family
            .split(',')
            .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase())
            .filter(|f| !f.is_empty())
            .filter_map(|name| match name.as_str() {
                "serif" => Some(fontdb::Family::Serif),
                "sans-serif" => Some(fontdb::Family::SansSerif),
                "monospace" => Some(fontdb::Family::Monospace),
                "cursive" => Some(fontdb::Family::Cursive),
                "fantasy" => Some(fontdb::Family::Fantasy),
                _ => self
                    .families
                    .get(&name)
                    .map(|installed| fontdb::Family::Name(installed.as_str())),
            })
            .collect();
        if !strict {
            families.push(fontdb::Family::SansSerif);
        }

        let query = fontdb::Query {
            families: &families,
            weight: fontdb::Weight(weight),
            stretch: fontdb::Stretch::Normal,
            style: if italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };

        let id = match self.db.query(&query) {
            Some(id) => id,
            None if strict => return None,
            None => self.db.faces().next().map(|f| f.id)?,
        };
        let face = self.db.face(id)?;
        let family = face
            .families
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| face.post_script_name.clone());
        let (data, index) = self
            .db
            .with_face_data(id, |data, index| (data.to_vec(), index))?;

        Some(ResolvedFont {
            id,
            family,
            data: Arc::new(data),
            index,
        })
    }
}

fn pick_generic(
    names: &BTreeSet<String>,
    preferred: &[&str],
    accept: impl Fn(&str) -> bool,
) -> Option<String> {
    preferred
        .iter()
        .find(|p| names.contains(**p))
        .map(|p| (*p).to_owned())
        .or_else(|| {
            names
                .iter()
                .find(|n| accept(&n.to_lowercase()))
                .cloned()
        })
}

fn load_fonts_from_dir(db: &mut fontdb::Database, dir: &Path) {
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "font directory does not exist");
        return;
    }
    db.load_fonts_dir(dir);
}

/// Horizontal alignment of text lines inside the object's box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
    /// Canvas "justify"; laid out flush left.
    Justify,
}

/// Stateful helper for building Parley text layouts from resolved faces.
///
/// Each face is registered with Parley once and then referenced by family name.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<Rgba8>,
    registered: HashMap<fontdb::ID, String>,
    blobs: HashMap<u64, fontdb::ID>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    /// Construct a new layout engine with fresh Parley contexts.
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            registered: HashMap::new(),
            blobs: HashMap::new(),
        }
    }

    fn family_for(&mut self, font: &ResolvedFont) -> BatchResult<String> {
        if let Some(name) = self.registered.get(&font.id) {
            return Ok(name.clone());
        }

        let blob = parley::fontique::Blob::from(font.data.as_ref().clone());
        let blob_id = blob.id();
        let families = self.font_ctx.collection.register_fonts(blob, None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            BatchError::validation(format!("font '{}' registered no families", font.family))
        })?;
        let name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| BatchError::validation("registered font family has no name"))?
            .to_string();

        self.registered.insert(font.id, name.clone());
        self.blobs.insert(blob_id, font.id);
        Ok(name)
    }

    /// The face a laid-out glyph run was shaped with, keyed by the run font's blob id.
    pub fn face_of_blob(&self, blob_id: u64) -> Option<fontdb::ID> {
        self.blobs.get(&blob_id).copied()
    }

    /// Shape and lay out plain text.
    ///
    /// `fonts` is a fallback chain: each cluster uses the first face that covers it. Hard line
    /// breaks (`\n`) are honoured; `max_width_px` additionally wraps long lines.
    pub fn layout_plain(
        &mut self,
        text: &str,
        fonts: &[ResolvedFont],
        size_px: f32,
        brush: Rgba8,
        max_width_px: Option<f32>,
    ) -> BatchResult<parley::Layout<Rgba8>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(BatchError::validation(
                "text fontSize must be finite and > 0",
            ));
        }
        if fonts.is_empty() {
            return Err(BatchError::validation("text layout needs at least one font"));
        }

        let mut stack = Vec::with_capacity(fonts.len());
        for font in fonts {
            let name = self.family_for(font)?.replace('"', "");
            if !stack.contains(&name) {
                stack.push(name);
            }
        }
        let stack = stack
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(", ");

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(stack)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<Rgba8> = builder.build(text);
        layout.break_all_lines(max_width_px);
        layout.align(
            max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        Ok(layout)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/fonts.rs"]
mod tests;
