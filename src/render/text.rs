use std::collections::HashMap;

use usvg::fontdb;

use crate::{
    assets::fonts::{FontBook, FontSources, ResolvedFont, TextAlign, TextLayoutEngine},
    foundation::color::Rgba8,
    foundation::error::BatchResult,
    render::scene::{affine_to_cpu, color_to_cpu},
    template::model::{FontStyle, ObjectKind, TemplateObject},
};

/// Lays out and draws text objects.
///
/// Owns the font book and the Parley contexts so both live for a whole batch run.
pub struct TextPainter {
    fonts: FontBook,
    layout: TextLayoutEngine,
    cpu_fonts: HashMap<fontdb::ID, vello_cpu::peniko::FontData>,
}

impl TextPainter {
    /// Build a painter over the configured font sources.
    pub fn new(sources: &FontSources) -> Self {
        Self::with_font_book(FontBook::new(sources))
    }

    /// Build a painter over an existing font book.
    pub fn with_font_book(fonts: FontBook) -> Self {
        Self {
            fonts,
            layout: TextLayoutEngine::new(),
            cpu_fonts: HashMap::new(),
        }
    }

    /// Mutable access to the font book, e.g. to register embedded fonts.
    pub fn fonts_mut(&mut self) -> &mut FontBook {
        &mut self.fonts
    }

    fn cpu_font(&mut self, font: &ResolvedFont) -> vello_cpu::peniko::FontData {
        self.cpu_fonts
            .entry(font.id)
            .or_insert_with(|| {
                vello_cpu::peniko::FontData::new(
                    vello_cpu::peniko::Blob::from(font.data.as_ref().clone()),
                    font.index,
                )
            })
            .clone()
    }

    /// Draw `obj` into `ctx`. Objects whose font cannot be resolved are skipped.
    pub(crate) fn draw(
        &mut self,
        ctx: &mut vello_cpu::RenderContext,
        obj: &TemplateObject,
    ) -> BatchResult<()> {
        let italic = obj.font_style != FontStyle::Normal;
        let chain = self
            .fonts
            .resolve_chain(&obj.font_family, obj.font_weight.0, italic);
        let Some(primary) = chain.first() else {
            tracing::warn!(
                family = %obj.font_family,
                text = %obj.text,
                "skipping text object: no usable font"
            );
            return Ok(());
        };

        let fill = obj.fill.unwrap_or(Rgba8::TRANSPARENT);
        let max_width = (obj.kind == ObjectKind::Textbox && obj.width > 0.0)
            .then_some(obj.width as f32);
        let layout =
            self.layout
                .layout_plain(&obj.text, &chain, obj.font_size as f32, fill, max_width)?;

        let box_w = if obj.width > 0.0 {
            obj.width
        } else {
            f64::from(layout.width())
        };
        let box_h = if obj.height > 0.0 {
            obj.height
        } else {
            f64::from(layout.height())
        };

        ctx.set_transform(affine_to_cpu(obj.placement(box_w, box_h)));

        if let Some(bg) = obj.background_color
            && !bg.is_transparent()
        {
            ctx.set_paint(color_to_cpu(bg));
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, box_w, box_h));
        }

        if fill.is_transparent() || obj.text.is_empty() {
            return Ok(());
        }

        for line in layout.lines() {
            let free = box_w as f32 - line.metrics().advance;
            let dx = match obj.text_align {
                TextAlign::Center => free / 2.0,
                TextAlign::Right => free,
                TextAlign::Left | TextAlign::Justify => 0.0,
            };

            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };

                let brush = run.style().brush;
                ctx.set_paint(color_to_cpu(brush));

                let face = self
                    .layout
                    .face_of_blob(run.run().font().data.id())
                    .and_then(|id| chain.iter().find(|f| f.id == id))
                    .unwrap_or(primary);
                let cpu_font = self.cpu_font(face);

                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x + dx,
                    y: g.y,
                });
                ctx.glyph_run(&cpu_font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        Ok(())
    }
}
