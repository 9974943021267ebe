use std::sync::Arc;

use crate::{
    assets::decode::DecodedImage,
    foundation::color::Rgba8,
    foundation::error::{BatchError, BatchResult},
    render::text::TextPainter,
    template::model::{ObjectKind, TemplateObject},
};

/// Flattened scene pixels in premultiplied RGBA8.
#[derive(Clone, Debug)]
pub struct RasterFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major premultiplied RGBA8.
    pub rgba8_premul: Vec<u8>,
}

/// Off-screen drawing surface for one composite: a background image plus overlay objects.
///
/// The scene is consumed by [`OffscreenScene::rasterize`]; dropping it releases the render
/// context and any queued geometry.
pub struct OffscreenScene {
    width: u16,
    height: u16,
    ctx: vello_cpu::RenderContext,
}

impl OffscreenScene {
    /// Create a transparent scene of exactly `width x height` pixels.
    pub fn new(width: u32, height: u32) -> BatchResult<Self> {
        let width: u16 = width
            .try_into()
            .map_err(|_| BatchError::validation(format!("scene width {width} exceeds 65535")))?;
        let height: u16 = height.try_into().map_err(|_| {
            BatchError::validation(format!("scene height {height} exceeds 65535"))
        })?;
        if width == 0 || height == 0 {
            return Err(BatchError::validation("scene must be at least 1x1"));
        }

        Ok(Self {
            width,
            height,
            ctx: vello_cpu::RenderContext::new(width, height),
        })
    }

    /// Scene size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    /// Paint `image` as the background layer, unscaled and covering the whole scene.
    pub fn set_background(&mut self, image: &DecodedImage) -> BatchResult<()> {
        if (image.width, image.height) != self.size() {
            return Err(BatchError::validation(format!(
                "background {}x{} does not match scene {}x{}",
                image.width, image.height, self.width, self.height
            )));
        }

        let pixmap = image_premul_bytes_to_pixmap(&image.rgba8_premul, image.width, image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(paint);
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(self.width),
            f64::from(self.height),
        ));
        Ok(())
    }

    /// Instantiate one template object on top of everything drawn so far.
    pub fn add_object(&mut self, obj: &TemplateObject, text: &mut TextPainter) -> BatchResult<()> {
        obj.validate()?;
        if !obj.visible || obj.opacity <= 0.0 {
            return Ok(());
        }

        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        let opacity = obj.opacity.min(1.0) as f32;

        // A rect with one paint needs no layer: scaling its alpha composites the same.
        if obj.kind == ObjectKind::Rect && rect_paints(obj).len() == 1 {
            self.draw_rect(obj, opacity);
            return Ok(());
        }

        let layered = opacity < 1.0;
        if layered {
            self.ctx.push_opacity_layer(opacity);
        }

        let drawn = match obj.kind {
            ObjectKind::Rect => {
                self.draw_rect(obj, 1.0);
                Ok(())
            }
            ObjectKind::IText | ObjectKind::Textbox | ObjectKind::Text => {
                text.draw(&mut self.ctx, obj)
            }
        };

        if layered {
            self.ctx.pop_layer();
        }
        drawn
    }

    fn draw_rect(&mut self, obj: &TemplateObject, opacity: f32) {
        let rect = vello_cpu::kurbo::Rect::new(0.0, 0.0, obj.width, obj.height);
        self.ctx
            .set_transform(affine_to_cpu(obj.placement(obj.width, obj.height)));

        for paint in [obj.background_color, obj.fill].into_iter().flatten() {
            if !paint.is_transparent() {
                self.ctx.set_paint(color_to_cpu(paint.with_opacity(opacity)));
                self.ctx.fill_rect(&rect);
            }
        }

        if let Some(stroke) = visible_stroke(obj) {
            self.ctx
                .set_stroke(vello_cpu::kurbo::Stroke::new(obj.stroke_width));
            self.ctx.set_paint(color_to_cpu(stroke.with_opacity(opacity)));
            self.ctx.stroke_rect(&rect);
        }
    }

    /// Flush queued drawing and read the pixels back.
    pub fn rasterize(mut self) -> BatchResult<RasterFrame> {
        self.ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(self.width, self.height);
        self.ctx.render_to_pixmap(&mut pixmap);

        let rgba8_premul = pixmap.data_as_u8_slice().to_vec();
        let (width, height) = self.size();
        if rgba8_premul.len() != width as usize * height as usize * 4 {
            return Err(BatchError::validation("rendered pixmap byte length mismatch"));
        }

        Ok(RasterFrame {
            width,
            height,
            rgba8_premul,
        })
    }
}

fn visible_stroke(obj: &TemplateObject) -> Option<Rgba8> {
    obj.stroke
        .filter(|s| !s.is_transparent() && obj.stroke_width > 0.0)
}

fn rect_paints(obj: &TemplateObject) -> Vec<Rgba8> {
    [obj.background_color, obj.fill]
        .into_iter()
        .flatten()
        .filter(|p| !p.is_transparent())
        .chain(visible_stroke(obj))
        .collect()
}

pub(crate) fn affine_to_cpu(a: kurbo::Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn image_premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> BatchResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BatchError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BatchError::validation("image height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(BatchError::validation("decoded image byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
