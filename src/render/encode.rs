use std::io::Cursor;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    assets::decode::unpremultiply_rgba8_in_place,
    foundation::error::{BatchError, BatchResult},
    render::scene::RasterFrame,
};

/// Encoding of composite results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG with alpha.
    #[default]
    Png,
    /// Baseline JPEG; alpha is dropped.
    Jpeg {
        /// Encoder quality, `1..=100`.
        quality: u8,
    },
}

impl OutputFormat {
    /// Default JPEG quality used by the CLI and environment overrides.
    pub const DEFAULT_JPEG_QUALITY: u8 = 85;

    /// Check encoder parameters.
    pub fn validate(self) -> BatchResult<()> {
        match self {
            Self::Png => Ok(()),
            Self::Jpeg { quality } if (1..=100).contains(&quality) => Ok(()),
            Self::Jpeg { quality } => Err(BatchError::validation(format!(
                "jpeg quality must be in 1..=100, got {quality}"
            ))),
        }
    }
}

/// Encode a rasterized scene.
pub fn encode_frame(frame: RasterFrame, format: OutputFormat) -> BatchResult<Vec<u8>> {
    format.validate()?;

    let RasterFrame {
        width,
        height,
        rgba8_premul: mut rgba,
    } = frame;
    unpremultiply_rgba8_in_place(&mut rgba);
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .context("raster frame byte length does not match its dimensions")?;

    let mut buf = Vec::new();
    match format {
        OutputFormat::Png => {
            image::DynamicImage::ImageRgba8(img)
                .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
                .context("encode png")?;
        }
        OutputFormat::Jpeg { quality } => {
            let rgb = image::DynamicImage::ImageRgba8(img).to_rgb8();
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality)
                .encode_image(&rgb)
                .context("encode jpeg")?;
        }
    }
    Ok(buf)
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
