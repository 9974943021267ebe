use serde::{Deserialize, Serialize};

use crate::foundation::error::{BatchError, BatchResult};

/// Straight-alpha RGBA8 colour as written by the editing canvas (`fill`, `stroke`, ...).
///
/// Also used as the text brush for Parley layouts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black, the canvas default fill.
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    /// Construct from channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Return `true` when nothing would be painted with this colour.
    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    /// Same colour with its alpha scaled by `opacity` (`0.0..=1.0`).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (f32::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Parse a canvas colour string.
    ///
    /// Accepted forms: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`,
    /// `rgba(r,g,b,a)` with `a` in `0..=1`, `hsl(h,s%,l%)`, `hsla(h,s%,l%,a)`, a small set of
    /// CSS names, and `transparent`.
    pub fn parse(s: &str) -> BatchResult<Self> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex);
        }

        let lower = s.to_ascii_lowercase();
        if let Some(args) = func_args(&lower, "rgba").or_else(|| func_args(&lower, "rgb")) {
            return parse_rgb_args(&args, s);
        }
        if let Some(args) = func_args(&lower, "hsla").or_else(|| func_args(&lower, "hsl")) {
            return parse_hsl_args(&args, s);
        }

        named(&lower).ok_or_else(|| BatchError::validation(format!("unsupported colour \"{s}\"")))
    }

    /// Serialize as `#rrggbbaa`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Rgba8::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Deserialize an optional paint: `null` and `""` both mean "no paint", as the canvas writes
/// them for unset `stroke` and `backgroundColor`.
pub(crate) fn deserialize_opt_paint<'de, D>(deserializer: D) -> Result<Option<Rgba8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    match raw {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => {
            Rgba8::parse(&s).map(Some).map_err(serde::de::Error::custom)
        }
        Some(other) => Err(serde::de::Error::custom(format!(
            "unsupported paint {other}; only solid colour strings are supported"
        ))),
    }
}

fn parse_hex(hex: &str) -> BatchResult<Rgba8> {
    fn nibble(c: u8) -> Option<u8> {
        (c as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = hex.as_bytes();
    let digits: Option<Vec<u8>> = bytes.iter().map(|&c| nibble(c)).collect();
    let Some(d) = digits else {
        return Err(BatchError::validation(format!("invalid hex colour \"#{hex}\"")));
    };

    let (r, g, b, a) = match d.len() {
        3 => (d[0] * 17, d[1] * 17, d[2] * 17, 255),
        4 => (d[0] * 17, d[1] * 17, d[2] * 17, d[3] * 17),
        6 => (d[0] << 4 | d[1], d[2] << 4 | d[3], d[4] << 4 | d[5], 255),
        8 => (
            d[0] << 4 | d[1],
            d[2] << 4 | d[3],
            d[4] << 4 | d[5],
            d[6] << 4 | d[7],
        ),
        _ => {
            return Err(BatchError::validation(format!(
                "hex colour must have 3, 4, 6 or 8 digits, got \"#{hex}\""
            )));
        }
    };
    Ok(Rgba8::rgba(r, g, b, a))
}

fn func_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?;
    let inner = inner.trim_end().strip_suffix(')')?;
    Some(inner.split(',').map(|p| p.trim().to_owned()).collect())
}

fn parse_channel(v: &str, original: &str) -> BatchResult<u8> {
    let bad = || BatchError::validation(format!("invalid colour channel in \"{original}\""));
    let n = match v.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().map_err(|_| bad())? * 2.55,
        None => v.parse::<f64>().map_err(|_| bad())?,
    };
    Ok(n.clamp(0.0, 255.0).round() as u8)
}

fn parse_alpha(v: &str, original: &str) -> BatchResult<u8> {
    let a = v
        .parse::<f64>()
        .map_err(|_| BatchError::validation(format!("invalid alpha in \"{original}\"")))?;
    Ok((a.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_rgb_args(args: &[String], original: &str) -> BatchResult<Rgba8> {
    match args {
        [r, g, b] => Ok(Rgba8::rgba(
            parse_channel(r, original)?,
            parse_channel(g, original)?,
            parse_channel(b, original)?,
            255,
        )),
        [r, g, b, a] => Ok(Rgba8::rgba(
            parse_channel(r, original)?,
            parse_channel(g, original)?,
            parse_channel(b, original)?,
            parse_alpha(a, original)?,
        )),
        _ => Err(BatchError::validation(format!(
            "rgb()/rgba() takes 3 or 4 arguments: \"{original}\""
        ))),
    }
}

fn parse_hsl_args(args: &[String], original: &str) -> BatchResult<Rgba8> {
    let bad = || BatchError::validation(format!("invalid hsl colour \"{original}\""));
    let pct = |v: &str| -> BatchResult<f64> {
        let v = v.strip_suffix('%').ok_or_else(bad)?;
        Ok(v.parse::<f64>().map_err(|_| bad())? / 100.0)
    };

    let (h, s, l, a) = match args {
        [h, s, l] => (h, s, l, None),
        [h, s, l, a] => (h, s, l, Some(a)),
        _ => return Err(bad()),
    };
    let h = h.parse::<f64>().map_err(|_| bad())?;
    let (r, g, b) = hsl_to_rgb(h, pct(s)?, pct(l)?);
    let a = match a {
        Some(a) => parse_alpha(a, original)?,
        None => 255,
    };
    let to_u8 = |x: f64| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
    Ok(Rgba8::rgba(to_u8(r), to_u8(g), to_u8(b), a))
}

fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return (l, l, l);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    (
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    )
}

fn named(name: &str) -> Option<Rgba8> {
    let c = match name {
        "transparent" => Rgba8::TRANSPARENT,
        "black" => Rgba8::rgba(0, 0, 0, 255),
        "white" => Rgba8::rgba(255, 255, 255, 255),
        "red" => Rgba8::rgba(255, 0, 0, 255),
        "green" => Rgba8::rgba(0, 128, 0, 255),
        "lime" => Rgba8::rgba(0, 255, 0, 255),
        "blue" => Rgba8::rgba(0, 0, 255, 255),
        "yellow" => Rgba8::rgba(255, 255, 0, 255),
        "orange" => Rgba8::rgba(255, 165, 0, 255),
        "purple" => Rgba8::rgba(128, 0, 128, 255),
        "gray" | "grey" => Rgba8::rgba(128, 128, 128, 255),
        "silver" => Rgba8::rgba(192, 192, 192, 255),
        "pink" => Rgba8::rgba(255, 192, 203, 255),
        "cyan" | "aqua" => Rgba8::rgba(0, 255, 255, 255),
        "magenta" | "fuchsia" => Rgba8::rgba(255, 0, 255, 255),
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/color.rs"]
mod tests;
