//! Color model for the tilecss stylesheet compiler.
//!
//! Colors are stored as hue/saturation/lightness plus alpha. A color is either
//! *standard* (HSL) or *perceptual* (HSLuv, formerly HuSL). Perceptual colors
//! keep lightness uniform when the hue changes, which the `p`-suffixed
//! stylesheet functions rely on.
//!
//! # Example
//!
//! ```
//! use tilecss_color::Color;
//!
//! let orange = Color::parse("#ff6600").unwrap();
//! assert_eq!(orange.to_string(), "#ff6600");
//!
//! let lighter = orange.lighten(0.1);
//! assert!(lighter.l > orange.l);
//! ```

mod adjust;
mod error;
mod hsl;
mod husl;
mod named;

use std::fmt;

pub use error::ColorError;
pub use hsl::{hsl_to_rgb, rgb_to_hsl};
pub use husl::{husl_to_rgb, rgb_to_husl};
pub use named::named_color_hex;

/// A color in HSL or HSLuv space.
///
/// `h` is in degrees (0..360), `s`, `l` and `a` are in 0..1.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    /// Hue in degrees.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Lightness.
    pub l: f64,
    /// Alpha (opacity).
    pub a: f64,
    /// Whether `h`, `s` and `l` are HSLuv components.
    pub perceptual: bool,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self {
        h: 0.0,
        s: 0.0,
        l: 0.0,
        a: 0.0,
        perceptual: false,
    };

    /// Create a standard color from RGB channels in 0..1.
    pub fn from_rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        let (h, s, l) = rgb_to_hsl(r, g, b);
        Self {
            h,
            s,
            l,
            a,
            perceptual: false,
        }
    }

    /// Create a standard color from HSL components.
    pub fn from_hsla(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self {
            h,
            s,
            l,
            a,
            perceptual: false,
        }
    }

    /// Create a perceptual color from HSLuv components (`s` and `l` in 0..1).
    pub fn from_husl(h: f64, s: f64, l: f64, a: f64) -> Self {
        Self {
            h,
            s,
            l,
            a,
            perceptual: true,
        }
    }

    /// Parse a `#rgb`/`#rrggbb` literal, a CSS color name, or `transparent`.
    pub fn parse(input: &str) -> Result<Self, ColorError> {
        if input.is_empty() {
            return Err(ColorError::Empty);
        }
        if input.starts_with('#') {
            return Self::parse_hex(input);
        }
        if input == "transparent" {
            return Ok(Self::TRANSPARENT);
        }
        match named_color_hex(input) {
            Some(hex) => Self::parse_hex(hex),
            None => Err(ColorError::UnknownName(input.to_string())),
        }
    }

    /// Look up a CSS color name (including `transparent`).
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "transparent" {
            return Some(Self::TRANSPARENT);
        }
        named_color_hex(name).and_then(|hex| Self::parse_hex(hex).ok())
    }

    /// Parse a hex color with three or six digits. The leading `#` is optional.
    pub fn parse_hex(input: &str) -> Result<Self, ColorError> {
        let hex = input.strip_prefix('#').unwrap_or(input);
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ColorError::InvalidHex(input.to_string()));
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => return Err(ColorError::InvalidHex(input.to_string())),
        };
        let channel = |i: usize| -> Result<f64, ColorError> {
            u8::from_str_radix(&expanded[i..i + 2], 16)
                .map(|v| f64::from(v) / 255.0)
                .map_err(|_| ColorError::InvalidHex(input.to_string()))
        };
        Ok(Self::from_rgba(channel(0)?, channel(2)?, channel(4)?, 1.0))
    }

    /// Convert to HSLuv. Perceptual colors are returned unchanged.
    pub fn to_perceptual(self) -> Self {
        if self.perceptual {
            return self;
        }
        // HSL and HSLuv only convert into each other through RGB.
        let (r, g, b) = hsl_to_rgb(self.h, self.s, self.l);
        let (h, s, l) = rgb_to_husl(r, g, b);
        Self {
            h,
            s: s / 100.0,
            l: l / 100.0,
            a: self.a,
            perceptual: true,
        }
    }

    /// Convert to HSL. Standard colors are returned unchanged.
    pub fn to_standard(self) -> Self {
        if !self.perceptual {
            return self;
        }
        let (r, g, b) = husl_to_rgb(self.h, self.s * 100.0, self.l * 100.0);
        Self::from_rgba(r, g, b, self.a)
    }

    /// RGB channels in 0..1, regardless of the color model.
    pub fn to_rgb(&self) -> (f64, f64, f64) {
        if self.perceptual {
            husl_to_rgb(self.h, self.s * 100.0, self.l * 100.0)
        } else {
            hsl_to_rgb(self.h, self.s, self.l)
        }
    }

    /// RGBA channels scaled to 0..255 and rounded.
    pub fn to_rgba8(&self) -> [u8; 4] {
        let (r, g, b) = self.to_rgb();
        [to_byte(r), to_byte(g), to_byte(b), to_byte(self.a)]
    }

    /// `#rrggbb`, or `#rrggbbaa` when the color is not opaque.
    pub fn hex_string(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if self.a == 1.0 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

fn to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, _] = self.to_rgba8();
        if self.a == 1.0 {
            write!(f, "#{r:02x}{g:02x}{b:02x}")
        } else {
            write!(f, "rgba({r}, {g}, {b}, {:.5})", self.a)
        }
    }
}

#[cfg(test)]
pub(crate) fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-6, "{a} != {b}");
}
