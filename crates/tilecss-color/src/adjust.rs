//! Color adjustment functions.
//!
//! Adjustments work in the color's own model: a perceptual color is lightened
//! in HSLuv space, a standard one in HSL space.

use crate::Color;

fn clamp(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

impl Color {
    /// Increase lightness by `amount` (0..1).
    pub fn lighten(mut self, amount: f64) -> Self {
        self.l = clamp(self.l + amount);
        self
    }

    /// Decrease lightness by `amount` (0..1).
    pub fn darken(mut self, amount: f64) -> Self {
        self.l = clamp(self.l - amount);
        self
    }

    /// Increase saturation by `amount` (0..1).
    pub fn saturate(mut self, amount: f64) -> Self {
        self.s = clamp(self.s + amount);
        self
    }

    /// Decrease saturation by `amount` (0..1).
    pub fn desaturate(mut self, amount: f64) -> Self {
        self.s = clamp(self.s - amount);
        self
    }

    /// Increase opacity by `amount` (0..1).
    pub fn fade_in(mut self, amount: f64) -> Self {
        self.a = clamp(self.a + amount);
        self
    }

    /// Decrease opacity by `amount` (0..1).
    pub fn fade_out(mut self, amount: f64) -> Self {
        self.a = clamp(self.a - amount);
        self
    }

    /// Rotate the hue by `degrees`, wrapping around the color wheel.
    pub fn spin(mut self, degrees: f64) -> Self {
        self.h = (self.h + degrees).rem_euclid(360.0);
        self
    }

    /// Scale hue, saturation and lightness by `factor`.
    pub fn multiply(mut self, factor: f64) -> Self {
        self.h = (self.h * factor).clamp(0.0, 360.0);
        self.s = clamp(self.s * factor);
        self.l = clamp(self.l * factor);
        self
    }

    /// Remove all saturation.
    pub fn greyscale(mut self) -> Self {
        self.s = 0.0;
        self
    }

    /// Blend with `other`; `weight` is the share of `self` (0..1).
    ///
    /// If either side is perceptual both are mixed in HSLuv space.
    pub fn mix(self, other: Color, weight: f64) -> Self {
        let perceptual = self.perceptual || other.perceptual;
        let (c1, c2) = if perceptual {
            (self.to_perceptual(), other.to_perceptual())
        } else {
            (self, other)
        };

        let w = weight * 2.0 - 1.0;
        let a = c1.a - c2.a;
        let w1 = if w * a == -1.0 {
            (w + 1.0) / 2.0
        } else {
            ((w + a) / (1.0 + w * a) + 1.0) / 2.0
        };
        let w2 = 1.0 - w1;

        Self {
            h: c1.h * w1 + c2.h * w2,
            s: c1.s * w1 + c2.s * w2,
            l: c1.l * w1 + c2.l * w2,
            a: c1.a * weight + c2.a * (1.0 - weight),
            perceptual,
        }
    }

    /// Replace the hue with the hue of `hue`, keeping perceptual saturation
    /// and lightness. The result is perceptual.
    pub fn set_hue(self, hue: Color) -> Self {
        let mut base = self.to_perceptual();
        base.h = hue.to_perceptual().h;
        base
    }
}
