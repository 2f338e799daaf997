//! RGB <-> HSL conversion.

/// Convert RGB channels (0..1) to hue in degrees, saturation and lightness.
pub fn rgb_to_hsl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l);
    }

    let d = max - min;
    let s = if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0 * 360.0, s, l)
}

/// Convert hue in degrees, saturation and lightness to RGB channels (0..1).
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let h = h.rem_euclid(360.0) / 360.0;
    let m2 = if l <= 0.5 { l * (s + 1.0) } else { l + s - l * s };
    let m1 = l * 2.0 - m2;

    let hue = |mut h: f64| {
        if h < 0.0 {
            h += 1.0;
        } else if h > 1.0 {
            h -= 1.0;
        }
        if h * 6.0 < 1.0 {
            m1 + (m2 - m1) * h * 6.0
        } else if h * 2.0 < 1.0 {
            m2
        } else if h * 3.0 < 2.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - h) * 6.0
        } else {
            m1
        }
    };

    (hue(h + 1.0 / 3.0), hue(h), hue(h - 1.0 / 3.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert_close;

    #[test]
    fn primaries() {
        let (h, s, l) = rgb_to_hsl(0.0, 1.0, 0.0);
        assert_close(h, 120.0);
        assert_close(s, 1.0);
        assert_close(l, 0.5);

        let (r, g, b) = hsl_to_rgb(240.0, 1.0, 0.5);
        assert_close(r, 0.0);
        assert_close(g, 0.0);
        assert_close(b, 1.0);
    }

    #[test]
    fn grey_has_no_hue() {
        assert_eq!(rgb_to_hsl(0.5, 0.5, 0.5), (0.0, 0.0, 0.5));
        assert_eq!(hsl_to_rgb(123.0, 0.0, 0.25), (0.25, 0.25, 0.25));
    }

    #[test]
    fn round_trip() {
        for (r, g, b) in [(1.0, 0.4, 0.2), (0.1, 0.7, 0.3), (0.6, 0.4, 0.26666)] {
            let (h, s, l) = rgb_to_hsl(r, g, b);
            let (r2, g2, b2) = hsl_to_rgb(h, s, l);
            assert_close(r, r2);
            assert_close(g, g2);
            assert_close(b, b2);
        }
    }
}
