//! RGB <-> HSLuv conversion through CIE XYZ, LUV and LCh.
//!
//! Saturation and lightness are in 0..100 here; [`Color`](crate::Color)
//! stores them scaled to 0..1.

use std::f64::consts::PI;

const M: [[f64; 3]; 3] = [
    [3.240969941904521, -1.537383177570093, -0.498610760293],
    [-0.96924363628087, 1.87596750150772, 0.041555057407175],
    [0.055630079696993, -0.20397695888897, 1.056971514242878],
];

const M_INV: [[f64; 3]; 3] = [
    [0.41239079926595, 0.35758433938387, 0.18048078840183],
    [0.21263900587151, 0.71516867876775, 0.072192315360733],
    [0.019330818715591, 0.11919477979462, 0.95053215224966],
];

const REF_Y: f64 = 1.0;
const REF_U: f64 = 0.19783000664283;
const REF_V: f64 = 0.46831999493879;
const KAPPA: f64 = 903.2962962;
const EPSILON: f64 = 0.0088564516;

/// Convert RGB channels (0..1) to HSLuv `(h, s, l)`.
pub fn rgb_to_husl(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let (x, y, z) = rgb_to_xyz(r, g, b);
    let (l, u, v) = xyz_to_luv(x, y, z);
    let (l, c, h) = luv_to_lch(l, u, v);
    lch_to_husl(l, c, h)
}

/// Convert HSLuv `(h, s, l)` to RGB channels (0..1).
pub fn husl_to_rgb(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    let (l, c, h) = husl_to_lch(h, s, l);
    let (l, u, v) = lch_to_luv(l, c, h);
    let (x, y, z) = luv_to_xyz(l, u, v);
    xyz_to_rgb(x, y, z)
}

fn rgb_to_xyz(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let (r, g, b) = (to_linear(r), to_linear(g), to_linear(b));
    (
        dot(M_INV[0], r, g, b),
        dot(M_INV[1], r, g, b),
        dot(M_INV[2], r, g, b),
    )
}

fn xyz_to_rgb(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    (
        from_linear(dot(M[0], x, y, z)),
        from_linear(dot(M[1], x, y, z)),
        from_linear(dot(M[2], x, y, z)),
    )
}

fn xyz_to_luv(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    if x == 0.0 && y == 0.0 && z == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let var_u = (4.0 * x) / (x + 15.0 * y + 3.0 * z);
    let var_v = (9.0 * y) / (x + 15.0 * y + 3.0 * z);
    let l = y_to_l(y);
    if l == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    (l, 13.0 * l * (var_u - REF_U), 13.0 * l * (var_v - REF_V))
}

fn luv_to_xyz(l: f64, u: f64, v: f64) -> (f64, f64, f64) {
    if l == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let var_u = u / (13.0 * l) + REF_U;
    let var_v = v / (13.0 * l) + REF_V;
    let y = l_to_y(l) * REF_Y;
    let x = -(9.0 * y * var_u) / ((var_u - 4.0) * var_v - var_u * var_v);
    let z = (9.0 * y - 15.0 * var_v * y - var_v * x) / (3.0 * var_v);
    (x, y, z)
}

fn luv_to_lch(l: f64, u: f64, v: f64) -> (f64, f64, f64) {
    let c = (u * u + v * v).sqrt();
    let mut h = v.atan2(u).to_degrees();
    if h < 0.0 {
        h += 360.0;
    }
    (l, c, h)
}

fn lch_to_luv(l: f64, c: f64, h: f64) -> (f64, f64, f64) {
    let hrad = h.to_radians();
    (l, hrad.cos() * c, hrad.sin() * c)
}

fn lch_to_husl(l: f64, c: f64, h: f64) -> (f64, f64, f64) {
    if l > 99.9999999 {
        return (h, 0.0, 100.0);
    }
    if l < 0.00000001 {
        return (h, 0.0, 0.0);
    }
    (h, c / max_chroma_for_lh(l, h) * 100.0, l)
}

fn husl_to_lch(h: f64, s: f64, l: f64) -> (f64, f64, f64) {
    if l > 99.9999999 {
        return (100.0, 0.0, h);
    }
    if l < 0.00000001 {
        return (0.0, 0.0, h);
    }
    (l, max_chroma_for_lh(l, h) / 100.0 * s, h)
}

fn max_chroma_for_lh(l: f64, h: f64) -> f64 {
    let hrad = h / 360.0 * 2.0 * PI;
    bounds(l)
        .iter()
        .map(|&(slope, intercept)| intercept / (hrad.sin() - slope * hrad.cos()))
        .filter(|length| *length >= 0.0)
        .fold(f64::MAX, f64::min)
}

/// The six lines bounding the RGB gamut in the chroma plane for lightness `l`.
fn bounds(l: f64) -> [(f64, f64); 6] {
    let sub1 = (l + 16.0).powi(3) / 1560896.0;
    let sub2 = if sub1 > EPSILON { sub1 } else { l / KAPPA };

    let mut lines = [(0.0, 0.0); 6];
    for (i, [m1, m2, m3]) in M.iter().copied().enumerate() {
        for t in 0..2 {
            let t = f64::from(t);
            let top1 = (284517.0 * m1 - 94839.0 * m3) * sub2;
            let top2 =
                (838422.0 * m3 + 769860.0 * m2 + 731718.0 * m1) * l * sub2 - 769860.0 * t * l;
            let bottom = (632260.0 * m3 - 126452.0 * m2) * sub2 + 126452.0 * t;
            lines[i * 2 + t as usize] = (top1 / bottom, top2 / bottom);
        }
    }
    lines
}

fn dot(row: [f64; 3], x: f64, y: f64, z: f64) -> f64 {
    row[0] * x + row[1] * y + row[2] * z
}

fn y_to_l(y: f64) -> f64 {
    if y > EPSILON {
        116.0 * (y / REF_Y).cbrt() - 16.0
    } else {
        (y / REF_Y) * KAPPA
    }
}

fn l_to_y(l: f64) -> f64 {
    if l > 8.0 {
        REF_Y * ((l + 16.0) / 116.0).powi(3)
    } else {
        REF_Y * l / KAPPA
    }
}

fn to_linear(c: f64) -> f64 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn from_linear(c: f64) -> f64 {
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: (f64, f64, f64), b: (f64, f64, f64)) {
        let tolerance = 1e-4;
        assert!(
            (a.0 - b.0).abs() < tolerance
                && (a.1 - b.1).abs() < tolerance
                && (a.2 - b.2).abs() < tolerance,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn black() {
        assert_near(rgb_to_husl(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
        assert_near(husl_to_rgb(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn saturated_primaries_have_full_saturation() {
        for rgb in [(1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.0, 0.0, 1.0)] {
            let (_, s, _) = rgb_to_husl(rgb.0, rgb.1, rgb.2);
            assert!((s - 100.0).abs() < 1e-3, "saturation {s} for {rgb:?}");
        }
    }

    #[test]
    fn round_trip() {
        for rgb in [(0.6, 0.4, 0.266), (0.2, 0.8, 0.5), (0.9, 0.1, 0.7)] {
            let (h, s, l) = rgb_to_husl(rgb.0, rgb.1, rgb.2);
            assert_near(husl_to_rgb(h, s, l), rgb);
        }
    }
}
