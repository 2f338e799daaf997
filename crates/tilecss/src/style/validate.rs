//! Known properties and their value types.

use crate::expr::Value;

/// Result of checking a property against the table of known properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    /// The property name is not known.
    UnknownProperty,
    /// The property is known but the value has the wrong type.
    InvalidValue,
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Color,
    Number,
    Numbers,
    String,
    StringOrStrings,
    Bool,
    Keyword(&'static [&'static str]),
    Stops,
}

const GAMMA_METHODS: &[&str] = &["power", "linear", "none", "threshold", "multiply"];
const PLACEMENTS: &[&str] = &["line", "point", "vertex", "interior"];
const TRANSFORMS: &[&str] = &["none", "uppercase", "lowercase", "capitalize"];

const COMP_OPS: &[&str] = &[
    "src",
    "dst",
    "src-over",
    "dst-over",
    "src-in",
    "dst-in",
    "src-out",
    "dst-out",
    "src-atop",
    "dst-atop",
    "xor",
    "plus",
    "minus",
    "multiply",
    "screen",
    "overlay",
    "darken",
    "lighten",
    "color-dodge",
    "color-burn",
    "hard-light",
    "soft-light",
    "difference",
    "exclusion",
    "contrast",
    "invert",
    "invert-rgb",
    "grain-merge",
    "grain-extract",
    "hue",
    "saturation",
    "color",
    "value",
];

const SCALINGS: &[&str] = &[
    "near", "fast", "bilinear", "bicubic", "spline16", "spline36", "hanning", "hamming",
    "hermite", "kaiser", "quadric", "catrom", "gaussian", "bessel", "mitchell", "sinc", "lanczos",
    "blackman",
];

fn property_kind(name: &str) -> Option<Kind> {
    use Kind::*;

    Some(match name {
        "background-color" => Color,
        "background-image" => String,

        "building-fill" => Color,
        "building-fill-opacity" | "building-height" => Number,

        "comp-op" => Keyword(COMP_OPS),
        "opacity" => Number,
        "image-filters" => StringOrStrings,

        "line-cap" => Keyword(&["round", "butt", "square"]),
        "line-clip" => Bool,
        "line-color" => Color,
        "line-comp-op" => Keyword(COMP_OPS),
        "line-dasharray" => Numbers,
        "line-gamma-method" => Keyword(GAMMA_METHODS),
        "line-join" => Keyword(&["miter", "round", "bevel"]),
        "line-offset" | "line-opacity" | "line-simplify" | "line-smooth" | "line-width" => Number,
        "line-rasterizer" => Keyword(&["full", "fast"]),
        "line-pattern-file" => String,

        "marker-allow-overlap" | "marker-ignore-placement" => Bool,
        "marker-file" | "marker-transform" => String,
        "marker-fill" | "marker-line-color" => Color,
        "marker-comp-op" => Keyword(COMP_OPS),
        "marker-height" | "marker-line-width" | "marker-opacity" | "marker-spacing"
        | "marker-width" => Number,
        "marker-placement" => Keyword(&["point", "interior", "line"]),
        "marker-type" => Keyword(&["arrow", "ellipse"]),

        "point-file" | "point-transform" => String,
        "point-allow-overlap" | "point-ignore-placement" => Bool,
        "point-opacity" => Number,

        "polygon-fill" => Color,
        "polygon-comp-op" => Keyword(COMP_OPS),
        "polygon-gamma" | "polygon-opacity" => Number,
        "polygon-gamma-method" => Keyword(GAMMA_METHODS),
        "polygon-pattern-alignment" => Keyword(&["global", "local"]),
        "polygon-pattern-file" => String,
        "polygon-pattern-opacity" => Number,

        "shield-allow-overlap" | "shield-avoid-edges" | "shield-clip" | "shield-wrap-before" => {
            Bool
        }
        "shield-character-spacing" | "shield-dx" | "shield-dy" | "shield-halo-radius"
        | "shield-line-spacing" | "shield-min-distance" | "shield-min-padding"
        | "shield-opacity" | "shield-size" | "shield-spacing" | "shield-text-dx"
        | "shield-text-dy" | "shield-wrap-width" => Number,
        "shield-face-name" => StringOrStrings,
        "shield-file" | "shield-name" | "shield-wrap-character" => String,
        "shield-fill" | "shield-halo-fill" => Color,
        "shield-placement" => Keyword(PLACEMENTS),
        "shield-transform" => Keyword(TRANSFORMS),

        "text-allow-overlap" | "text-avoid-edges" | "text-clip" | "text-wrap-before" => Bool,
        "text-character-spacing" | "text-dx" | "text-dy" | "text-halo-radius"
        | "text-line-spacing" | "text-min-distance" | "text-min-padding" | "text-opacity"
        | "text-size" | "text-spacing" | "text-wrap-width" => Number,
        "text-comp-op" => Keyword(COMP_OPS),
        "text-face-name" => StringOrStrings,
        "text-fill" | "text-halo-fill" => Color,
        "text-name" | "text-wrap-character" => String,
        "text-placement" => Keyword(PLACEMENTS),
        "text-transform" => Keyword(TRANSFORMS),

        "raster-opacity" | "raster-filter-factor" | "raster-mesh-size" | "raster-epsilon" => {
            Number
        }
        "raster-scaling" => Keyword(SCALINGS),
        "raster-colorizer-default-mode" => Keyword(&["discrete", "linear", "exact"]),
        "raster-colorizer-default-color" => Color,
        "raster-colorizer-stops" => Stops,
        "raster-comp-op" => Keyword(COMP_OPS),

        _ => return None,
    })
}

impl Kind {
    fn accepts(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Color, Value::Color(_)) => true,
            (Self::Number, Value::Number(_)) => true,
            (Self::Numbers, Value::List(values)) => values.iter().all(|v| v.as_number().is_some()),
            (Self::String, Value::String(_)) => true,
            (Self::StringOrStrings, Value::String(_)) => true,
            (Self::StringOrStrings, Value::List(values)) => values.iter().all(|v| v.as_str().is_some()),
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Keyword(keywords), Value::String(k)) => keywords.contains(&k.as_str()),
            (Self::Stops, Value::Stop(_)) => true,
            (Self::Stops, Value::List(values)) => values.iter().all(|v| matches!(v, Value::Stop(_))),
            _ => false,
        }
    }
}

/// Whether the value is only known per feature: fields, field expressions
/// and strings with `[field]` placeholders.
fn is_dynamic(value: &Value) -> bool {
    match value {
        Value::String(s) => s
            .find('[')
            .is_some_and(|open| s[open..].contains(']')),
        other => other.is_dynamic(),
    }
}

/// Check `value` against the type of property `name`.
pub fn validate_property(name: &str, value: &Value) -> Validity {
    let Some(kind) = property_kind(name) else {
        return Validity::UnknownProperty;
    };
    if is_dynamic(value) || kind.accepts(value) {
        Validity::Valid
    } else {
        Validity::InvalidValue
    }
}
