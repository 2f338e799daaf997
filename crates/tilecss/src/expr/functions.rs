//! Built-in function registry.
//!
//! The registry is a fixed table: [`lookup`] maps a function name to its
//! [`Builtin`], which knows its arity and argument contract.

use tilecss_color::Color;

use super::{EvalError, Operand, Stop, Value};

/// A built-in function.
#[derive(Debug, Clone, Copy)]
pub enum Builtin {
    /// `(color, number|percent) -> color`; the amount is multiplied by `scale`.
    Adjust {
        apply: fn(Color, f64) -> Color,
        scale: f64,
        perceptual: bool,
    },
    /// `(color) -> number`
    Channel {
        read: fn(&Color) -> f64,
        perceptual: bool,
    },
    /// `(color) -> color`
    Greyscale { perceptual: bool },
    /// `(color, color, number|percent) -> color`
    Mix,
    /// `(color, color) -> color`
    SetHue,
    /// `rgb`/`rgba`
    Rgb { alpha: bool },
    /// `hsl`/`hsla`
    Hsl { alpha: bool },
    /// `husl`/`husla`
    Husl { alpha: bool },
    /// `(int, color) -> stop`
    Stop,
    /// Returns its arguments unchanged.
    Echo,
}

const PERCENT: f64 = 0.01;

/// Look up a built-in function by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    use Builtin::*;

    let adjust = |apply, scale, perceptual| Adjust {
        apply,
        scale,
        perceptual,
    };
    Some(match name {
        "lighten" => adjust(Color::lighten, PERCENT, false),
        "lightenp" => adjust(Color::lighten, PERCENT, true),
        "darken" => adjust(Color::darken, PERCENT, false),
        "darkenp" => adjust(Color::darken, PERCENT, true),
        "saturate" => adjust(Color::saturate, PERCENT, false),
        "saturatep" => adjust(Color::saturate, PERCENT, true),
        "desaturate" => adjust(Color::desaturate, PERCENT, false),
        "desaturatep" => adjust(Color::desaturate, PERCENT, true),
        "fadein" => adjust(Color::fade_in, PERCENT, false),
        "fadeout" => adjust(Color::fade_out, PERCENT, false),
        "spin" => adjust(Color::spin, 1.0, false),
        "spinp" => adjust(Color::spin, 1.0, true),
        "hue" => Channel { read: |c| c.h, perceptual: false },
        "huep" => Channel { read: |c| c.h, perceptual: true },
        "saturation" => Channel { read: |c| c.s, perceptual: false },
        "saturationp" => Channel { read: |c| c.s, perceptual: true },
        "lightness" => Channel { read: |c| c.l, perceptual: false },
        "lightnessp" => Channel { read: |c| c.l, perceptual: true },
        "alpha" => Channel { read: |c| c.a, perceptual: false },
        "greyscale" => Greyscale { perceptual: false },
        "greyscalep" => Greyscale { perceptual: true },
        "mix" => Mix,
        "-mc-set-hue" => SetHue,
        "rgb" => Rgb { alpha: false },
        "rgba" => Rgb { alpha: true },
        "hsl" => Hsl { alpha: false },
        "hsla" => Hsl { alpha: true },
        "husl" => Husl { alpha: false },
        "husla" => Husl { alpha: true },
        "stop" => Stop,
        "__echo__" => Echo,
        _ => return None,
    })
}

impl Builtin {
    /// Number of arguments, or `None` for variadic functions.
    pub fn arity(self) -> Option<usize> {
        match self {
            Self::Adjust { .. } | Self::SetHue | Self::Stop => Some(2),
            Self::Channel { .. } | Self::Greyscale { .. } => Some(1),
            Self::Mix => Some(3),
            Self::Rgb { alpha } | Self::Hsl { alpha } | Self::Husl { alpha } => {
                Some(if alpha { 4 } else { 3 })
            }
            Self::Echo => None,
        }
    }

    pub(crate) fn call(self, name: &str, args: Vec<Operand>) -> Result<Vec<Operand>, EvalError> {
        if let Some(expected) = self.arity() {
            if args.len() != expected {
                return Err(EvalError::Arity {
                    function: name.to_string(),
                    expected,
                    got: args.len(),
                });
            }
        }
        let args = Args { name, args: &args };

        let color = match self {
            Self::Adjust {
                apply,
                scale,
                perceptual,
            } => apply(args.color(0, perceptual)?, args.amount(1)? * scale),
            Self::Channel { read, perceptual } => {
                let c = args.color(0, perceptual)?;
                return Ok(vec![Operand::Value(Value::Number(read(&c)))]);
            }
            Self::Greyscale { perceptual } => args.color(0, perceptual)?.greyscale(),
            Self::Mix => args
                .color(0, false)?
                .mix(args.color(1, false)?, args.amount(2)? * PERCENT),
            Self::SetHue => args.color(0, false)?.set_hue(args.color(1, false)?),
            Self::Rgb { .. } => {
                let channels = args.channels(|i, v, percent| match (i, percent) {
                    (_, true) => v / 100.0,
                    (3, false) if v <= 1.0 => v,
                    _ => v / 255.0,
                })?;
                Color::from_rgba(channels[0], channels[1], channels[2], channels[3])
            }
            Self::Hsl { .. } => {
                let [h, s, l, a] = args.channels(hsl_channel)?;
                Color::from_hsla(h, s, l, a)
            }
            Self::Husl { .. } => {
                let [h, s, l, a] = args.channels(hsl_channel)?;
                Color::from_husl(h, s, l, a)
            }
            Self::Stop => {
                let value = args.number(0)?;
                let color = args.color(1, false)?;
                return Ok(vec![Operand::Value(Value::Stop(Stop {
                    value: value as i64,
                    color,
                }))]);
            }
            Self::Echo => return Ok(args.args.to_vec()),
        };
        Ok(vec![Operand::Value(Value::Color(color))])
    }
}

/// Hue is in degrees (a percentage is a share of the full circle); the other
/// channels are fractions or percentages.
fn hsl_channel(i: usize, v: f64, percent: bool) -> f64 {
    match (i, percent) {
        (0, false) => v,
        (0, true) => v / 100.0 * 360.0,
        (_, true) => v / 100.0,
        _ => v,
    }
}

struct Args<'a> {
    name: &'a str,
    args: &'a [Operand],
}

impl Args<'_> {
    fn type_error(&self, i: usize, expected: &'static str) -> EvalError {
        EvalError::ArgumentType {
            function: self.name.to_string(),
            position: i + 1,
            expected,
            got: self.args[i].type_name(),
        }
    }

    fn color(&self, i: usize, perceptual: bool) -> Result<Color, EvalError> {
        match &self.args[i] {
            Operand::Value(Value::Color(c)) if perceptual => Ok(c.to_perceptual()),
            Operand::Value(Value::Color(c)) => Ok(*c),
            _ => Err(self.type_error(i, "a color")),
        }
    }

    fn number(&self, i: usize) -> Result<f64, EvalError> {
        match &self.args[i] {
            Operand::Value(Value::Number(v)) => Ok(*v),
            _ => Err(self.type_error(i, "a number")),
        }
    }

    /// A number or percentage, as written.
    fn amount(&self, i: usize) -> Result<f64, EvalError> {
        match &self.args[i] {
            Operand::Value(Value::Number(v)) | Operand::Percent(v) => Ok(*v),
            _ => Err(self.type_error(i, "a number or percentage")),
        }
    }

    /// Up to four color channels, each converted by `convert(index, value,
    /// is_percent)` and clamped to 0..1 (hue is not clamped). Missing alpha is 1.
    fn channels(&self, convert: impl Fn(usize, f64, bool) -> f64) -> Result<[f64; 4], EvalError> {
        let mut channels = [1.0; 4];
        for (i, arg) in self.args.iter().enumerate() {
            let (v, percent) = match arg {
                Operand::Value(Value::Number(v)) => (*v, false),
                Operand::Percent(v) => (*v, true),
                _ => return Err(self.type_error(i, "a number or percentage")),
            };
            let converted = convert(i, v, percent);
            channels[i] = if i == 0 && !matches!(self.name, "rgb" | "rgba") {
                converted
            } else {
                converted.clamp(0.0, 1.0)
            };
        }
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: f64) -> Operand {
        Operand::Value(Value::Number(v))
    }

    fn color(c: Color) -> Operand {
        Operand::Value(Value::Color(c))
    }

    fn call(name: &str, args: Vec<Operand>) -> Result<Vec<Operand>, EvalError> {
        lookup(name).ok_or_else(|| EvalError::UnknownFunction(name.into()))?.call(name, args)
    }

    fn call_color(name: &str, args: Vec<Operand>) -> Color {
        match call(name, args).unwrap().as_slice() {
            [Operand::Value(Value::Color(c))] => *c,
            other => panic!("expected color, got {other:?}"),
        }
    }

    #[test]
    fn rgb_matches_hex() {
        let hex = Color::parse("#ff6600").unwrap();
        assert_eq!(call_color("rgb", vec![num(255.0), num(102.0), num(0.0)]), hex);
        assert_eq!(
            call_color("rgb", vec![Operand::Percent(100.0), Operand::Percent(40.0), num(0.0)]),
            hex
        );
    }

    #[test]
    fn rgba_alpha_scales() {
        let c = call_color("rgba", vec![num(255.0), num(102.0), num(0.0), num(102.0)]);
        assert!((c.a - 0.4).abs() < 1e-9);
        let c = call_color("rgba", vec![num(255.0), num(102.0), num(0.0), num(0.5)]);
        assert_eq!(c.a, 0.5);
        let c = call_color(
            "rgba",
            vec![Operand::Percent(100.0), num(102.0), num(0.0), Operand::Percent(20.0)],
        );
        assert!((c.a - 0.2).abs() < 1e-9);
    }

    #[test]
    fn rgb_clamps_channels() {
        let c = call_color("rgb", vec![num(300.0), num(-5.0), num(0.0)]);
        assert_eq!(c.to_string(), "#ff0000");
    }

    #[test]
    fn arity_errors() {
        assert_eq!(
            call("rgb", vec![num(1.0)]).unwrap_err().to_string(),
            "function rgb takes exactly 3 arguments, got 1"
        );
        assert_eq!(
            call("lighten", vec![num(1.0), num(1.0)]).unwrap_err().to_string(),
            "function lighten requires a color as argument 1, got number"
        );
        assert!(lookup("nosuchfunction").is_none());
    }

    #[test]
    fn adjustments_take_percentages() {
        let base = Color::from_hsla(5.0, 0.85, 0.45, 1.0);
        let lighter = call_color("lighten", vec![color(base), Operand::Percent(5.0)]);
        assert!((lighter.l - 0.5).abs() < 1e-9);
        let faded = call_color("fadeout", vec![color(Color::parse("white").unwrap()), num(50.0)]);
        assert_eq!(faded.to_string(), "rgba(255, 255, 255, 0.50000)");
        let spun = call_color("spin", vec![color(base), num(120.0)]);
        assert!((spun.h - 125.0).abs() < 1e-9);
        assert!(call_color("lightenp", vec![color(base), num(5.0)]).perceptual);
    }

    #[test]
    fn channels_and_stop() {
        let base = Color::from_hsla(5.0, 0.85, 0.45, 0.6);
        assert_eq!(call("hue", vec![color(base)]).unwrap(), vec![num(5.0)]);
        assert_eq!(call("alpha", vec![color(base)]).unwrap(), vec![num(0.6)]);

        let red = Color::parse("red").unwrap();
        assert_eq!(
            call("stop", vec![num(100.0), color(red)]).unwrap(),
            vec![Operand::Value(Value::Stop(Stop { value: 100, color: red }))]
        );
    }

    #[test]
    fn hsl_builds_standard_color() {
        let c = call_color("hsl", vec![num(120.0), Operand::Percent(100.0), num(0.5)]);
        assert_eq!(c.to_string(), "#00ff00");
        assert!(call_color("husl", vec![num(120.0), num(1.0), num(0.5)]).perceptual);
    }

    #[test]
    fn echo_returns_arguments() {
        let args = vec![num(1.0), Operand::Percent(2.0)];
        assert_eq!(call("__echo__", args.clone()).unwrap(), args);
    }
}
