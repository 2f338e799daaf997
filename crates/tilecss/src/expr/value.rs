//! Runtime values produced by expression evaluation.

use std::fmt;

use tilecss_color::Color;

/// A field reference such as `[name]`. The text keeps its brackets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Field(pub String);

impl Field {
    /// Reference to the attribute `name`.
    pub fn named(name: &str) -> Self {
        Self(format!("[{name}]"))
    }

    /// The attribute name without brackets.
    pub fn name(&self) -> &str {
        self.0
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One piece of a concatenated field expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPart {
    Field(Field),
    Text(String),
}

impl fmt::Display for FieldPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "{field}"),
            Self::Text(text) => write!(f, "'{text}'"),
        }
    }
}

/// A color ramp stop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stop {
    pub value: i64,
    pub color: Color,
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stop({}, {})", self.value, self.color)
    }
}

/// An evaluated property or variable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    /// Quoted strings, keywords and `url(...)` paths.
    String(String),
    Bool(bool),
    Color(Color),
    Field(Field),
    List(Vec<Value>),
    Stop(Stop),
    /// Concatenation of fields and strings, e.g. `[name] + ' ' + [ref]`.
    FieldExpr(Vec<FieldPart>),
}

impl Value {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Color(_) => "color",
            Self::Field(_) => "field",
            Self::List(_) => "list",
            Self::Stop(_) => "stop",
            Self::FieldExpr(_) => "field expression",
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(v) => Some(*v),
            _ => None,
        }
    }

    /// Whether the value depends on feature attributes.
    pub fn is_dynamic(&self) -> bool {
        match self {
            Self::Field(_) | Self::FieldExpr(_) => true,
            Self::List(values) => values.iter().any(Value::is_dynamic),
            _ => false,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Color> for Value {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Color(v) => write!(f, "{v}"),
            Self::Field(v) => write!(f, "{v}"),
            Self::Stop(v) => write!(f, "{v}"),
            Self::List(values) => {
                for (i, v) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
            Self::FieldExpr(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" + ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_name() {
        let field = Field::named("name");
        assert_eq!(field.0, "[name]");
        assert_eq!(field.name(), "name");
    }

    #[test]
    fn display() {
        assert_eq!(Value::Number(1.5).to_string(), "1.5");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Number(2.0)]).to_string(),
            "a, 2"
        );
        let expr = Value::FieldExpr(vec![
            FieldPart::Field(Field::named("a")),
            FieldPart::Text(" ".into()),
        ]);
        assert_eq!(expr.to_string(), "[a] + ' '");
        assert!(expr.is_dynamic());
        assert!(!Value::Bool(true).is_dynamic());
    }
}
