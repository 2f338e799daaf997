//! Postfix expressions and their evaluation.
//!
//! The parser lowers every property and variable value into an
//! [`Expression`]: a flat list of [`Code`]s in postfix order. Variable
//! references stay symbolic until [`Expression::resolve_vars`] substitutes
//! concrete values, after which [`Expression::evaluate`] runs the codes on an
//! operand stack.
//!
//! ```
//! use tilecss::expr::{Code, Expression, Operator, Value};
//!
//! // 2 + 3 * 4
//! let mut expr = Expression::default();
//! expr.push(Code::Value(Value::Number(2.0)));
//! expr.push(Code::Value(Value::Number(3.0)));
//! expr.push(Code::Value(Value::Number(4.0)));
//! expr.push(Code::Op(Operator::Multiply));
//! expr.push(Code::Op(Operator::Add));
//! assert_eq!(expr.evaluate().unwrap(), Value::Number(14.0));
//! ```

mod error;
pub mod functions;
mod value;

use std::fmt;

pub use error::EvalError;
pub use value::{Field, FieldPart, Stop, Value};

use crate::style::Position;

/// Arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Unary minus.
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Operator {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Reference to a variable from inside an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    /// Variable name without `@`.
    pub name: String,
    /// Number of assignments to `name` seen before the reference, if any.
    ///
    /// Without deferred evaluation the reference reads the assignment at
    /// `version - 1`; otherwise it reads the final one.
    pub version: Option<usize>,
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

/// One instruction of a postfix expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Code {
    /// Push a literal value.
    Value(Value),
    /// Push a percentage literal, e.g. `50%` as `50.0`.
    Percent(f64),
    /// Push the value of a variable.
    Var(VarRef),
    /// Start collecting the arguments of a function call.
    Function(String),
    /// Call the innermost open function with the collected arguments.
    FunctionEnd,
    /// Apply an operator to the top of the stack.
    Op(Operator),
}

/// A lazily evaluated value with the position it was declared at.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Expression {
    pub codes: Vec<Code>,
    pub position: Position,
}

/// Stack entry during evaluation.
///
/// Percentages only exist while evaluating; a percentage left on the stack
/// becomes a plain number.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operand {
    Value(Value),
    Percent(f64),
}

impl Operand {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Self::Value(v) => v.type_name(),
            Self::Percent(_) => "percentage",
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Value(v) => v,
            Self::Percent(v) => Value::Number(v),
        }
    }
}

impl Expression {
    pub fn new(position: Position) -> Self {
        Self {
            codes: Vec::new(),
            position,
        }
    }

    pub fn push(&mut self, code: Code) {
        self.codes.push(code);
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Variables referenced by this expression, in order of appearance.
    pub fn var_refs(&self) -> impl Iterator<Item = &VarRef> {
        self.codes.iter().filter_map(|c| match c {
            Code::Var(r) => Some(r),
            _ => None,
        })
    }

    /// Copy of this expression with every variable reference replaced by the
    /// value `lookup` returns for it.
    pub fn resolve_vars<F>(&self, mut lookup: F) -> Result<Expression, EvalError>
    where
        F: FnMut(&VarRef) -> Result<Value, EvalError>,
    {
        let codes = self
            .codes
            .iter()
            .map(|code| match code {
                Code::Var(r) => lookup(r).map(Code::Value),
                other => Ok(other.clone()),
            })
            .collect::<Result<_, _>>()?;
        Ok(Expression {
            codes,
            position: self.position.clone(),
        })
    }

    /// Evaluate the expression.
    ///
    /// A single remaining operand is the result; several become a
    /// [`Value::List`]. All variables must have been resolved.
    pub fn evaluate(&self) -> Result<Value, EvalError> {
        let mut stack: Vec<Operand> = Vec::new();
        // Open function calls: name and the stack height at the call.
        let mut calls: Vec<(&str, usize)> = Vec::new();

        for code in &self.codes {
            let base = calls.last().map_or(0, |&(_, base)| base);
            match code {
                Code::Value(v) => stack.push(Operand::Value(v.clone())),
                Code::Percent(v) => stack.push(Operand::Percent(*v)),
                Code::Var(r) => return Err(EvalError::UnresolvedVariable(r.name.clone())),
                Code::Function(name) => calls.push((name.as_str(), stack.len())),
                Code::FunctionEnd => {
                    let (name, base) = calls.pop().ok_or(EvalError::MissingOperand)?;
                    let args = stack.split_off(base);
                    let builtin = functions::lookup(name)
                        .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
                    stack.extend(builtin.call(name, args)?);
                }
                Code::Op(Operator::Negate) => {
                    if stack.len() <= base {
                        return Err(EvalError::MissingOperand);
                    }
                    let operand = stack.pop().ok_or(EvalError::MissingOperand)?;
                    stack.push(negate(operand)?);
                }
                Code::Op(op) => {
                    if stack.len() < base + 2 {
                        return Err(EvalError::MissingOperand);
                    }
                    let right = stack.pop().ok_or(EvalError::MissingOperand)?;
                    let left = stack.pop().ok_or(EvalError::MissingOperand)?;
                    stack.push(binary(*op, left, right)?);
                }
            }
        }

        match stack.len() {
            0 => Err(EvalError::Empty),
            1 => Ok(stack.pop().map(Operand::into_value).ok_or(EvalError::Empty)?),
            _ => Ok(Value::List(stack.into_iter().map(Operand::into_value).collect())),
        }
    }
}

fn negate(operand: Operand) -> Result<Operand, EvalError> {
    match operand {
        Operand::Value(Value::Number(v)) => Ok(Operand::Value(Value::Number(-v))),
        Operand::Percent(v) => Ok(Operand::Percent(-v)),
        other => Err(EvalError::UnsupportedNegation(other.type_name())),
    }
}

fn binary(op: Operator, left: Operand, right: Operand) -> Result<Operand, EvalError> {
    use Operand::Value as V;

    let value = match (op, left, right) {
        (op, V(Value::Number(a)), V(Value::Number(b))) => Value::Number(match op {
            Operator::Add => a + b,
            Operator::Subtract => a - b,
            Operator::Multiply => a * b,
            Operator::Divide => a / b,
            Operator::Negate => unreachable!("negation is unary"),
        }),
        (Operator::Add, V(Value::String(a)), V(Value::String(b))) => Value::String(a + &b),
        (Operator::Add, V(a), V(b)) if concatenates_fields(&a, &b) => {
            let mut parts = field_parts(a);
            parts.extend(field_parts(b));
            Value::FieldExpr(parts)
        }
        (Operator::Multiply, V(Value::Color(c)), V(Value::Number(f))) => Value::Color(c.multiply(f)),
        (op, left, right) => {
            return Err(EvalError::UnsupportedOperation {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            });
        }
    };
    Ok(Operand::Value(value))
}

/// Whether `a + b` builds a field expression: both sides are strings, fields
/// or field expressions and at least one is not a plain string.
fn concatenates_fields(a: &Value, b: &Value) -> bool {
    let part = |v: &Value| matches!(v, Value::String(_) | Value::Field(_) | Value::FieldExpr(_));
    let dynamic = |v: &Value| matches!(v, Value::Field(_) | Value::FieldExpr(_));
    part(a) && part(b) && (dynamic(a) || dynamic(b))
}

fn field_parts(v: Value) -> Vec<FieldPart> {
    match v {
        Value::Field(f) => vec![FieldPart::Field(f)],
        Value::String(s) => vec![FieldPart::Text(s)],
        Value::FieldExpr(parts) => parts,
        _ => Vec::new(),
    }
}
