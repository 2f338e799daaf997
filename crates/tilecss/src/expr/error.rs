//! Expression evaluation errors.

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    #[error("unsupported operation {op} for {left} and {right}")]
    UnsupportedOperation {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("unsupported negation of {0}")]
    UnsupportedNegation(&'static str),

    #[error("unknown function {0}")]
    UnknownFunction(String),

    #[error("function {function} takes exactly {expected} arguments, got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    #[error("function {function} requires {expected} as argument {position}, got {got}")]
    ArgumentType {
        function: String,
        position: usize,
        expected: &'static str,
        got: &'static str,
    },

    #[error("missing operand")]
    MissingOperand,

    #[error("unable to evaluate expression")]
    Empty,

    #[error("unresolved variable @{0}")]
    UnresolvedVariable(String),

    #[error("missing var {0} in expression")]
    MissingVariable(String),

    #[error("recursive variable reference @{0}")]
    RecursiveVariable(String),
}
