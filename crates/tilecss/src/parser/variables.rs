//! Versioned variable table and memoized resolution.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::expr::{EvalError, Expression, Value, VarRef};
use crate::logging::targets;
use crate::style::{Position, Properties, PropertyKey};

/// Every assignment of every variable, in source order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Variables {
    assignments: HashMap<String, Vec<Expression>>,
    /// Names in order of first assignment.
    names: Vec<String>,
}

impl Variables {
    pub(crate) fn assign(&mut self, name: &str, expr: Expression) {
        match self.assignments.get_mut(name) {
            Some(versions) => versions.push(expr),
            None => {
                self.names.push(name.to_string());
                self.assignments.insert(name.to_string(), vec![expr]);
            }
        }
    }

    /// Number of assignments to `name` so far, or `None` if there are none.
    pub(crate) fn version(&self, name: &str) -> Option<usize> {
        self.assignments.get(name).map(Vec::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.names.len()
    }
}

/// Resolves variable references, evaluating each assignment at most once.
pub(crate) struct Resolver<'a> {
    vars: &'a Variables,
    deferred: bool,
    memo: HashMap<(&'a str, usize), Value>,
    in_progress: HashSet<(&'a str, usize)>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(vars: &'a Variables, deferred: bool) -> Self {
        Self {
            vars,
            deferred,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Evaluate `expr`, resolving its variable references first.
    pub(crate) fn evaluate(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        expr.resolve_vars(|r| self.resolve(r))?.evaluate()
    }

    /// Final value of every variable.
    ///
    /// On failure returns the error with the position of the failing
    /// assignment.
    pub(crate) fn final_values(&mut self) -> Result<Properties, (EvalError, Position)> {
        let vars = self.vars;
        let mut values = Properties::new();
        for name in &vars.names {
            let Some(versions) = vars.assignments.get(name) else {
                continue;
            };
            let Some(last) = versions.len().checked_sub(1) else {
                continue;
            };
            let position = versions[last].position.clone();
            let value = self
                .value_at(name, last)
                .map_err(|e| (e, position.clone()))?;
            values.set(PropertyKey::new(name.as_str()), value, position);
        }
        Ok(values)
    }

    fn resolve(&mut self, r: &VarRef) -> Result<Value, EvalError> {
        let vars = self.vars;
        let Some((name, versions)) = vars.assignments.get_key_value(r.name.as_str()) else {
            return Err(EvalError::MissingVariable(r.name.clone()));
        };
        let index = match r.version {
            Some(prior) if !self.deferred && prior > 0 => prior - 1,
            _ => versions.len() - 1,
        };
        trace!(target: targets::EVAL, var = %r, index, "resolve variable");
        self.value_at(name, index)
    }

    fn value_at(&mut self, name: &'a str, index: usize) -> Result<Value, EvalError> {
        let key = (name, index);
        if let Some(value) = self.memo.get(&key) {
            return Ok(value.clone());
        }
        if !self.in_progress.insert(key) {
            return Err(EvalError::RecursiveVariable(name.to_string()));
        }
        let vars = self.vars;
        let expr = vars
            .assignments
            .get(name)
            .and_then(|versions| versions.get(index))
            .ok_or_else(|| EvalError::MissingVariable(name.to_string()))?;
        let result = self.evaluate(expr);
        self.in_progress.remove(&key);
        let value = result?;
        self.memo.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Code, Operator};

    fn literal(v: f64) -> Expression {
        let mut expr = Expression::default();
        expr.push(Code::Value(Value::Number(v)));
        expr
    }

    fn reference(vars: &Variables, name: &str) -> Expression {
        let mut expr = Expression::default();
        expr.push(Code::Var(VarRef {
            name: name.into(),
            version: vars.version(name),
        }));
        expr
    }

    fn versioned_table() -> Variables {
        // @foo: 1; @bar: @foo; @foo: 2;
        let mut vars = Variables::default();
        vars.assign("foo", literal(1.0));
        let bar = reference(&vars, "foo");
        vars.assign("bar", bar);
        vars.assign("foo", literal(2.0));
        vars
    }

    #[test]
    fn prior_assignment_wins_without_deferral() {
        let vars = versioned_table();
        let values = Resolver::new(&vars, false).final_values().unwrap();
        assert_eq!(values.get_float("foo"), Some(2.0));
        assert_eq!(values.get_float("bar"), Some(1.0));
    }

    #[test]
    fn final_assignment_wins_with_deferral() {
        let vars = versioned_table();
        let values = Resolver::new(&vars, true).final_values().unwrap();
        assert_eq!(values.get_float("bar"), Some(2.0));
    }

    #[test]
    fn self_reference_extends_prior_value() {
        // @w: 1; @w: @w + 1;
        let mut vars = Variables::default();
        vars.assign("w", literal(1.0));
        let mut expr = reference(&vars, "w");
        expr.push(Code::Value(Value::Number(1.0)));
        expr.push(Code::Op(Operator::Add));
        vars.assign("w", expr);
        let values = Resolver::new(&vars, false).final_values().unwrap();
        assert_eq!(values.get_float("w"), Some(2.0));
    }

    #[test]
    fn cycles_are_reported() {
        // @a: @b; @b: @a;
        let mut vars = Variables::default();
        let a = reference(&vars, "b");
        vars.assign("a", a);
        let b = reference(&vars, "a");
        vars.assign("b", b);
        let (err, _) = Resolver::new(&vars, false).final_values().unwrap_err();
        assert_eq!(err, EvalError::RecursiveVariable("a".into()));
    }

    #[test]
    fn missing_variable() {
        let vars = Variables::default();
        let expr = reference(&vars, "nope");
        let err = Resolver::new(&vars, false).evaluate(&expr).unwrap_err();
        assert_eq!(err.to_string(), "missing var nope in expression");
    }
}
