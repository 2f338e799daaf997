//! Attribute filters and filter merging.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Comparison operator of a filter or zoom constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompOp {
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    /// `=~`, only valid for string values.
    Regex,
}

impl CompOp {
    /// Parse an operator token (`=`, `!=`, `<`, `<=`, `>`, `>=`, `=~`).
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "=" => Self::Eq,
            "!=" => Self::Neq,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "=~" => Self::Regex,
            _ => return None,
        })
    }

    /// The operator's source text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Neq => "!=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Regex => "=~",
        }
    }

    fn is_upper_bound(self) -> bool {
        matches!(self, Self::Lt | Self::Lte)
    }

    fn is_lower_bound(self) -> bool {
        matches!(self, Self::Gt | Self::Gte)
    }

    fn is_strict(self) -> bool {
        matches!(self, Self::Lt | Self::Gt)
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Right-hand side of a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl FilterValue {
    /// The numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl Hash for FilterValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(v) => v.hash(state),
            Self::Number(v) => v.to_bits().hash(state),
            Self::String(v) => v.hash(state),
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "'{v}'"),
        }
    }
}

/// An attribute predicate `[field op value]`.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct Filter {
    pub field: String,
    pub op: CompOp,
    pub value: FilterValue,
}

impl Filter {
    pub fn new(field: impl Into<String>, op: CompOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}{}{}]", self.field, self.op, self.value)
    }
}

/// Intersect two filters on the same field.
///
/// Identical filters pass through. Two upper bounds (`<`, `<=`) keep the
/// tighter bound and two lower bounds (`>`, `>=`) likewise; at equal values
/// the strict operator wins. Everything else fails.
pub fn merge_filter(a: &Filter, b: &Filter) -> Option<Filter> {
    if a.field != b.field {
        return None;
    }
    if a == b {
        return Some(a.clone());
    }
    let (av, bv) = (a.value.as_number()?, b.value.as_number()?);

    let a_tighter = if a.op.is_upper_bound() && b.op.is_upper_bound() {
        av < bv || (av == bv && a.op.is_strict())
    } else if a.op.is_lower_bound() && b.op.is_lower_bound() {
        av > bv || (av == bv && a.op.is_strict())
    } else {
        return None;
    };

    Some(if a_tighter { a.clone() } else { b.clone() })
}

/// Merge two field-sorted filter lists.
///
/// Filters on fields present in only one list pass through. Filters on a
/// shared field are combined with [`merge_filter`]; any failure fails the
/// whole merge.
pub fn merge_filters(a: &[Filter], b: &[Filter]) -> Option<Vec<Filter>> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].field.cmp(&b[j].field) {
            std::cmp::Ordering::Less => {
                merged.push(a[i].clone());
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                merged.push(b[j].clone());
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                merged.push(merge_filter(&a[i], &b[j])?);
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    Some(merged)
}

/// Whether every filter of `a` appears in `b` (exact equality only).
pub fn filters_subset(a: &[Filter], b: &[Filter]) -> bool {
    a.iter().all(|fa| b.contains(fa))
}

/// Whether no two filters on the same field differ.
pub fn filters_overlap(a: &[Filter], b: &[Filter]) -> bool {
    a.iter()
        .all(|fa| b.iter().filter(|fb| fb.field == fa.field).all(|fb| fb == fa))
}

/// Element-wise equality.
pub fn filters_equal(a: &[Filter], b: &[Filter]) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(field: &str, op: CompOp, v: f64) -> Filter {
        Filter::new(field, op, FilterValue::Number(v))
    }

    fn text(field: &str, v: &str) -> Filter {
        Filter::new(field, CompOp::Eq, FilterValue::String(v.into()))
    }

    fn accepts(f: &Filter, x: f64) -> bool {
        let v = f.value.as_number().unwrap();
        match f.op {
            CompOp::Eq => x == v,
            CompOp::Neq => x != v,
            CompOp::Lt => x < v,
            CompOp::Lte => x <= v,
            CompOp::Gt => x > v,
            CompOp::Gte => x >= v,
            CompOp::Regex => unreachable!(),
        }
    }

    #[test]
    fn merge_identical_and_conflicting() {
        assert_eq!(merge_filter(&text("type", "a"), &text("type", "a")), Some(text("type", "a")));
        assert_eq!(merge_filter(&text("type", "a"), &text("type", "b")), None);
        assert_eq!(merge_filter(&text("type", "a"), &text("other", "a")), None);
        assert_eq!(
            merge_filter(&num("w", CompOp::Gt, 1.0), &num("w", CompOp::Lt, 5.0)),
            None
        );
        assert_eq!(
            merge_filter(&num("w", CompOp::Eq, 1.0), &num("w", CompOp::Eq, 2.0)),
            None
        );
    }

    #[test]
    fn merge_keeps_tighter_bound() {
        use CompOp::*;
        assert_eq!(merge_filter(&num("w", Lt, 3.0), &num("w", Lt, 5.0)), Some(num("w", Lt, 3.0)));
        assert_eq!(merge_filter(&num("w", Lte, 5.0), &num("w", Lt, 3.0)), Some(num("w", Lt, 3.0)));
        assert_eq!(merge_filter(&num("w", Lte, 3.0), &num("w", Lt, 3.0)), Some(num("w", Lt, 3.0)));
        assert_eq!(merge_filter(&num("w", Gt, 3.0), &num("w", Gte, 5.0)), Some(num("w", Gte, 5.0)));
        assert_eq!(merge_filter(&num("w", Gte, 3.0), &num("w", Gt, 3.0)), Some(num("w", Gt, 3.0)));
    }

    #[test]
    fn merged_filter_accepts_exact_intersection() {
        use CompOp::*;
        let bounds = [Lt, Lte, Gt, Gte];
        for op_a in bounds {
            for op_b in bounds {
                for (va, vb) in [(3.0, 5.0), (5.0, 3.0), (4.0, 4.0)] {
                    let (a, b) = (num("w", op_a, va), num("w", op_b, vb));
                    let Some(merged) = merge_filter(&a, &b) else {
                        continue;
                    };
                    for x in [2.0, 3.0, 3.5, 4.0, 4.5, 5.0, 6.0] {
                        assert_eq!(
                            accepts(&merged, x),
                            accepts(&a, x) && accepts(&b, x),
                            "{a} & {b} -> {merged} at {x}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn merge_filter_lists() {
        let a = vec![text("a", "1"), text("c", "3")];
        let b = vec![text("b", "2"), text("c", "3"), text("d", "4")];
        assert_eq!(
            merge_filters(&a, &b),
            Some(vec![text("a", "1"), text("b", "2"), text("c", "3"), text("d", "4")])
        );
        assert_eq!(merge_filters(&a, &[text("c", "x")]), None);
        assert_eq!(merge_filters(&[], &a), Some(a.clone()));
    }

    #[test]
    fn subset_and_overlap() {
        let a = vec![text("type", "road")];
        let b = vec![text("tunnel", "1"), text("type", "road")];
        assert!(filters_subset(&a, &b));
        assert!(!filters_subset(&b, &a));
        assert!(filters_subset(&[], &a));

        assert!(filters_overlap(&a, &b));
        assert!(filters_overlap(&[text("access", "no")], &a));
        assert!(!filters_overlap(&[text("type", "rail")], &b));

        assert!(filters_equal(&b, &b.clone()));
        assert!(!filters_equal(&a, &b));
    }

    #[test]
    fn display() {
        assert_eq!(num("zoom", CompOp::Gte, 3.0).to_string(), "[zoom>=3]");
        assert_eq!(text("type", "road").to_string(), "[type='road']");
        assert_eq!(Filter::new("x", CompOp::Neq, FilterValue::Null).to_string(), "[x!=null]");
    }
}
