//! Property store with specificity-aware merging.

use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;
use std::fmt;

use tilecss_color::Color;

use super::{Position, Specificity};
use crate::expr::{Field, Stop, Value};

/// Property name plus instance, e.g. `top/line-width`.
///
/// The default instance is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PropertyKey {
    pub name: String,
    pub instance: String,
}

impl PropertyKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: String::new(),
        }
    }

    pub fn with_instance(name: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.instance.is_empty() {
            write!(f, "{}/", self.instance)?;
        }
        f.write_str(&self.name)
    }
}

/// A property value with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub value: Value,
    pub position: Position,
    pub specificity: Specificity,
}

/// The first declaration of a property family, see [`Properties::sorted_prefixes`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// The prefix, e.g. `line-`.
    pub name: String,
    pub instance: String,
}

impl Prefix {
    pub fn new(name: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instance: instance.into(),
        }
    }
}

/// Properties of a block or rule.
///
/// Typed getters read the *default instance* (see
/// [`set_default_instance`](Self::set_default_instance)) and return `None`
/// both for missing properties and for values of another type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties {
    values: BTreeMap<PropertyKey, Attr>,
    default_instance: String,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty properties, usable in statics.
    pub const fn empty() -> Self {
        Self {
            values: BTreeMap::new(),
            default_instance: String::new(),
        }
    }

    /// Set a property, replacing any previous value.
    ///
    /// The specificity starts out as the declaration index of `position`.
    pub fn set(&mut self, key: PropertyKey, value: Value, position: Position) {
        let specificity = Specificity::from_index(position.index);
        self.values.insert(
            key,
            Attr {
                value,
                position,
                specificity,
            },
        );
    }

    /// Set a property with an explicit specificity.
    pub fn set_attr(&mut self, key: PropertyKey, attr: Attr) {
        self.values.insert(key, attr);
    }

    /// Value of `name` in the default instance.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let key = PropertyKey::with_instance(name, self.default_instance.as_str());
        self.values.get(&key).map(|attr| &attr.value)
    }

    pub fn get_key(&self, key: &PropertyKey) -> Option<&Value> {
        self.values.get(key).map(|attr| &attr.value)
    }

    pub fn attr(&self, key: &PropertyKey) -> Option<&Attr> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &PropertyKey) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<Attr> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &PropertyKey> {
        self.values.keys()
    }

    /// Entries in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, PropertyKey, Attr> {
        self.values.iter()
    }

    /// Instance the typed getters read.
    pub fn default_instance(&self) -> &str {
        &self.default_instance
    }

    pub fn set_default_instance(&mut self, instance: impl Into<String>) {
        self.default_instance = instance.into();
    }

    /// Replace the selector part of every property's specificity, keeping
    /// each declaration index.
    pub fn set_specificity(&mut self, specificity: Specificity) {
        for attr in self.values.values_mut() {
            attr.specificity = specificity.with_index(attr.specificity.index);
        }
    }

    /// Copy entries of `other` that are missing here or more specific there.
    pub fn merge_missing(&mut self, other: &Properties) {
        for (key, attr) in &other.values {
            match self.values.get(key) {
                Some(existing) if existing.specificity >= attr.specificity => {}
                _ => {
                    self.values.insert(key.clone(), attr.clone());
                }
            }
        }
    }

    /// Smallest declaration index, or `usize::MAX` when empty.
    pub fn min_index(&self) -> usize {
        self.values
            .values()
            .map(|attr| attr.specificity.index)
            .min()
            .unwrap_or(usize::MAX)
    }

    /// Smallest declaration index of properties starting with `prefix`, per
    /// instance.
    pub fn min_prefix_pos(&self, prefix: &str) -> Vec<(String, usize)> {
        let mut by_instance: HashMap<&str, usize> = HashMap::new();
        for (key, attr) in &self.values {
            if key.name.starts_with(prefix) {
                let index = by_instance.entry(key.instance.as_str()).or_insert(usize::MAX);
                *index = (*index).min(attr.specificity.index);
            }
        }
        by_instance
            .into_iter()
            .map(|(instance, index)| (instance.to_string(), index))
            .collect()
    }

    /// Prefix/instance pairs present in these properties, ordered by their
    /// first declaration.
    ///
    /// Ties go to the longer prefix, so `polygon-pattern-` sorts before
    /// `polygon-` when both start at the same declaration.
    ///
    /// ```
    /// # use tilecss::style::Prefix;
    /// # use tilecss::parser::Decoder;
    /// let mut decoder = Decoder::new();
    /// decoder
    ///     .parse_str("#a { line-width: 2; top/line-width: 1; polygon-fill: red; }")
    ///     .unwrap();
    /// decoder.evaluate().unwrap();
    /// let rules = decoder.stylesheet().layer_rules("a", &[]);
    /// assert_eq!(
    ///     rules[0].properties.sorted_prefixes(&["line-", "polygon-"]),
    ///     vec![Prefix::new("line-", ""), Prefix::new("line-", "top"), Prefix::new("polygon-", "")],
    /// );
    /// ```
    pub fn sorted_prefixes(&self, prefixes: &[&str]) -> Vec<Prefix> {
        let mut found: Vec<(&str, String, usize)> = prefixes
            .iter()
            .flat_map(|&prefix| {
                self.min_prefix_pos(prefix)
                    .into_iter()
                    .map(move |(instance, index)| (prefix, instance, index))
            })
            .collect();
        found.sort_by(|a, b| {
            a.2.cmp(&b.2)
                .then_with(|| b.0.len().cmp(&a.0.len()))
                .then_with(|| a.1.cmp(&b.1))
        });
        found
            .into_iter()
            .map(|(name, instance, _)| Prefix::new(name, instance))
            .collect()
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name)?.as_bool()
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name)?.as_number()
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name)?.as_str()
    }

    pub fn get_color(&self, name: &str) -> Option<Color> {
        self.get(name)?.as_color()
    }

    /// A list of numbers; a single number is a list of one.
    pub fn get_float_list(&self, name: &str) -> Option<Vec<f64>> {
        match self.get(name)? {
            Value::Number(v) => Some(vec![*v]),
            Value::List(values) => values.iter().map(Value::as_number).collect(),
            _ => None,
        }
    }

    /// A list of strings; a single string is a list of one.
    pub fn get_string_list(&self, name: &str) -> Option<Vec<String>> {
        match self.get(name)? {
            Value::String(v) => Some(vec![v.clone()]),
            Value::List(values) => values
                .iter()
                .map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => None,
        }
    }

    /// Values that may mix fields and strings, e.g. `text-name`.
    ///
    /// A single string is read as a field reference.
    pub fn get_field_list(&self, name: &str) -> Option<Vec<Value>> {
        match self.get(name)? {
            Value::String(v) => Some(vec![Value::Field(Field(v.clone()))]),
            Value::List(values) => Some(values.clone()),
            other @ (Value::Field(_) | Value::FieldExpr(_)) => Some(vec![other.clone()]),
            _ => None,
        }
    }

    /// A list of color stops; a single stop is a list of one.
    pub fn get_stop_list(&self, name: &str) -> Option<Vec<Stop>> {
        match self.get(name)? {
            Value::Stop(stop) => Some(vec![*stop]),
            Value::List(values) => values
                .iter()
                .map(|v| match v {
                    Value::Stop(stop) => Some(*stop),
                    _ => None,
                })
                .collect(),
            _ => None,
        }
    }
}

/// All entries of `a`, plus those of `b` that are missing in `a` or more
/// specific in `b`.
pub fn combine_properties(a: &Properties, b: &Properties) -> Properties {
    let mut combined = Properties {
        values: a.values.clone(),
        default_instance: a.default_instance.clone(),
    };
    combined.merge_missing(b);
    combined
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a PropertyKey, &'a Attr);
    type IntoIter = btree_map::Iter<'a, PropertyKey, Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Properties{")?;
        for (i, (key, attr)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{key}: {}", attr.value)?;
        }
        f.write_str("}")
    }
}
