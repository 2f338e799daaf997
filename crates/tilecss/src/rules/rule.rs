//! Resolved rules and selector relations between them.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::selector::{filters_equal, filters_overlap, filters_subset, Filter, ZoomRange};
use crate::style::{Properties, Specificity};

/// A selector with the complete set of properties that apply to it.
///
/// Rules are produced fresh by every query and never point back into the
/// stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rule {
    pub layer: Option<String>,
    pub attachment: Option<String>,
    pub class: Option<String>,
    /// Filters sorted by field.
    pub filters: Vec<Filter>,
    pub zoom: ZoomRange,
    pub properties: Properties,
    /// Collection order, later rules have higher values.
    pub(crate) order: usize,
}

fn matches_or_any(value: &Option<String>, other: &Option<String>) -> bool {
    other.is_none() || value == other
}

impl Rule {
    /// Selector specificity: layer, class and filter count (a zoom
    /// restriction counts as a filter).
    pub fn specificity(&self) -> Specificity {
        let zoom = u32::from(self.zoom != ZoomRange::ALL);
        Specificity::new(
            self.layer.is_some(),
            self.class.is_some(),
            self.filters.len() as u32 + zoom,
        )
    }

    /// Whether both rules have identical selectors.
    pub fn same(&self, other: &Rule) -> bool {
        self.class == other.class && self.same_except_class(other)
    }

    /// Like [`same`](Self::same), ignoring the class.
    pub fn same_except_class(&self, other: &Rule) -> bool {
        self.layer == other.layer
            && self.attachment == other.attachment
            && self.zoom == other.zoom
            && filters_equal(&self.filters, &other.filters)
    }

    /// Whether this rule refines `other`: same or narrower layer,
    /// attachment, class and zoom, and every filter of `other`.
    ///
    /// Filters are compared for equality only, so `[a>6]` is not treated as
    /// a refinement of `[a>5]`.
    pub fn child_of(&self, other: &Rule) -> bool {
        matches_or_any(&self.layer, &other.layer)
            && matches_or_any(&self.attachment, &other.attachment)
            && matches_or_any(&self.class, &other.class)
            && (self.zoom.combine(other.zoom) == self.zoom || other.zoom == ZoomRange::ALL)
            && filters_subset(&other.filters, &self.filters)
    }

    /// Whether both rules can match the same feature. Classes are ignored.
    pub fn overlaps(&self, other: &Rule) -> bool {
        matches_or_any(&self.layer, &other.layer)
            && matches_or_any(&self.attachment, &other.attachment)
            && (!self.zoom.combine(other.zoom).is_empty() || self.zoom == other.zoom)
            && filters_overlap(&other.filters, &self.filters)
    }

    /// Hash of the selector, without properties.
    pub(crate) fn selector_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.layer.hash(&mut hasher);
        self.attachment.hash(&mut hasher);
        self.class.hash(&mut hasher);
        self.zoom.hash(&mut hasher);
        self.filters.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Rule{")?;
        if let Some(layer) = &self.layer {
            write!(f, "#{layer}")?;
        }
        if let Some(attachment) = &self.attachment {
            write!(f, "::{attachment}")?;
        }
        if let Some(class) = &self.class {
            write!(f, ".{class}")?;
        }
        for filter in &self.filters {
            write!(f, "{filter}")?;
        }
        write!(f, " {} {}}}", self.zoom, self.properties)
    }
}
