//! Selectors: layer, class, attachment, attribute filters and zoom range.

mod filter;
mod zoom;

use std::fmt;

pub use filter::{
    filters_equal, filters_overlap, filters_subset, merge_filter, merge_filters, CompOp, Filter,
    FilterValue,
};
pub use zoom::ZoomRange;

/// One selector of a rule block, e.g. `#roads::casing.major[type='motorway'][zoom>=10]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// `#layer`
    pub layer: Option<String>,
    /// `.class`
    pub class: Option<String>,
    /// `::attachment`
    pub attachment: Option<String>,
    /// Zoom constraints folded into a level set.
    pub zoom: ZoomRange,
    /// Attribute filters, sorted by field.
    pub filters: Vec<Filter>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selector matching a single layer.
    pub fn layer(name: impl Into<String>) -> Self {
        Self {
            layer: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self.sort_filters();
        self
    }

    pub fn with_zoom(mut self, op: CompOp, level: u8) -> Self {
        self.zoom = self.zoom.add(op, level);
        self
    }

    /// Sort filters by field name, keeping declaration order within a field.
    pub fn sort_filters(&mut self) {
        self.filters.sort_by(|a, b| a.field.cmp(&b.field));
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
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
        if self.zoom != ZoomRange::ALL {
            write!(f, "{}", self.zoom)?;
        }
        Ok(())
    }
}
