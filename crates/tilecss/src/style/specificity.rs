//! Property specificity.

use std::fmt;

/// Precedence of a property value.
///
/// Compared lexicographically: a layer selector beats a class selector,
/// which beats any number of filters. `index` is the declaration index and
/// breaks ties in favour of later declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity {
    /// 1 if the rule names a layer.
    pub layer: u32,
    /// 1 if the rule names a class.
    pub class: u32,
    /// Number of filters, plus one for a zoom restriction.
    pub filters: u32,
    /// Declaration index.
    pub index: usize,
}

impl Specificity {
    /// Specificity of a selector, with index 0.
    pub fn new(layer: bool, class: bool, filters: u32) -> Self {
        Self {
            layer: u32::from(layer),
            class: u32::from(class),
            filters,
            index: 0,
        }
    }

    /// Declaration-only specificity.
    pub fn from_index(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})#{}", self.layer, self.class, self.filters, self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        let layer = Specificity::new(true, false, 0);
        let class = Specificity::new(false, true, 5);
        let filters = Specificity::new(false, false, 9);
        assert!(layer > class);
        assert!(class > filters);
        assert!(layer.with_index(2) > layer.with_index(1));
        assert!(Specificity::from_index(100) < filters);
    }

    #[test]
    fn display() {
        assert_eq!(Specificity::new(true, true, 2).with_index(7).to_string(), "(1,1,2)#7");
    }
}
