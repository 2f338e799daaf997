//! The parsed block tree.

use super::{Position, Properties, PropertyKey};
use crate::expr::Expression;
use crate::selector::Selector;

/// A property assignment as written, e.g. `top/line-width: @w * 2`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub key: PropertyKey,
    pub expr: Expression,
    /// Position of the property name; `index` is the declaration index.
    pub position: Position,
}

/// A selector scope with its declarations and nested blocks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    /// Comma-separated selectors sharing this block. Empty for scopes that
    /// add no constraints.
    pub selectors: Vec<Selector>,
    /// Declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Evaluated declarations, filled in by `Decoder::evaluate`.
    pub properties: Option<Properties>,
    pub blocks: Vec<Block>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selectors(selectors: Vec<Selector>) -> Self {
        Self {
            selectors,
            ..Self::default()
        }
    }

    /// Whether evaluation produced at least one property.
    pub fn has_properties(&self) -> bool {
        self.properties.as_ref().is_some_and(|p| !p.is_empty())
    }

    /// This block and all nested blocks, parents before children.
    pub fn walk(&self) -> Vec<&Block> {
        fn visit<'a>(block: &'a Block, out: &mut Vec<&'a Block>) {
            out.push(block);
            for child in &block.blocks {
                visit(child, out);
            }
        }

        let mut out = Vec::new();
        visit(self, &mut out);
        out
    }
}

/// A parsed stylesheet: the block tree and the `Map {}` block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    pub(crate) root: Block,
    pub(crate) map: Block,
}

impl Stylesheet {
    /// Top-level scope; its children are the stylesheet's rule blocks.
    pub fn root(&self) -> &Block {
        &self.root
    }

    /// The merged `Map {}` blocks.
    pub fn map_block(&self) -> &Block {
        &self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_is_pre_order() {
        let leaf = |layer: &str| Block::with_selectors(vec![Selector::layer(layer)]);
        let mut a = leaf("a");
        a.blocks.push(leaf("a1"));
        a.blocks.push(leaf("a2"));
        let mut root = Block::new();
        root.blocks.push(a);
        root.blocks.push(leaf("b"));

        let layers: Vec<_> = root
            .walk()
            .iter()
            .filter_map(|b| b.selectors.first())
            .filter_map(|s| s.layer.as_deref())
            .collect();
        assert_eq!(layers, ["a", "a1", "a2", "b"]);
    }
}
