//! Block tree, properties and specificity.

mod block;
mod position;
mod properties;
mod specificity;
mod validate;

pub use block::{Block, Declaration, Stylesheet};
pub use position::Position;
pub use properties::{combine_properties, Attr, Prefix, Properties, PropertyKey};
pub use specificity::Specificity;
pub use validate::{validate_property, Validity};
