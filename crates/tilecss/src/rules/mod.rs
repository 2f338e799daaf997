//! Resolved rules and the cascade that produces them.

mod cascade;
mod rule;

pub use cascade::rules_zoom;
pub use rule::Rule;
