//! Zoom level sets.

use std::fmt;

use super::CompOp;

/// Set of zoom levels 0 through 30, one bit per level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoomRange(u32);

impl ZoomRange {
    /// Every zoom level.
    pub const ALL: Self = Self(0x7FFF_FFFF);
    /// No zoom level; constraints contradicted each other.
    pub const INVALID: Self = Self(0);
    /// Highest zoom level.
    pub const MAX_LEVEL: u8 = 30;

    /// Range of all levels satisfying `zoom <op> level`.
    pub fn new(op: CompOp, level: u8) -> Self {
        Self::ALL.add(op, level)
    }

    /// Range from a raw bitset; bits above level 30 are dropped.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// The raw bitset.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Intersect with the levels satisfying `zoom <op> level`.
    ///
    /// # Panics
    ///
    /// Panics for [`CompOp::Regex`] or a level above [`Self::MAX_LEVEL`];
    /// the parser rejects both.
    pub fn add(self, op: CompOp, level: u8) -> Self {
        assert!(level <= Self::MAX_LEVEL, "zoom level {level} out of range");
        let all = Self::ALL.0;
        let l = u32::from(level);
        let mask = match op {
            CompOp::Eq => 1 << l,
            CompOp::Neq => all & !(1 << l),
            CompOp::Lt => (1 << l) - 1,
            CompOp::Lte => (1 << (l + 1)) - 1,
            CompOp::Gt => all << (l + 1),
            CompOp::Gte => all << l,
            CompOp::Regex => panic!("regular expressions are not allowed for zoom levels"),
        };
        Self(self.0 & mask & all)
    }

    /// Intersection.
    pub fn combine(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Union.
    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `level` is in the set.
    pub fn valid_for(self, level: u8) -> bool {
        level <= Self::MAX_LEVEL && self.0 & (1 << level) != 0
    }

    /// Number of levels in the set.
    pub fn levels(self) -> u32 {
        self.0.count_ones()
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Lowest level, or 0 for an empty set.
    pub fn first(self) -> u8 {
        if self.0 == 0 {
            0
        } else {
            self.0.trailing_zeros() as u8
        }
    }

    /// Highest level, or 30 for an empty set.
    pub fn last(self) -> u8 {
        if self.0 == 0 {
            Self::MAX_LEVEL
        } else {
            (31 - self.0.leading_zeros()) as u8
        }
    }

    /// Express a contiguous range as a single comparison.
    ///
    /// Returns `None` for the full and empty sets and for ranges that need
    /// two bounds or have gaps.
    pub fn simplify(self) -> Option<(CompOp, u8)> {
        if self == Self::ALL || self == Self::INVALID {
            return None;
        }
        let (first, last) = (self.first(), self.last());
        if self.levels() != u32::from(last - first) + 1 {
            return None;
        }
        if first == last {
            Some((CompOp::Eq, first))
        } else if first == 0 {
            Some((CompOp::Lte, last))
        } else if last == Self::MAX_LEVEL {
            Some((CompOp::Gte, first))
        } else {
            None
        }
    }
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Display for ZoomRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ALL {
            return f.write_str("Zoom{*}");
        }
        if let Some((op, level)) = self.simplify() {
            return write!(f, "Zoom{{{op}{level}}}");
        }
        let levels: Vec<String> = (0..=Self::MAX_LEVEL)
            .filter(|&l| self.valid_for(l))
            .map(|l| l.to_string())
            .collect();
        write!(f, "Zoom{{{}}}", levels.join(" "))
    }
}
