//! Query feature flags.
//!
//! Every description reports which query constructs it uses so callers can
//! reject queries that rely on constructs disabled by configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryFeatures(u32);

impl QueryFeatures {
    pub const NONE: Self = Self(0);
    pub const PROPERTY: Self = Self(1);
    pub const CATEGORY: Self = Self(2);
    pub const CONCEPT: Self = Self(4);
    pub const NAMESPACE: Self = Self(8);
    pub const CONJUNCTION: Self = Self(16);
    pub const DISJUNCTION: Self = Self(32);
    pub const ALL: Self = Self(63);

    const NAMES: [(QueryFeatures, &'static str); 6] = [
        (Self::PROPERTY, "property"),
        (Self::CATEGORY, "category"),
        (Self::CONCEPT, "concept"),
        (Self::NAMESPACE, "namespace"),
        (Self::CONJUNCTION, "conjunction"),
        (Self::DISJUNCTION, "disjunction"),
    ];

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Features in `self` that are not in `allowed`.
    pub const fn missing_from(self, allowed: Self) -> Self {
        Self(self.0 & !allowed.0)
    }

    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for QueryFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for QueryFeatures {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for QueryFeatures {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for QueryFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.names().join(", "))
    }
}
