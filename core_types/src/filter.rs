//! Role and group filters
//!
//! A [`Filter`] is a bitmask combining node-role bits (the low byte) with
//! service-group bits (the upper 24 bits). A filter *selects* a service when
//! the two share at least one role bit and at least one group bit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;
use thiserror::Error;

const ROLE_BITS: u32 = 0x0000_00FF;
const GROUP_SHIFT: u32 = 8;

/// Number of numbered user groups (`group1` ..= `group23`)
pub const USER_GROUP_COUNT: u8 = 23;

/// Role × group bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(u32);

impl Filter {
    /// Selects nothing
    pub const NONE: Filter = Filter(0);
    /// Services that only run on the node holding the master role
    pub const MASTER: Filter = Filter(1 << 0);
    /// Services that run on every node
    pub const ANY_NODE: Filter = Filter(1 << 1);
    /// Every role bit
    pub const ALL_ROLES: Filter = Filter(ROLE_BITS);
    /// The system group, always allowed at startup
    pub const SYSTEM: Filter = Filter(1 << GROUP_SHIFT);
    /// Every group bit
    pub const ALL_GROUPS: Filter = Filter(!ROLE_BITS);

    /// Creates a filter from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Returns the raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns the bit for numbered user group `index` (1-based)
    pub fn group(index: u8) -> Option<Filter> {
        if (1..=USER_GROUP_COUNT).contains(&index) {
            Some(Filter(1 << (GROUP_SHIFT + u32::from(index))))
        } else {
            None
        }
    }

    /// Returns the role bits only
    pub const fn roles(&self) -> Filter {
        Filter(self.0 & ROLE_BITS)
    }

    /// Returns the group bits only
    pub const fn groups(&self) -> Filter {
        Filter(self.0 & !ROLE_BITS)
    }

    /// Checks if no bit is set
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Checks if every bit of `other` is set in `self`
    pub const fn contains(&self, other: Filter) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks if `self` and `other` share any bit
    pub const fn intersects(&self, other: Filter) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `self` with every bit of `other` cleared
    pub const fn without(&self, other: Filter) -> Filter {
        Filter(self.0 & !other.0)
    }

    /// Checks if this filter selects a service whose own membership is `member`
    pub fn selects(&self, member: Filter) -> bool {
        self.roles().intersects(member.roles()) && self.groups().intersects(member.groups())
    }
}

impl BitOr for Filter {
    type Output = Filter;

    fn bitor(self, rhs: Filter) -> Filter {
        Filter(self.0 | rhs.0)
    }
}

impl BitOrAssign for Filter {
    fn bitor_assign(&mut self, rhs: Filter) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Filter {
    type Output = Filter;

    fn bitand(self, rhs: Filter) -> Filter {
        Filter(self.0 & rhs.0)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(Filter::MASTER) {
            names.push("master".to_string());
        }
        if self.contains(Filter::ANY_NODE) {
            names.push("any-node".to_string());
        }
        if self.contains(Filter::SYSTEM) {
            names.push("system".to_string());
        }
        for index in 1..=USER_GROUP_COUNT {
            if let Some(bit) = Filter::group(index) {
                if self.contains(bit) {
                    names.push(format!("group{}", index));
                }
            }
        }
        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

/// Error returned when a role or group name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown filter name: {0}")]
pub struct FilterParseError(pub String);

impl FromStr for Filter {
    type Err = FilterParseError;

    /// Parses a single role or group name
    ///
    /// Accepted names: `master`, `any-node` (or `any`), `system`, `group1` ..= `group23`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(Filter::MASTER),
            "any" | "any-node" => Ok(Filter::ANY_NODE),
            "system" => Ok(Filter::SYSTEM),
            other => other
                .strip_prefix("group")
                .and_then(|index| index.parse::<u8>().ok())
                .and_then(Filter::group)
                .ok_or_else(|| FilterParseError(other.to_string())),
        }
    }
}
