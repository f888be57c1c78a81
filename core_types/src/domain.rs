//! Tree relations covered by an operation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which relation of the service tree an operation applies to
///
/// The domain is always interpreted relative to a scope node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    /// Only the scope node itself
    ThisNode,
    /// The direct children of the scope node
    Children,
    /// The scope node and every descendant
    Subtree,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::ThisNode => write!(f, "this-node"),
            Domain::Children => write!(f, "children"),
            Domain::Subtree => write!(f, "subtree"),
        }
    }
}

/// Visiting order for a tree walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WalkOrder {
    /// Parents before children
    #[default]
    Normal,
    /// Children before parents (used when stopping)
    BottomUp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_display() {
        assert_eq!(Domain::ThisNode.to_string(), "this-node");
        assert_eq!(Domain::Children.to_string(), "children");
        assert_eq!(Domain::Subtree.to_string(), "subtree");
    }

    #[test]
    fn test_default_walk_order_is_normal() {
        assert_eq!(WalkOrder::default(), WalkOrder::Normal);
    }
}
