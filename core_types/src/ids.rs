//! Identifiers for services and sequences
//!
//! Both are random v4 UUIDs. The `Display` form carries a short prefix so log
//! lines read `svc:<uuid>` or `seq:<uuid>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! impl_uuid_id {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Generates a fresh identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

/// A node of the service tree, structural or managed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Uuid);

/// One sequence, from the factory that builds it to its retirement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceId(Uuid);

impl_uuid_id!(ServiceId, "svc");
impl_uuid_id!(SequenceId, "seq");
