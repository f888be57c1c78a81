//! # Core Types
//!
//! This crate defines the fundamental types shared by every Cairn crate.
//!
//! ## Philosophy
//!
//! Core types are designed with these principles:
//! - **Explicit over implicit**: Filters, domains and states are typed, never raw integers.
//! - **Type safety first**: A role bit cannot be confused with a group bit.
//! - **Virtual time**: Timestamps are opaque so simulation and hardware share one code path.
//!
//! ## Key Types
//!
//! - [`ServiceId`]: Unique identifier for a node of the service tree
//! - [`SequenceId`]: Unique identifier for a unit of orchestration work
//! - [`Filter`]: Role × group bitmask selecting participating services
//! - [`Domain`]: Which relation of the tree an operation covers
//! - [`ServiceState`]: Lifecycle state a service can be driven to
//! - [`Instant`] / [`Duration`]: Virtual time

pub mod domain;
pub mod filter;
pub mod ids;
pub mod state;
pub mod time;

pub use domain::{Domain, WalkOrder};
pub use filter::{Filter, FilterParseError};
pub use ids::{SequenceId, ServiceId};
pub use state::ServiceState;
pub use time::{Duration, Instant};
