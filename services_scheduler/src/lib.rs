//! # Service Scheduler
//!
//! The per-node service lifecycle scheduler.
//!
//! ## Philosophy
//!
//! - **Cooperative**: One tick runs to completion before the next; no threads
//! - **Strict FIFO**: Only the head sequence is stepped, queue order is never changed
//! - **Single writer**: Only the scheduler touches ongoing-operation counters
//!   and restart histories
//! - **Explicit lifecycle**: `start` builds the context, `shutdown` tears it down
//!
//! ## Tick
//!
//! 1. Step the head of the sequence queue
//! 2. Retire it if it completed, releasing the services it selected
//! 3. Collect failure reports from the supervisor and health monitor
//! 4. Apply the restart policy to every report for an idle service
//! 5. Poll the request server: zero timeout after a busy tick, the idle
//!    timeout otherwise
//!
//! ## Example
//!
//! ```
//! use services_scheduler::{Scheduler, SchedulerConfig};
//! use sim_node::test_utils::{single_service_tree, system_filter};
//! use sim_node::SimNode;
//!
//! let (tree, _) = single_service_tree("db", system_filter()).unwrap();
//! let mut node = SimNode::new(tree);
//!
//! let mut scheduler = Scheduler::start(&SchedulerConfig::default(), &mut node.runtime()).unwrap();
//! while scheduler.context().pending_sequences() > 0 {
//!     scheduler.tick(&mut node.runtime());
//! }
//! scheduler.shutdown(&mut node.runtime());
//! ```

mod changes;
pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
mod requests;
mod restart;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use context::{SchedulerContext, SequenceQueue, TeardownCounts};
pub use error::SchedulerError;
pub use lifecycle::StopHandle;
pub use scheduler::{Scheduler, ShutdownReport, TickReport};
