//! # Leadflow Engine
//!
//! The explicit in-memory store and the command surface over it.
//!
//! ```text
//! command ─► mutate leads / jobs / tasks / reps
//!         ─► recompute scores + derived alerts (when leads, tasks or reps changed)
//!         ─► activity entry
//!         ─► caller renders from snapshot()
//! ```
//! Everything runs synchronously to completion. The optional
//! [`dispatch`] loop is the only async part; it shares the workspace
//! behind a `tokio::sync::Mutex`.

pub mod commands;
pub mod dispatch;
pub mod store;

pub use commands::{Clock, Workspace};
pub use dispatch::{DispatchReport, Dispatcher, spawn_dispatcher};
pub use store::{Snapshot, Store};
