//! # Leadflow Scheduler
//!
//! Fans multi-step, multi-channel cadences out into individually
//! trackable outreach jobs.
//!
//! ## Architecture
//! ```text
//! CadenceCatalog ── steps (channel, delay, template)
//!        │
//! CampaignManager.start(campaign)
//!   ├── resolve audience once (snapshot)
//!   ├── for step in cadence, for lead in audience → JobScheduler.schedule
//!   └── campaign → active, success notification
//!
//! JobScheduler
//!   ├── pending ─run_now/claim─► sent
//!   ├── pending ─pause campaign─► paused
//!   └── sent ─delivery failed─► error
//! ```
//! Jobs never fire on their own here; execution is always an explicit call.

pub mod cadence;
pub mod campaign;
pub mod engine;
pub mod jobs;

pub use cadence::CadenceCatalog;
pub use campaign::{CampaignManager, PauseReport, StartReport, resolve_audience};
pub use engine::{JobScheduler, RunOutcome};
pub use jobs::JobStats;
