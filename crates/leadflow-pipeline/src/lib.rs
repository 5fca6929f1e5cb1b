//! # Leadflow Pipeline
//!
//! Everything that reacts to lead state:
//! scoring, stage transitions, derived and ad-hoc notifications,
//! the activity trail, and the channel action executor.

pub mod activity;
pub mod notify;
pub mod outreach;
pub mod rules;
pub mod scoring;
pub mod stage;

pub use activity::ActivityLog;
pub use notify::{DerivedAlerts, NotificationCenter, RecentNotifications};
pub use outreach::{ChannelActionExecutor, Composed, OutreachContext, compose};
pub use rules::{NotificationDeriver, RepPipeline, pipeline_by_rep, pipeline_value};
pub use scoring::{ScoreBreakdown, compute_score};
pub use stage::{LossOutcome, MoveOutcome, PendingLoss, PipelineStateMachine};
