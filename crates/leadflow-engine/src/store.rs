//! Canonical collections and read-only snapshots.

use chrono::{DateTime, Utc};
use leadflow_core::{
    Activity, Cadence, Campaign, Interaction, Job, Lead, Notification, SalesRep, Task,
};
use leadflow_pipeline::{PendingLoss, RepPipeline};
use leadflow_scheduler::JobStats;
use serde::Serialize;

/// Entities owned by the workspace. Only commands mutate them.
#[derive(Debug, Default)]
pub struct Store {
    pub leads: Vec<Lead>,
    pub interactions: Vec<Interaction>,
    pub tasks: Vec<Task>,
    pub reps: Vec<SalesRep>,
}

impl Store {
    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.leads.iter().find(|l| l.id == id)
    }

    pub fn lead_index(&self, id: &str) -> Option<usize> {
        self.leads.iter().position(|l| l.id == id)
    }

    pub fn rep(&self, id: &str) -> Option<&SalesRep> {
        self.reps.iter().find(|r| r.id == id)
    }

    /// Interactions for one lead, oldest first.
    pub fn interactions_for<'a>(&'a self, lead_id: &'a str) -> impl Iterator<Item = &'a Interaction> + 'a {
        self.interactions.iter().filter(move |i| i.lead_ref == lead_id)
    }
}

/// Owned copy of every collection, for rendering or export.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub taken_at: DateTime<Utc>,
    pub leads: Vec<Lead>,
    pub interactions: Vec<Interaction>,
    pub tasks: Vec<Task>,
    pub reps: Vec<SalesRep>,
    pub cadences: Vec<Cadence>,
    pub campaigns: Vec<Campaign>,
    /// Newest first.
    pub jobs: Vec<Job>,
    pub job_stats: JobStats,
    /// Ad-hoc (newest first) then derived.
    pub notifications: Vec<Notification>,
    /// Newest first.
    pub activities: Vec<Activity>,
    pub pending_loss: Option<PendingLoss>,
    pub pipeline_by_rep: Vec<RepPipeline>,
}
