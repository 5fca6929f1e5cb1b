//! Append-only audit trail of state-changing actions, newest first.

use chrono::{DateTime, Utc};
use leadflow_core::{Activity, ActivityKind, IdGenerator};

#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<Activity>,
    ids: IdGenerator,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry and return it.
    pub fn record(
        &mut self,
        kind: ActivityKind,
        description: impl Into<String>,
        actor: &str,
        lead_ref: Option<&str>,
        now: DateTime<Utc>,
    ) -> &Activity {
        let entry = Activity {
            id: self.ids.next("act"),
            kind,
            description: description.into(),
            actor: actor.to_string(),
            timestamp: now,
            lead_ref: lead_ref.map(str::to_string),
        };
        tracing::debug!("📝 Activity [{:?}] {}", entry.kind, entry.description);
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &Activity> {
        self.entries.iter().rev()
    }

    /// Timeline for one lead, newest first.
    pub fn for_lead<'a>(&'a self, lead_id: &'a str) -> impl Iterator<Item = &'a Activity> + 'a {
        self.entries()
            .filter(move |a| a.lead_ref.as_deref() == Some(lead_id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
