//! Notification deriver: rule evaluation over the current snapshot.
//!
//! ```text
//! leads ─┬─ inactive > N days ───────────────► warning
//! tasks ─┼─ not completed ───────────────────► info
//! reps  ─┴─ active, pipeline < ratio × target ► error
//! ```
//! Output is a pure function of its inputs: ids are derived from the
//! entity they describe and `created_at` is the recompute time.

use chrono::{DateTime, Utc};
use leadflow_core::{Lead, Notification, NotificationKind, SalesRep, Task};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct NotificationDeriver {
    inactivity_days: u32,
    rep_risk_ratio: f64,
}

impl NotificationDeriver {
    pub fn new(inactivity_days: u32, rep_risk_ratio: f64) -> Self {
        Self {
            inactivity_days,
            rep_risk_ratio,
        }
    }

    /// Build the full derived alert set.
    pub fn derive(
        &self,
        leads: &[Lead],
        tasks: &[Task],
        reps: &[SalesRep],
        now: DateTime<Utc>,
    ) -> Vec<Notification> {
        let mut alerts = Vec::new();
        alerts.extend(leads.iter().filter_map(|l| self.inactive_lead(l, now)));
        alerts.extend(tasks.iter().filter_map(|t| self.pending_task(t, leads, now)));
        alerts.extend(reps.iter().filter_map(|r| self.rep_at_risk(r, leads, now)));
        alerts
    }

    fn inactive_lead(&self, lead: &Lead, now: DateTime<Utc>) -> Option<Notification> {
        let days = lead.days_inactive.filter(|d| *d > self.inactivity_days)?;
        Some(Notification {
            id: format!("alert-inactive-{}", lead.id),
            kind: NotificationKind::Warning,
            title: "Inactive client".into(),
            message: format!("Client {} inactive for {days} days", lead.name),
            created_at: now,
            read: false,
            lead_ref: Some(lead.id.clone()),
        })
    }

    fn pending_task(&self, task: &Task, leads: &[Lead], now: DateTime<Utc>) -> Option<Notification> {
        if task.completed {
            return None;
        }
        let lead = task
            .lead_ref
            .as_deref()
            .and_then(|id| leads.iter().find(|l| l.id == id));
        let mut message = if task.description.is_empty() {
            task.title.clone()
        } else {
            task.description.clone()
        };
        if let Some(lead) = lead {
            message.push_str(&format!(" ({})", lead.name));
        }
        Some(Notification {
            id: format!("alert-task-{}", task.id),
            kind: NotificationKind::Info,
            title: format!("Pending task: {}", task.title),
            message,
            created_at: now,
            read: false,
            lead_ref: task.lead_ref.clone(),
        })
    }

    fn rep_at_risk(&self, rep: &SalesRep, leads: &[Lead], now: DateTime<Utc>) -> Option<Notification> {
        if !rep.active {
            return None;
        }
        let value = pipeline_value(&rep.id, leads);
        if value >= self.rep_risk_ratio * rep.targets.sales_target {
            return None;
        }
        Some(Notification {
            id: format!("alert-rep-{}", rep.id),
            kind: NotificationKind::Error,
            title: "Rep at risk".into(),
            message: format!(
                "Rep {} below {:.0}% of sales target ({value:.2} of {:.2})",
                rep.name,
                self.rep_risk_ratio * 100.0,
                rep.targets.sales_target
            ),
            created_at: now,
            read: false,
            lead_ref: None,
        })
    }
}

/// Summed estimated value of every lead assigned to `rep_id`.
pub fn pipeline_value(rep_id: &str, leads: &[Lead]) -> f64 {
    leads
        .iter()
        .filter(|l| l.rep_ref.as_deref() == Some(rep_id))
        .filter_map(|l| l.estimated_value)
        .sum()
}

/// Pipeline rollup for one rep.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepPipeline {
    pub rep_id: String,
    pub rep_name: String,
    pub leads: usize,
    pub value: f64,
    /// `value / sales_target`, or 0 when no target is set.
    pub target_share: f64,
}

pub fn pipeline_by_rep(reps: &[SalesRep], leads: &[Lead]) -> Vec<RepPipeline> {
    reps.iter()
        .map(|rep| {
            let value = pipeline_value(&rep.id, leads);
            let target = rep.targets.sales_target;
            RepPipeline {
                rep_id: rep.id.clone(),
                rep_name: rep.name.clone(),
                leads: leads
                    .iter()
                    .filter(|l| l.rep_ref.as_deref() == Some(rep.id.as_str()))
                    .count(),
                value,
                target_share: if target > 0.0 { value / target } else { 0.0 },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::{LeadDraft, RepTargets};

    fn rep(id: &str, target: f64, active: bool) -> SalesRep {
        SalesRep {
            id: id.into(),
            name: format!("Rep {id}"),
            targets: RepTargets {
                sales_target: target,
                lead_target: 10,
                conversion_target_pct: 20.0,
            },
            active,
        }
    }

    fn lead(id: &str, draft: LeadDraft) -> Lead {
        Lead::from_draft(id.into(), draft, Utc::now())
    }

    fn task(id: &str, lead_ref: Option<&str>, completed: bool) -> Task {
        Task {
            id: id.into(),
            title: "Call back".into(),
            description: "Follow up on quote".into(),
            lead_ref: lead_ref.map(str::to_string),
            due_at: None,
            completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_inactivity_threshold_is_strict() {
        let d = NotificationDeriver::new(10, 0.5);
        let leads = vec![
            lead("l1", LeadDraft::new("Ana", "Acme").inactive_for(10)),
            lead("l2", LeadDraft::new("Bo", "Beta").inactive_for(11)),
            lead("l3", LeadDraft::new("Cy", "Gamma")),
        ];
        let alerts = d.derive(&leads, &[], &[], Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, NotificationKind::Warning);
        assert_eq!(alerts[0].message, "Client Bo inactive for 11 days");
    }

    #[test]
    fn test_pending_tasks_only() {
        let d = NotificationDeriver::new(10, 0.5);
        let leads = vec![lead("l1", LeadDraft::new("Ana", "Acme"))];
        let tasks = vec![task("t1", Some("l1"), false), task("t2", None, true)];
        let alerts = d.derive(&leads, &tasks, &[], Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, NotificationKind::Info);
        assert_eq!(alerts[0].message, "Follow up on quote (Ana)");
        assert_eq!(alerts[0].lead_ref.as_deref(), Some("l1"));
    }

    #[test]
    fn test_rep_at_risk() {
        let d = NotificationDeriver::new(10, 0.5);
        let leads = vec![
            lead("l1", LeadDraft::new("Ana", "Acme").value(30_000.0).rep("r1")),
            lead("l2", LeadDraft::new("Bo", "Beta").value(60_000.0).rep("r2")),
        ];
        let reps = vec![rep("r1", 100_000.0, true), rep("r2", 100_000.0, true), rep("r3", 100_000.0, false)];
        let alerts = d.derive(&leads, &[], &reps, Utc::now());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, NotificationKind::Error);
        assert!(alerts[0].message.starts_with("Rep Rep r1 below 50% of sales target"));
    }

    #[test]
    fn test_recompute_is_deterministic() {
        let d = NotificationDeriver::new(10, 0.5);
        let leads = vec![lead("l1", LeadDraft::new("Ana", "Acme").inactive_for(20).rep("r1"))];
        let tasks = vec![task("t1", None, false)];
        let reps = vec![rep("r1", 1_000.0, true)];
        let now = Utc::now();
        let first = d.derive(&leads, &tasks, &reps, now);
        let second = d.derive(&leads, &tasks, &reps, now);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_recompute_content_is_clock_independent() {
        let d = NotificationDeriver::new(10, 0.5);
        let leads = vec![lead("l1", LeadDraft::new("Ana", "Acme").inactive_for(20).rep("r1"))];
        let tasks = vec![task("t1", Some("l1"), false)];
        let reps = vec![rep("r1", 1_000.0, true)];
        let now = Utc::now();
        let content = |alerts: Vec<Notification>| {
            alerts
                .into_iter()
                .map(|n| (n.id, n.kind, n.title, n.message, n.lead_ref))
                .collect::<Vec<_>>()
        };
        let earlier = d.derive(&leads, &tasks, &reps, now);
        let later = d.derive(&leads, &tasks, &reps, now + chrono::Duration::hours(1));
        assert_ne!(earlier, later);
        assert_eq!(content(earlier), content(later));
    }

    #[test]
    fn test_pipeline_by_rep() {
        let leads = vec![
            lead("l1", LeadDraft::new("Ana", "Acme").value(30_000.0).rep("r1")),
            lead("l2", LeadDraft::new("Bo", "Beta").value(20_000.0).rep("r1")),
            lead("l3", LeadDraft::new("Cy", "Gamma").rep("r1")),
        ];
        let rollup = pipeline_by_rep(&[rep("r1", 100_000.0, true), rep("r2", 0.0, true)], &leads);
        assert_eq!(rollup[0].leads, 3);
        assert_eq!(rollup[0].value, 50_000.0);
        assert_eq!(rollup[0].target_share, 0.5);
        assert_eq!(rollup[1].leads, 0);
        assert_eq!(rollup[1].target_share, 0.0);
    }
}
