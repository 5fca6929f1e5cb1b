//! Job scheduler: owns the job queue.
//!
//! Jobs are kept newest first and never removed. `status` is the only
//! field that changes, and every transition out of `pending` goes
//! through [`JobScheduler::claim`], a compare-and-swap that succeeds at
//! most once per job id. A claimed job is executed (or flagged as
//! failed) at most once as well; executions are tracked per job id.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use leadflow_core::{
    IdGenerator, Job, JobSpec, JobStatus, Lead, LeadflowError, NotificationKind, Result,
};
use leadflow_pipeline::{ChannelActionExecutor, NotificationCenter, OutreachContext};
use serde::Serialize;

use crate::jobs::{self, JobStats};

/// Result of a manual run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunOutcome {
    Executed { job_id: String, interaction_id: String },
    /// The job already left `pending`; nothing was sent.
    NotPending { job_id: String, status: JobStatus },
}

#[derive(Debug, Default)]
pub struct JobScheduler {
    jobs: Vec<Job>,
    /// Jobs whose outreach has been recorded.
    executed: HashSet<String>,
    ids: IdGenerator,
}

impl JobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job and announce it.
    pub fn schedule(
        &mut self,
        spec: JobSpec,
        lead_name: &str,
        notifications: &mut NotificationCenter,
        now: DateTime<Utc>,
    ) -> Job {
        let job = jobs::job_from_spec(self.ids.next("job"), spec);
        tracing::info!(
            "📅 Job scheduled: {} → '{}' via {} at {}",
            job.id,
            lead_name,
            job.channel,
            job.scheduled_at
        );
        notifications.notify(
            NotificationKind::Info,
            "Job scheduled",
            &format!(
                "{} outreach to {lead_name} scheduled for {}",
                job.channel,
                job.scheduled_at.format("%Y-%m-%d %H:%M UTC")
            ),
            Some(job.lead_ref.as_str()),
            now,
        );
        self.jobs.insert(0, job.clone());
        job
    }

    /// All jobs, newest first.
    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn get(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn for_campaign<'a>(&'a self, campaign_id: &'a str) -> impl Iterator<Item = &'a Job> + 'a {
        self.jobs
            .iter()
            .filter(move |j| j.campaign_ref.as_deref() == Some(campaign_id))
    }

    /// Ids of pending jobs whose scheduled time has passed, oldest first.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<String> {
        self.jobs
            .iter()
            .rev()
            .filter(|j| jobs::is_due(j, now))
            .map(|j| j.id.clone())
            .collect()
    }

    /// Atomically move a job from `pending` to `sent`.
    ///
    /// Returns the claimed job, or `None` if it was not pending.
    pub fn claim(&mut self, id: &str) -> Result<Option<Job>> {
        let job = self
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| LeadflowError::not_found("job", id))?;
        if job.status != JobStatus::Pending {
            return Ok(None);
        }
        job.status = JobStatus::Sent;
        Ok(Some(job.clone()))
    }

    /// Execute a pending job immediately through the channel action executor.
    pub fn run_now(
        &mut self,
        id: &str,
        leads: &mut [Lead],
        executor: &ChannelActionExecutor,
        ctx: OutreachContext<'_>,
    ) -> Result<RunOutcome> {
        let job = self
            .get(id)
            .ok_or_else(|| LeadflowError::not_found("job", id))?;
        if job.status != JobStatus::Pending {
            tracing::debug!("⏭️ Job {id} is {}, not re-sending", job.status);
            return Ok(RunOutcome::NotPending {
                job_id: id.to_string(),
                status: job.status,
            });
        }
        let lead_idx = leads
            .iter()
            .position(|l| l.id == job.lead_ref)
            .ok_or_else(|| LeadflowError::not_found("lead", job.lead_ref.clone()))?;

        let Some(job) = self.claim(id)? else {
            return Ok(RunOutcome::NotPending {
                job_id: id.to_string(),
                status: JobStatus::Sent,
            });
        };
        self.executed.insert(job.id.clone());
        let interaction = executor.execute(&mut leads[lead_idx], job.channel, job.kind, ctx);
        Ok(RunOutcome::Executed {
            job_id: job.id,
            interaction_id: interaction.id,
        })
    }

    /// Reserve the single execution of a claimed job.
    ///
    /// Fails unless the job is `sent` and nothing has been recorded for it yet.
    pub fn record_execution(&mut self, id: &str) -> Result<Job> {
        let job = self
            .get(id)
            .ok_or_else(|| LeadflowError::not_found("job", id))?;
        if job.status != JobStatus::Sent {
            return Err(LeadflowError::State(format!(
                "job {id} is {}, expected sent",
                job.status
            )));
        }
        let job = job.clone();
        if !self.executed.insert(job.id.clone()) {
            return Err(LeadflowError::State(format!("job {id} was already executed")));
        }
        Ok(job)
    }

    pub fn is_executed(&self, id: &str) -> bool {
        self.executed.contains(id)
    }

    /// Flag a claimed job whose delivery failed. Only claimed, unrecorded
    /// jobs can fail.
    pub fn mark_error(&mut self, id: &str) -> Result<()> {
        let executed = self.executed.contains(id);
        let job = self
            .jobs
            .iter_mut()
            .find(|j| j.id == id)
            .ok_or_else(|| LeadflowError::not_found("job", id))?;
        if job.status != JobStatus::Sent || executed {
            return Err(LeadflowError::State(format!(
                "job {id} is {}{}, only claimed jobs can fail",
                job.status,
                if executed { " and executed" } else { "" }
            )));
        }
        tracing::warn!("⚠️ Job {} marked as error", job.id);
        job.status = JobStatus::Error;
        Ok(())
    }

    /// Move every still-pending job of a campaign to `paused`.
    pub fn pause_campaign_jobs(&mut self, campaign_id: &str) -> usize {
        let mut paused = 0;
        for job in self.jobs.iter_mut() {
            if job.campaign_ref.as_deref() == Some(campaign_id) && job.status == JobStatus::Pending {
                job.status = JobStatus::Paused;
                paused += 1;
            }
        }
        paused
    }

    pub fn stats(&self) -> JobStats {
        JobStats::collect(&self.jobs)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use leadflow_core::{Channel, Interaction, JobKind, LeadDraft};
    use leadflow_pipeline::ActivityLog;

    struct Fixture {
        scheduler: JobScheduler,
        leads: Vec<Lead>,
        interactions: Vec<Interaction>,
        notifications: NotificationCenter,
        activities: ActivityLog,
        executor: ChannelActionExecutor,
    }

    impl Fixture {
        fn new() -> Self {
            let lead = Lead::from_draft("l1".into(), LeadDraft::new("Ana", "Acme"), Utc::now());
            Self {
                scheduler: JobScheduler::new(),
                leads: vec![lead],
                interactions: Vec::new(),
                notifications: NotificationCenter::new(10, 5),
                activities: ActivityLog::new(),
                executor: ChannelActionExecutor::new(),
            }
        }

        fn schedule(&mut self, at: DateTime<Utc>) -> Job {
            let spec = JobSpec {
                lead_ref: "l1".into(),
                channel: Channel::Whatsapp,
                kind: JobKind::DirectContact,
                scheduled_at: at,
                template_ref: Some("tpl-hello".into()),
                campaign_ref: Some("c1".into()),
            };
            self.scheduler.schedule(spec, "Ana", &mut self.notifications, Utc::now())
        }

        fn run(&mut self, id: &str) -> Result<RunOutcome> {
            let ctx = OutreachContext {
                interactions: &mut self.interactions,
                notifications: &mut self.notifications,
                activities: &mut self.activities,
                actor: "ana",
                now: Utc::now(),
            };
            self.scheduler.run_now(id, &mut self.leads, &self.executor, ctx)
        }
    }

    #[test]
    fn test_schedule_prepends_and_notifies() {
        let mut f = Fixture::new();
        let a = f.schedule(Utc::now());
        let b = f.schedule(Utc::now());
        assert_ne!(a.id, b.id);
        assert_eq!(f.scheduler.jobs()[0].id, b.id);
        assert_eq!(a.status, JobStatus::Pending);
        let n = f.notifications.recent.iter().next().unwrap();
        assert_eq!(n.kind, NotificationKind::Info);
        assert!(n.message.contains("whatsapp outreach to Ana"));
    }

    #[test]
    fn test_run_twice_sends_once() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now() + Duration::days(3));

        let first = f.run(&job.id).unwrap();
        assert!(matches!(first, RunOutcome::Executed { .. }));
        let second = f.run(&job.id).unwrap();
        assert_eq!(
            second,
            RunOutcome::NotPending { job_id: job.id.clone(), status: JobStatus::Sent }
        );
        assert_eq!(f.interactions.len(), 1);
        assert_eq!(f.scheduler.get(&job.id).unwrap().status, JobStatus::Sent);
    }

    #[test]
    fn test_run_unknown_job() {
        let mut f = Fixture::new();
        let err = f.run("job-missing").unwrap_err();
        assert!(err.is_not_found());
        assert!(f.interactions.is_empty());
    }

    #[test]
    fn test_run_with_unknown_lead_leaves_job_pending() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now());
        f.leads.clear();
        assert!(f.run(&job.id).unwrap_err().is_not_found());
        assert_eq!(f.scheduler.get(&job.id).unwrap().status, JobStatus::Pending);
    }

    #[test]
    fn test_claim_is_at_most_once() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now());
        assert!(f.scheduler.claim(&job.id).unwrap().is_some());
        assert!(f.scheduler.claim(&job.id).unwrap().is_none());
        assert!(matches!(f.run(&job.id).unwrap(), RunOutcome::NotPending { .. }));
        assert!(f.interactions.is_empty());
    }

    #[test]
    fn test_due_and_pause() {
        let mut f = Fixture::new();
        let now = Utc::now();
        let past = f.schedule(now - Duration::hours(1));
        let future = f.schedule(now + Duration::days(1));
        assert_eq!(f.scheduler.due(now), vec![past.id.clone()]);

        assert_eq!(f.scheduler.pause_campaign_jobs("c1"), 2);
        assert!(f.scheduler.due(now + Duration::days(2)).is_empty());
        assert_eq!(f.scheduler.get(&future.id).unwrap().status, JobStatus::Paused);
        assert_eq!(f.scheduler.stats().paused, 2);
    }

    #[test]
    fn test_mark_error() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now());
        assert!(matches!(f.scheduler.mark_error(&job.id), Err(LeadflowError::State(_))));
        assert_eq!(f.scheduler.get(&job.id).unwrap().status, JobStatus::Pending);

        f.scheduler.claim(&job.id).unwrap();
        f.scheduler.mark_error(&job.id).unwrap();
        assert_eq!(f.scheduler.get(&job.id).unwrap().status, JobStatus::Error);
        assert!(f.scheduler.mark_error(&job.id).is_err());
        assert!(f.scheduler.mark_error("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_executed_job_cannot_fail_or_rerecord() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now());
        f.run(&job.id).unwrap();
        assert!(f.scheduler.is_executed(&job.id));
        assert!(matches!(f.scheduler.mark_error(&job.id), Err(LeadflowError::State(_))));
        assert!(matches!(f.scheduler.record_execution(&job.id), Err(LeadflowError::State(_))));
        assert_eq!(f.scheduler.get(&job.id).unwrap().status, JobStatus::Sent);
    }

    #[test]
    fn test_record_execution_once_per_claim() {
        let mut f = Fixture::new();
        let job = f.schedule(Utc::now());
        assert!(f.scheduler.record_execution(&job.id).is_err());
        f.scheduler.claim(&job.id).unwrap();
        assert_eq!(f.scheduler.record_execution(&job.id).unwrap().id, job.id);
        assert!(f.scheduler.record_execution(&job.id).is_err());
    }

    #[test]
    fn test_run_paused_or_failed_job_is_noop() {
        let mut f = Fixture::new();
        let paused = f.schedule(Utc::now());
        f.scheduler.pause_campaign_jobs("c1");
        let failed = f.schedule(Utc::now());
        f.scheduler.claim(&failed.id).unwrap();
        f.scheduler.mark_error(&failed.id).unwrap();

        assert_eq!(
            f.run(&paused.id).unwrap(),
            RunOutcome::NotPending { job_id: paused.id.clone(), status: JobStatus::Paused }
        );
        assert_eq!(
            f.run(&failed.id).unwrap(),
            RunOutcome::NotPending { job_id: failed.id.clone(), status: JobStatus::Error }
        );
        assert!(f.interactions.is_empty());
        assert!(!f.scheduler.is_executed(&paused.id));
    }
}
