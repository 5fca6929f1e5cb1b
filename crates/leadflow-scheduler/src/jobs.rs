//! Job helpers for construction, due checks and statistics.

use chrono::{DateTime, Utc};
use leadflow_core::{Job, JobSpec, JobStatus};
use serde::Serialize;

/// Create a pending job from a scheduling request.
pub fn job_from_spec(id: String, spec: JobSpec) -> Job {
    Job {
        id,
        lead_ref: spec.lead_ref,
        channel: spec.channel,
        kind: spec.kind,
        status: JobStatus::Pending,
        scheduled_at: spec.scheduled_at,
        template_ref: spec.template_ref,
        campaign_ref: spec.campaign_ref,
    }
}

/// Pending and past its scheduled time.
pub fn is_due(job: &Job, now: DateTime<Utc>) -> bool {
    job.status == JobStatus::Pending && job.scheduled_at <= now
}

/// Job counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub pending: usize,
    pub sent: usize,
    pub paused: usize,
    pub error: usize,
}

impl JobStats {
    pub fn collect<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Self {
        let mut stats = Self::default();
        for job in jobs {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Sent => stats.sent += 1,
                JobStatus::Paused => stats.paused += 1,
                JobStatus::Error => stats.error += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.pending + self.sent + self.paused + self.error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use leadflow_core::{Channel, JobKind};

    fn spec(at: DateTime<Utc>) -> JobSpec {
        JobSpec {
            lead_ref: "l1".into(),
            channel: Channel::Email,
            kind: JobKind::DirectContact,
            scheduled_at: at,
            template_ref: None,
            campaign_ref: None,
        }
    }

    #[test]
    fn test_due() {
        let now = Utc::now();
        let mut job = job_from_spec("job-1".into(), spec(now - Duration::minutes(1)));
        assert!(is_due(&job, now));
        job.status = JobStatus::Sent;
        assert!(!is_due(&job, now));
        let later = job_from_spec("job-2".into(), spec(now + Duration::days(1)));
        assert!(!is_due(&later, now));
    }

    #[test]
    fn test_stats() {
        let now = Utc::now();
        let mut jobs: Vec<Job> = (0..4).map(|i| job_from_spec(format!("job-{i}"), spec(now))).collect();
        jobs[1].status = JobStatus::Sent;
        jobs[2].status = JobStatus::Error;
        let stats = JobStats::collect(&jobs);
        assert_eq!(stats, JobStats { pending: 2, sent: 1, paused: 0, error: 1 });
        assert_eq!(stats.total(), 4);
    }
}
