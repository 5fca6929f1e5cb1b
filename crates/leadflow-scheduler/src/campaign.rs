//! Campaign manager: binds a cadence to an audience filter.
//!
//! Starting a campaign resolves the audience once and schedules one job
//! per (step × lead). Starting the same campaign again schedules a fresh
//! full set; earlier jobs are left alone.

use chrono::{DateTime, Duration, Utc};
use leadflow_core::{
    AudienceFilter, Campaign, CampaignStatus, IdGenerator, JobKind, JobSpec, Lead,
    LeadflowError, NotificationKind, Result,
};
use leadflow_pipeline::NotificationCenter;
use serde::Serialize;

use crate::cadence::CadenceCatalog;
use crate::engine::JobScheduler;

/// What a campaign start produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartReport {
    pub campaign_id: String,
    /// Lead ids in the audience snapshot.
    pub audience: Vec<String>,
    /// Job ids, in scheduling order.
    pub jobs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PauseReport {
    pub campaign_id: String,
    pub paused_jobs: usize,
}

/// Leads satisfying every present filter field, in store order.
pub fn resolve_audience<'a>(filter: &AudienceFilter, leads: &'a [Lead]) -> Vec<&'a Lead> {
    leads.iter().filter(|l| filter.matches(l)).collect()
}

#[derive(Debug, Default)]
pub struct CampaignManager {
    campaigns: Vec<Campaign>,
    ids: IdGenerator,
}

impl CampaignManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a draft campaign over an existing cadence.
    pub fn create(
        &mut self,
        name: &str,
        cadence_ref: &str,
        filter: AudienceFilter,
        cadences: &CadenceCatalog,
        now: DateTime<Utc>,
    ) -> Result<Campaign> {
        if name.trim().is_empty() {
            return Err(LeadflowError::validation("campaign name is required"));
        }
        if cadences.get(cadence_ref).is_none() {
            return Err(LeadflowError::not_found("cadence", cadence_ref));
        }
        let campaign = Campaign {
            id: self.ids.next("cmp"),
            name: name.trim().to_string(),
            cadence_ref: cadence_ref.to_string(),
            filter,
            status: CampaignStatus::Draft,
            created_at: now,
        };
        tracing::info!("📣 Campaign created: '{}' ({})", campaign.name, campaign.id);
        self.campaigns.push(campaign.clone());
        Ok(campaign)
    }

    pub fn get(&self, id: &str) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    pub fn list(&self) -> &[Campaign] {
        &self.campaigns
    }

    /// Start (or restart) a campaign.
    pub fn start(
        &mut self,
        id: &str,
        cadences: &CadenceCatalog,
        leads: &[Lead],
        scheduler: &mut JobScheduler,
        notifications: &mut NotificationCenter,
        now: DateTime<Utc>,
    ) -> Result<StartReport> {
        let campaign = self
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LeadflowError::not_found("campaign", id))?;
        let cadence = cadences
            .get(&campaign.cadence_ref)
            .ok_or_else(|| LeadflowError::not_found("cadence", campaign.cadence_ref.clone()))?;

        let audience = resolve_audience(&campaign.filter, leads);
        let mut job_ids = Vec::with_capacity(cadence.steps.len() * audience.len());
        for step in &cadence.steps {
            let scheduled_at = now + Duration::days(i64::from(step.delay_days));
            for lead in &audience {
                let spec = JobSpec {
                    lead_ref: lead.id.clone(),
                    channel: step.channel,
                    kind: JobKind::AdCampaign,
                    scheduled_at,
                    template_ref: Some(step.template_ref.clone()),
                    campaign_ref: Some(campaign.id.clone()),
                };
                job_ids.push(scheduler.schedule(spec, &lead.name, notifications, now).id);
            }
        }

        campaign.status = CampaignStatus::Active;
        notifications.notify(
            NotificationKind::Success,
            "Campaign started",
            &format!("Campaign {} started for {} leads", campaign.name, audience.len()),
            None,
            now,
        );
        tracing::info!(
            "🚀 Campaign '{}' started: {} leads × {} steps = {} jobs",
            campaign.name,
            audience.len(),
            cadence.steps.len(),
            job_ids.len()
        );

        Ok(StartReport {
            campaign_id: campaign.id.clone(),
            audience: audience.iter().map(|l| l.id.clone()).collect(),
            jobs: job_ids,
        })
    }

    /// Pause an active campaign and hold its pending jobs.
    pub fn pause(&mut self, id: &str, scheduler: &mut JobScheduler) -> Result<PauseReport> {
        let campaign = self
            .campaigns
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LeadflowError::not_found("campaign", id))?;
        if campaign.status != CampaignStatus::Active {
            return Err(LeadflowError::State(format!(
                "campaign {} is {}, only active campaigns can be paused",
                campaign.name, campaign.status
            )));
        }
        campaign.status = CampaignStatus::Paused;
        let paused_jobs = scheduler.pause_campaign_jobs(id);
        tracing::info!("⏸️ Campaign '{}' paused ({paused_jobs} jobs held)", campaign.name);
        Ok(PauseReport {
            campaign_id: id.to_string(),
            paused_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::{CadenceStep, Channel, JobStatus, LeadDraft, Stage};

    struct Fixture {
        cadences: CadenceCatalog,
        campaigns: CampaignManager,
        scheduler: JobScheduler,
        notifications: NotificationCenter,
        leads: Vec<Lead>,
        cadence_id: String,
    }

    fn fixture() -> Fixture {
        let now = Utc::now();
        let mut cadences = CadenceCatalog::new();
        let cadence = cadences
            .create(
                "Win-back",
                vec![
                    CadenceStep::new(Channel::Email, 0, "tpl-1"),
                    CadenceStep::new(Channel::Whatsapp, 2, "tpl-2"),
                    CadenceStep::new(Channel::Linkedin, 5, "tpl-3"),
                ],
                false,
            )
            .unwrap();
        let leads = vec![
            Lead::from_draft("l1".into(), LeadDraft::new("Ana", "Acme").inactive_for(45), now),
            Lead::from_draft("l2".into(), LeadDraft::new("Bo", "Beta").inactive_for(30), now),
            Lead::from_draft("l3".into(), LeadDraft::new("Cy", "Gamma").inactive_for(2).stage(Stage::Sample), now),
        ];
        Fixture {
            cadences,
            campaigns: CampaignManager::new(),
            scheduler: JobScheduler::new(),
            notifications: NotificationCenter::new(100, 5),
            leads,
            cadence_id: cadence.id,
        }
    }

    impl Fixture {
        fn create(&mut self, filter: AudienceFilter) -> Campaign {
            self.campaigns
                .create("Q3 win-back", &self.cadence_id, filter, &self.cadences, Utc::now())
                .unwrap()
        }

        fn start(&mut self, id: &str, now: DateTime<Utc>) -> Result<StartReport> {
            self.campaigns.start(
                id,
                &self.cadences,
                &self.leads,
                &mut self.scheduler,
                &mut self.notifications,
                now,
            )
        }
    }

    #[test]
    fn test_start_fans_out_steps_times_audience() {
        let mut f = fixture();
        let c = f.create(AudienceFilter { min_days_inactive: Some(30), ..Default::default() });
        let now = Utc::now();
        let report = f.start(&c.id, now).unwrap();

        assert_eq!(report.audience, vec!["l1".to_string(), "l2".to_string()]);
        assert_eq!(report.jobs.len(), 6);
        assert_eq!(f.scheduler.len(), 6);
        for job in f.scheduler.jobs() {
            assert_eq!(job.status, JobStatus::Pending);
            assert_eq!(job.kind, JobKind::AdCampaign);
            assert_eq!(job.campaign_ref.as_deref(), Some(c.id.as_str()));
        }
        let whatsapp: Vec<_> = f.scheduler.jobs().iter().filter(|j| j.channel == Channel::Whatsapp).collect();
        assert_eq!(whatsapp.len(), 2);
        assert!(whatsapp.iter().all(|j| j.scheduled_at == now + Duration::days(2)));
        assert!(whatsapp.iter().all(|j| j.template_ref.as_deref() == Some("tpl-2")));

        assert_eq!(f.campaigns.get(&c.id).unwrap().status, CampaignStatus::Active);
        let latest = f.notifications.recent.iter().next().unwrap();
        assert_eq!(latest.kind, NotificationKind::Success);
        assert!(latest.message.contains("2 leads"));
    }

    #[test]
    fn test_audience_is_a_snapshot() {
        let mut f = fixture();
        let c = f.create(AudienceFilter { stage_equals: Some(Stage::Sample), ..Default::default() });
        let report = f.start(&c.id, Utc::now()).unwrap();
        assert_eq!(report.audience, vec!["l3".to_string()]);

        f.leads[0].stage = Stage::Sample;
        assert_eq!(f.scheduler.for_campaign(&c.id).count(), 3);
    }

    #[test]
    fn test_restart_duplicates_jobs() {
        let mut f = fixture();
        let c = f.create(AudienceFilter::default());
        f.start(&c.id, Utc::now()).unwrap();
        f.start(&c.id, Utc::now()).unwrap();
        assert_eq!(f.scheduler.for_campaign(&c.id).count(), 18);
    }

    #[test]
    fn test_start_unknown_campaign() {
        let mut f = fixture();
        let err = f.start("cmp-missing", Utc::now()).unwrap_err();
        assert!(err.is_not_found());
        assert!(f.scheduler.is_empty());
        assert!(f.notifications.recent.is_empty());
    }

    #[test]
    fn test_create_requires_cadence() {
        let mut f = fixture();
        let err = f
            .campaigns
            .create("X", "cad-missing", AudienceFilter::default(), &f.cadences, Utc::now())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_pause_holds_pending_jobs() {
        let mut f = fixture();
        let c = f.create(AudienceFilter::default());
        assert!(f.campaigns.pause(&c.id, &mut f.scheduler).is_err());

        f.start(&c.id, Utc::now()).unwrap();
        let first = f.scheduler.jobs()[0].id.clone();
        f.scheduler.claim(&first).unwrap();

        let report = f.campaigns.pause(&c.id, &mut f.scheduler).unwrap();
        assert_eq!(report.paused_jobs, 8);
        assert_eq!(f.campaigns.get(&c.id).unwrap().status, CampaignStatus::Paused);
        assert_eq!(f.scheduler.get(&first).unwrap().status, JobStatus::Sent);
    }
}
