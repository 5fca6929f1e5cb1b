//! Workspace: the store plus every command that may mutate it.
//!
//! Commands run to completion, then recompute derived state (scores,
//! inactivity, derived alerts) when leads, tasks or reps changed.
//! Rejected commands leave the store untouched.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use leadflow_core::{
    ActivityKind, AudienceFilter, Cadence, CadenceStep, Campaign, Channel, Coordinates,
    IdGenerator, Interaction, Job, JobKind, JobSpec, Lead, LeadDraft, LeadflowConfig,
    LeadflowError, Notification, NotificationKind, OutreachMessage, Result, SalesRep, Stage, Task,
};
use leadflow_pipeline::{
    ActivityLog, ChannelActionExecutor, Composed, LossOutcome, MoveOutcome, NotificationCenter,
    NotificationDeriver, OutreachContext, PendingLoss, PipelineStateMachine, RepPipeline, compose,
    compute_score, pipeline_by_rep,
};
use leadflow_scheduler::{
    CadenceCatalog, CampaignManager, JobScheduler, JobStats, PauseReport, RunOutcome, StartReport,
};

use crate::store::{Snapshot, Store};

/// Source of "now". Injected so tests can pin time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct Workspace {
    config: LeadflowConfig,
    clock: Clock,
    ids: IdGenerator,
    store: Store,
    notifications: NotificationCenter,
    activities: ActivityLog,
    pipeline: PipelineStateMachine,
    deriver: NotificationDeriver,
    executor: ChannelActionExecutor,
    cadences: CadenceCatalog,
    campaigns: CampaignManager,
    jobs: JobScheduler,
}

fn rejected(op: &str, err: LeadflowError) -> LeadflowError {
    tracing::warn!("🚫 {op} rejected: {err}");
    err
}

impl Workspace {
    pub fn new(config: LeadflowConfig) -> Self {
        Self::with_clock(config, Arc::new(Utc::now))
    }

    pub fn with_clock(config: LeadflowConfig, clock: Clock) -> Self {
        let n = &config.notifications;
        Self {
            notifications: NotificationCenter::new(n.max_recent, n.auto_read_secs),
            deriver: NotificationDeriver::new(n.inactivity_days, n.rep_risk_ratio),
            pipeline: PipelineStateMachine::new(&config.pipeline.default_loss_reason),
            clock,
            ids: IdGenerator::new(),
            store: Store::default(),
            activities: ActivityLog::new(),
            executor: ChannelActionExecutor::new(),
            cadences: CadenceCatalog::new(),
            campaigns: CampaignManager::new(),
            jobs: JobScheduler::new(),
            config,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Read the clock and age out ad-hoc notifications.
    fn begin(&mut self) -> DateTime<Utc> {
        let now = self.now();
        let expired = self.notifications.recent.expire(now);
        if expired > 0 {
            tracing::debug!("🔕 {expired} notifications auto-read");
        }
        now
    }

    /// Refresh inactivity and scores, then rebuild the derived alerts.
    fn recompute(&mut self, now: DateTime<Utc>) {
        for lead in self.store.leads.iter_mut() {
            lead.refresh_inactivity(now);
            lead.score = compute_score(lead);
        }
        let alerts = self
            .deriver
            .derive(&self.store.leads, &self.store.tasks, &self.store.reps, now);
        self.notifications.derived.replace(alerts);
    }

    fn lead_index(&self, id: &str) -> Result<usize> {
        self.store
            .lead_index(id)
            .ok_or_else(|| LeadflowError::not_found("lead", id))
    }

    fn check_rep(&self, rep_ref: Option<&str>) -> Result<()> {
        match rep_ref {
            Some(id) if self.store.rep(id).is_none() => Err(LeadflowError::not_found("rep", id)),
            _ => Ok(()),
        }
    }

    // ── Leads ──────────────────────────────────────────────

    pub fn create_lead(&mut self, draft: LeadDraft) -> Result<Lead> {
        let now = self.begin();
        draft.validate().map_err(|e| rejected("create_lead", e))?;
        if draft.stage == Stage::Lost {
            return Err(rejected(
                "create_lead",
                LeadflowError::validation("a new lead cannot start as lost"),
            ));
        }
        self.check_rep(draft.rep_ref.as_deref())
            .map_err(|e| rejected("create_lead", e))?;

        let mut lead = Lead::from_draft(self.ids.next("lead"), draft, now);
        lead.score = compute_score(&lead);
        self.activities.record(
            ActivityKind::Added,
            format!("Added lead {} ({})", lead.name, lead.company),
            &self.config.pipeline.actor,
            Some(lead.id.as_str()),
            now,
        );
        tracing::info!("👤 Lead created: '{}' ({}, score {})", lead.name, lead.id, lead.score);
        self.store.leads.push(lead.clone());
        self.recompute(now);
        Ok(lead)
    }

    pub fn edit_lead(&mut self, id: &str, draft: LeadDraft) -> Result<Lead> {
        let now = self.begin();
        draft.validate().map_err(|e| rejected("edit_lead", e))?;
        self.check_rep(draft.rep_ref.as_deref())
            .map_err(|e| rejected("edit_lead", e))?;
        let idx = self.lead_index(id).map_err(|e| rejected("edit_lead", e))?;

        let lead = &mut self.store.leads[idx];
        lead.apply_edit(draft, now);
        self.activities.record(
            ActivityKind::Edited,
            format!("Edited lead {}", lead.name),
            &self.config.pipeline.actor,
            Some(lead.id.as_str()),
            now,
        );
        self.recompute(now);
        Ok(self.store.leads[idx].clone())
    }

    /// Move a lead between stages. Moves to `lost` wait for [`Self::confirm_loss`].
    pub fn move_lead_stage(&mut self, id: &str, to: Stage) -> Result<MoveOutcome> {
        let now = self.begin();
        let idx = self.lead_index(id).map_err(|e| rejected("move_lead_stage", e))?;
        let outcome = self.pipeline.request_move(
            &mut self.store.leads[idx],
            to,
            &mut self.activities,
            &self.config.pipeline.actor,
            now,
        );
        if matches!(outcome, MoveOutcome::Moved { .. }) {
            self.recompute(now);
        }
        Ok(outcome)
    }

    pub fn confirm_loss(&mut self, reason: &str) -> Result<LossOutcome> {
        let now = self.begin();
        let outcome = self
            .pipeline
            .confirm_loss(
                &mut self.store.leads,
                reason,
                &mut self.activities,
                &self.config.pipeline.actor,
                now,
            )
            .map_err(|e| rejected("confirm_loss", e))?;
        if matches!(outcome, LossOutcome::Confirmed { .. }) {
            self.recompute(now);
        }
        Ok(outcome)
    }

    pub fn cancel_loss(&mut self) -> Option<PendingLoss> {
        self.begin();
        self.pipeline.cancel_loss()
    }

    /// Store the geocoding result for a lead (`None` clears it).
    pub fn set_lead_location(&mut self, id: &str, location: Option<Coordinates>) -> Result<Lead> {
        let now = self.begin();
        let idx = self.lead_index(id).map_err(|e| rejected("set_lead_location", e))?;
        let lead = &mut self.store.leads[idx];
        lead.location = location;
        self.activities.record(
            ActivityKind::Edited,
            format!("Updated location of {}", lead.name),
            &self.config.pipeline.actor,
            Some(lead.id.as_str()),
            now,
        );
        Ok(lead.clone())
    }

    /// Record a manual (non-automatic) interaction.
    pub fn log_interaction(
        &mut self,
        lead_id: &str,
        channel: Channel,
        subject: &str,
        description: &str,
    ) -> Result<Interaction> {
        let now = self.begin();
        if subject.trim().is_empty() {
            return Err(rejected(
                "log_interaction",
                LeadflowError::validation("interaction subject is required"),
            ));
        }
        let idx = self.lead_index(lead_id).map_err(|e| rejected("log_interaction", e))?;
        let lead = &mut self.store.leads[idx];
        let interaction = Interaction {
            id: self.ids.next("int"),
            lead_ref: lead.id.clone(),
            channel,
            timestamp: now,
            subject: subject.trim().to_string(),
            description: description.to_string(),
            automatic: false,
        };
        lead.touch(now);
        self.activities.record(
            ActivityKind::Interaction,
            format!("{channel} with {}: {}", lead.name, interaction.subject),
            &self.config.pipeline.actor,
            Some(lead.id.as_str()),
            now,
        );
        self.store.interactions.push(interaction.clone());
        self.recompute(now);
        Ok(interaction)
    }

    // ── Tasks & reps ───────────────────────────────────────

    pub fn create_task(
        &mut self,
        title: &str,
        description: &str,
        lead_ref: Option<&str>,
        due_at: Option<DateTime<Utc>>,
    ) -> Result<Task> {
        let now = self.begin();
        if title.trim().is_empty() {
            return Err(rejected("create_task", LeadflowError::validation("task title is required")));
        }
        if let Some(id) = lead_ref {
            self.lead_index(id).map_err(|e| rejected("create_task", e))?;
        }
        let task = Task {
            id: self.ids.next("task"),
            title: title.trim().to_string(),
            description: description.to_string(),
            lead_ref: lead_ref.map(str::to_string),
            due_at,
            completed: false,
            created_at: now,
        };
        self.activities.record(
            ActivityKind::Task,
            format!("Created task {}", task.title),
            &self.config.pipeline.actor,
            lead_ref,
            now,
        );
        self.store.tasks.push(task.clone());
        self.recompute(now);
        Ok(task)
    }

    pub fn complete_task(&mut self, id: &str) -> Result<Task> {
        let now = self.begin();
        let task = self
            .store
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| rejected("complete_task", LeadflowError::not_found("task", id)))?;
        if task.completed {
            return Ok(task.clone());
        }
        task.completed = true;
        let task = task.clone();
        self.activities.record(
            ActivityKind::Task,
            format!("Completed task {}", task.title),
            &self.config.pipeline.actor,
            task.lead_ref.as_deref(),
            now,
        );
        self.recompute(now);
        Ok(task)
    }

    /// Insert or replace a rep. An empty id allocates a new one.
    pub fn upsert_rep(&mut self, mut rep: SalesRep) -> Result<SalesRep> {
        let now = self.begin();
        if rep.name.trim().is_empty() {
            return Err(rejected("upsert_rep", LeadflowError::validation("rep name is required")));
        }
        let t = &rep.targets;
        if !(t.sales_target.is_finite() && t.sales_target >= 0.0)
            || !(0.0..=100.0).contains(&t.conversion_target_pct)
        {
            return Err(rejected("upsert_rep", LeadflowError::validation("rep targets out of range")));
        }
        if rep.id.is_empty() {
            rep.id = self.ids.next("rep");
        }
        match self.store.reps.iter_mut().find(|r| r.id == rep.id) {
            Some(existing) => *existing = rep.clone(),
            None => self.store.reps.push(rep.clone()),
        }
        tracing::info!("🧑‍💼 Rep saved: '{}' ({})", rep.name, rep.id);
        self.recompute(now);
        Ok(rep)
    }

    // ── Cadences & campaigns ───────────────────────────────

    pub fn create_cadence(
        &mut self,
        name: &str,
        steps: Vec<CadenceStep>,
        pause_on_reply: bool,
    ) -> Result<Cadence> {
        self.begin();
        self.cadences
            .create(name, steps, pause_on_reply)
            .map_err(|e| rejected("create_cadence", e))
    }

    pub fn create_campaign(
        &mut self,
        name: &str,
        cadence_ref: &str,
        filter: AudienceFilter,
    ) -> Result<Campaign> {
        let now = self.begin();
        self.campaigns
            .create(name, cadence_ref, filter, &self.cadences, now)
            .map_err(|e| rejected("create_campaign", e))
    }

    /// Start a campaign. Inactivity and scores are refreshed against the
    /// clock first so the audience filter sees current values.
    pub fn start_campaign(&mut self, id: &str) -> Result<StartReport> {
        let now = self.begin();
        self.recompute(now);
        self.campaigns
            .start(
                id,
                &self.cadences,
                &self.store.leads,
                &mut self.jobs,
                &mut self.notifications,
                now,
            )
            .map_err(|e| rejected("start_campaign", e))
    }

    pub fn pause_campaign(&mut self, id: &str) -> Result<PauseReport> {
        self.begin();
        self.campaigns
            .pause(id, &mut self.jobs)
            .map_err(|e| rejected("pause_campaign", e))
    }

    // ── Jobs & outreach ────────────────────────────────────

    pub fn schedule_job(&mut self, spec: JobSpec) -> Result<Job> {
        let now = self.begin();
        let lead_name = self
            .store
            .lead(&spec.lead_ref)
            .map(|l| l.name.clone())
            .ok_or_else(|| rejected("schedule_job", LeadflowError::not_found("lead", &spec.lead_ref)))?;
        if let Some(c) = spec.campaign_ref.as_deref()
            && self.campaigns.get(c).is_none()
        {
            return Err(rejected("schedule_job", LeadflowError::not_found("campaign", c)));
        }
        Ok(self.jobs.schedule(spec, &lead_name, &mut self.notifications, now))
    }

    /// Execute a pending job now. Non-pending jobs are left alone.
    pub fn run_job_now(&mut self, id: &str) -> Result<RunOutcome> {
        let now = self.begin();
        let ctx = OutreachContext {
            interactions: &mut self.store.interactions,
            notifications: &mut self.notifications,
            activities: &mut self.activities,
            actor: &self.config.pipeline.actor,
            now,
        };
        let outcome = self
            .jobs
            .run_now(id, &mut self.store.leads, &self.executor, ctx)
            .map_err(|e| rejected("run_job_now", e))?;
        if matches!(outcome, RunOutcome::Executed { .. }) {
            self.recompute(now);
        }
        Ok(outcome)
    }

    /// Manual outreach button; same side effects as a job run.
    pub fn quick_action(&mut self, lead_id: &str, channel: Channel, kind: JobKind) -> Result<Interaction> {
        let now = self.begin();
        let idx = self.lead_index(lead_id).map_err(|e| rejected("quick_action", e))?;
        let ctx = OutreachContext {
            interactions: &mut self.store.interactions,
            notifications: &mut self.notifications,
            activities: &mut self.activities,
            actor: &self.config.pipeline.actor,
            now,
        };
        let interaction = self
            .executor
            .execute(&mut self.store.leads[idx], channel, kind, ctx);
        self.recompute(now);
        Ok(interaction)
    }

    /// Claim every due pending job (pending → sent) and describe what to send.
    pub fn claim_due(&mut self) -> Vec<OutreachMessage> {
        let now = self.begin();
        let mut claimed = Vec::new();
        for id in self.jobs.due(now) {
            let lead = self
                .jobs
                .get(&id)
                .and_then(|j| self.store.lead(&j.lead_ref))
                .cloned();
            let Ok(Some(job)) = self.jobs.claim(&id) else {
                continue;
            };
            match lead {
                Some(lead) => claimed.push(outreach_message(&job, &lead)),
                None => {
                    tracing::warn!("⚠️ Job {id} references unknown lead {}", job.lead_ref);
                    if let Err(e) = self.jobs.mark_error(&id) {
                        tracing::warn!("⚠️ Could not flag job {id}: {e}");
                    }
                }
            }
        }
        claimed
    }

    /// Record a successful delivery of a claimed job. Each job is recorded
    /// at most once, whether it ran here or through [`Self::run_job_now`].
    pub fn record_delivery(&mut self, job_id: &str) -> Result<Interaction> {
        let now = self.begin();
        let lead_ref = self
            .jobs
            .get(job_id)
            .map(|j| j.lead_ref.clone())
            .ok_or_else(|| rejected("record_delivery", LeadflowError::not_found("job", job_id)))?;
        let idx = self
            .lead_index(&lead_ref)
            .map_err(|e| rejected("record_delivery", e))?;
        let job = self
            .jobs
            .record_execution(job_id)
            .map_err(|e| rejected("record_delivery", e))?;
        let ctx = OutreachContext {
            interactions: &mut self.store.interactions,
            notifications: &mut self.notifications,
            activities: &mut self.activities,
            actor: &self.config.pipeline.actor,
            now,
        };
        let interaction = self
            .executor
            .execute(&mut self.store.leads[idx], job.channel, job.kind, ctx);
        self.recompute(now);
        Ok(interaction)
    }

    /// Record a failed delivery: the job ends in `error`, no retry.
    pub fn record_failure(&mut self, job_id: &str, reason: &str) -> Result<()> {
        let now = self.begin();
        self.jobs.mark_error(job_id)?;
        let Some(job) = self.jobs.get(job_id) else {
            return Ok(());
        };
        let lead_name = self
            .store
            .lead(&job.lead_ref)
            .map(|l| l.name.as_str())
            .unwrap_or("unknown lead");
        self.notifications.notify(
            NotificationKind::Error,
            "Delivery failed",
            &format!("{} outreach to {lead_name} failed: {reason}", job.channel),
            Some(job.lead_ref.as_str()),
            now,
        );
        Ok(())
    }

    // ── Notifications ──────────────────────────────────────

    pub fn acknowledge_notification(&mut self, id: &str) -> Result<()> {
        self.begin();
        if self.notifications.acknowledge(id) {
            Ok(())
        } else {
            Err(LeadflowError::not_found("notification", id))
        }
    }

    pub fn mark_all_read(&mut self) {
        self.begin();
        self.notifications.mark_all_read();
    }

    /// Age out ad-hoc notifications against the clock.
    pub fn expire_notifications(&mut self) -> usize {
        let now = self.now();
        self.notifications.recent.expire(now)
    }

    // ── Reads ──────────────────────────────────────────────

    pub fn config(&self) -> &LeadflowConfig {
        &self.config
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn lead(&self, id: &str) -> Option<&Lead> {
        self.store.lead(id)
    }

    pub fn leads(&self) -> &[Lead] {
        &self.store.leads
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.store.interactions
    }

    pub fn jobs(&self) -> &[Job] {
        self.jobs.jobs()
    }

    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.get(id)
    }

    pub fn job_stats(&self) -> JobStats {
        self.jobs.stats()
    }

    pub fn campaign(&self, id: &str) -> Option<&Campaign> {
        self.campaigns.get(id)
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.all()
    }

    pub fn derived_notifications(&self) -> &[Notification] {
        self.notifications.derived.items()
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.unread_count()
    }

    pub fn activities(&self) -> &ActivityLog {
        &self.activities
    }

    pub fn pending_loss(&self) -> Option<&PendingLoss> {
        self.pipeline.pending()
    }

    pub fn pipeline_by_rep(&self) -> Vec<RepPipeline> {
        pipeline_by_rep(&self.store.reps, &self.store.leads)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            taken_at: self.now(),
            leads: self.store.leads.clone(),
            interactions: self.store.interactions.clone(),
            tasks: self.store.tasks.clone(),
            reps: self.store.reps.clone(),
            cadences: self.cadences.list().to_vec(),
            campaigns: self.campaigns.list().to_vec(),
            jobs: self.jobs.jobs().to_vec(),
            job_stats: self.jobs.stats(),
            notifications: self.notifications.all(),
            activities: self.activities.entries().cloned().collect(),
            pending_loss: self.pipeline.pending().cloned(),
            pipeline_by_rep: self.pipeline_by_rep(),
        }
    }
}

fn outreach_message(job: &Job, lead: &Lead) -> OutreachMessage {
    let Composed { subject, description } = compose(lead, job.channel, job.kind);
    OutreachMessage {
        job_id: Some(job.id.clone()),
        lead_id: lead.id.clone(),
        lead_name: lead.name.clone(),
        channel: job.channel,
        kind: job.kind,
        template_ref: job.template_ref.clone(),
        subject,
        body: description,
    }
}
