//! Domain types shared by every Leadflow crate.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LeadflowError, Result};

// ═══════════════════════════════════════════════════════
// Leads
// ═══════════════════════════════════════════════════════

/// Position of a lead in the sales pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Prospecting,
    Sample,
    Qualified,
    Negotiation,
    PostSale,
    /// Terminal. Only reachable through a confirmed loss.
    Lost,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Prospecting,
        Stage::Sample,
        Stage::Qualified,
        Stage::Negotiation,
        Stage::PostSale,
        Stage::Lost,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Prospecting => write!(f, "prospecting"),
            Stage::Sample => write!(f, "sample"),
            Stage::Qualified => write!(f, "qualified"),
            Stage::Negotiation => write!(f, "negotiation"),
            Stage::PostSale => write!(f, "post-sale"),
            Stage::Lost => write!(f, "lost"),
        }
    }
}

/// Geographic coordinates returned by the geocoding collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A prospective or current customer.
///
/// `loss_reason` is present iff `stage == Stage::Lost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub company: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub stage: Stage,
    pub loss_reason: Option<String>,
    /// Derived, 0..=100. Cached until the next recompute.
    pub score: u8,
    pub last_interaction_at: Option<DateTime<Utc>>,
    /// Derived from `last_interaction_at` when one is known.
    pub days_inactive: Option<u32>,
    pub estimated_value: Option<f64>,
    pub interested_products: BTreeSet<String>,
    /// Assigned sales rep.
    pub rep_ref: Option<String>,
    pub location: Option<Coordinates>,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Build a lead from a validated draft.
    pub fn from_draft(id: String, draft: LeadDraft, now: DateTime<Utc>) -> Self {
        let mut lead = Self {
            id,
            name: draft.name.trim().to_string(),
            company: draft.company.trim().to_string(),
            email: draft.email,
            phone: draft.phone,
            stage: draft.stage,
            loss_reason: None,
            score: 0,
            last_interaction_at: draft.last_interaction_at,
            days_inactive: draft.days_inactive,
            estimated_value: draft.estimated_value,
            interested_products: draft.interested_products,
            rep_ref: draft.rep_ref,
            location: None,
            created_at: now,
        };
        lead.refresh_inactivity(now);
        lead
    }

    /// Overwrite the editable fields. Stage is only changed through pipeline moves.
    pub fn apply_edit(&mut self, draft: LeadDraft, now: DateTime<Utc>) {
        self.name = draft.name.trim().to_string();
        self.company = draft.company.trim().to_string();
        self.email = draft.email;
        self.phone = draft.phone;
        self.estimated_value = draft.estimated_value;
        self.interested_products = draft.interested_products;
        self.rep_ref = draft.rep_ref;
        if draft.last_interaction_at.is_some() {
            self.last_interaction_at = draft.last_interaction_at;
        }
        if draft.days_inactive.is_some() {
            self.days_inactive = draft.days_inactive;
        }
        self.refresh_inactivity(now);
    }

    /// Recompute `days_inactive` from the last interaction. Leads without
    /// a known interaction keep whatever value was supplied.
    pub fn refresh_inactivity(&mut self, now: DateTime<Utc>) {
        if let Some(at) = self.last_interaction_at {
            let days = (now - at).num_days().max(0);
            self.days_inactive = Some(u32::try_from(days).unwrap_or(u32::MAX));
        }
    }

    /// Register a fresh interaction at `at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_interaction_at = Some(at);
        self.days_inactive = Some(0);
    }
}

/// Input for creating or editing a lead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDraft {
    pub name: String,
    pub company: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_stage")]
    pub stage: Stage,
    #[serde(default)]
    pub estimated_value: Option<f64>,
    #[serde(default)]
    pub interested_products: BTreeSet<String>,
    #[serde(default)]
    pub rep_ref: Option<String>,
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub days_inactive: Option<u32>,
}

fn default_stage() -> Stage { Stage::Prospecting }

impl LeadDraft {
    pub fn new(name: &str, company: &str) -> Self {
        Self {
            name: name.to_string(),
            company: company.to_string(),
            email: None,
            phone: None,
            stage: Stage::Prospecting,
            estimated_value: None,
            interested_products: BTreeSet::new(),
            rep_ref: None,
            last_interaction_at: None,
            days_inactive: None,
        }
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stage = stage;
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.estimated_value = Some(value);
        self
    }

    pub fn inactive_for(mut self, days: u32) -> Self {
        self.days_inactive = Some(days);
        self
    }

    pub fn products<I, S>(mut self, products: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interested_products = products.into_iter().map(Into::into).collect();
        self
    }

    pub fn rep(mut self, rep_id: &str) -> Self {
        self.rep_ref = Some(rep_id.to_string());
        self
    }

    /// Reject drafts missing required fields.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LeadflowError::validation("lead name is required"));
        }
        if self.company.trim().is_empty() {
            return Err(LeadflowError::validation("lead company is required"));
        }
        if let Some(v) = self.estimated_value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(LeadflowError::validation(
                "estimated value must be a non-negative number",
            ));
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════
// Interactions & channels
// ═══════════════════════════════════════════════════════

/// Contact channel. Outreach jobs use the same set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Email,
    Whatsapp,
    Instagram,
    Linkedin,
    Call,
    Meeting,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Email => write!(f, "email"),
            Channel::Whatsapp => write!(f, "whatsapp"),
            Channel::Instagram => write!(f, "instagram"),
            Channel::Linkedin => write!(f, "linkedin"),
            Channel::Call => write!(f, "call"),
            Channel::Meeting => write!(f, "meeting"),
        }
    }
}

/// One recorded contact with a lead. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub lead_ref: String,
    pub channel: Channel,
    pub timestamp: DateTime<Utc>,
    pub subject: String,
    pub description: String,
    /// System-generated rather than logged by a person.
    pub automatic: bool,
}

// ═══════════════════════════════════════════════════════
// Notifications
// ═══════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub lead_ref: Option<String>,
}

// ═══════════════════════════════════════════════════════
// Cadences, campaigns, jobs
// ═══════════════════════════════════════════════════════

/// One outreach step, offset from the campaign start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CadenceStep {
    pub channel: Channel,
    pub delay_days: u32,
    pub template_ref: String,
}

impl CadenceStep {
    pub fn new(channel: Channel, delay_days: u32, template_ref: &str) -> Self {
        Self {
            channel,
            delay_days,
            template_ref: template_ref.to_string(),
        }
    }
}

/// Reusable ordered sequence of outreach steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cadence {
    pub id: String,
    pub name: String,
    pub steps: Vec<CadenceStep>,
    /// Declared only; the scheduler does not stop on replies.
    pub pause_on_reply: bool,
}

/// Audience filter. Present fields AND together; absent fields impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudienceFilter {
    #[serde(default)]
    pub stage_equals: Option<Stage>,
    #[serde(default)]
    pub min_score: Option<u8>,
    #[serde(default)]
    pub min_days_inactive: Option<u32>,
}

impl AudienceFilter {
    pub fn matches(&self, lead: &Lead) -> bool {
        if let Some(stage) = self.stage_equals
            && lead.stage != stage
        {
            return false;
        }
        if let Some(min) = self.min_score
            && lead.score < min
        {
            return false;
        }
        if let Some(min) = self.min_days_inactive {
            match lead.days_inactive {
                Some(days) if days >= min => {}
                _ => return false,
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CampaignStatus::Draft => write!(f, "draft"),
            CampaignStatus::Active => write!(f, "active"),
            CampaignStatus::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub cadence_ref: String,
    pub filter: AudienceFilter,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    AdCampaign,
    DirectContact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Sent,
    Paused,
    Error,
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Sent => write!(f, "sent"),
            JobStatus::Paused => write!(f, "paused"),
            JobStatus::Error => write!(f, "error"),
        }
    }
}

/// One scheduled unit of outreach. Only `status` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub lead_ref: String,
    pub channel: Channel,
    pub kind: JobKind,
    pub status: JobStatus,
    pub scheduled_at: DateTime<Utc>,
    pub template_ref: Option<String>,
    pub campaign_ref: Option<String>,
}

/// Request to schedule a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub lead_ref: String,
    pub channel: Channel,
    pub kind: JobKind,
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub template_ref: Option<String>,
    #[serde(default)]
    pub campaign_ref: Option<String>,
}

// ═══════════════════════════════════════════════════════
// Reps, tasks, activities
// ═══════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepTargets {
    pub sales_target: f64,
    pub lead_target: u32,
    pub conversion_target_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRep {
    pub id: String,
    pub name: String,
    pub targets: RepTargets,
    pub active: bool,
}

/// Follow-up task, optionally tied to a lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lead_ref: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Moved,
    Added,
    Edited,
    Interaction,
    Task,
}

/// Audit-trail entry. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub description: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub lead_ref: Option<String>,
}
