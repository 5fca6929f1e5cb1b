//! Pipeline stage transitions.
//!
//! Moving a lead to `lost` is held until a loss reason is confirmed.
//! Only one loss can be pending at a time; requesting another replaces it.

use chrono::{DateTime, Utc};
use leadflow_core::{ActivityKind, Lead, LeadflowError, Result, Stage};
use serde::Serialize;

use crate::activity::ActivityLog;

/// Result of a move request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MoveOutcome {
    /// Target equals the current stage; nothing happened.
    Unchanged,
    Moved { from: Stage, to: Stage },
    /// Target is `lost`; waiting for `confirm_loss` or `cancel_loss`.
    AwaitingLossReason,
}

/// Result of a loss confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LossOutcome {
    Confirmed { lead_id: String, from: Stage, reason: String },
    /// No loss was pending; nothing happened.
    NoPending,
}

/// A loss transition waiting for its reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingLoss {
    pub lead_id: String,
    pub from: Stage,
}

#[derive(Debug)]
pub struct PipelineStateMachine {
    pending: Option<PendingLoss>,
    default_reason: String,
}

impl PipelineStateMachine {
    pub fn new(default_reason: &str) -> Self {
        Self {
            pending: None,
            default_reason: default_reason.to_string(),
        }
    }

    pub fn pending(&self) -> Option<&PendingLoss> {
        self.pending.as_ref()
    }

    /// Request a move of `lead` to `to`.
    pub fn request_move(
        &mut self,
        lead: &mut Lead,
        to: Stage,
        log: &mut ActivityLog,
        actor: &str,
        now: DateTime<Utc>,
    ) -> MoveOutcome {
        if lead.stage == to {
            return MoveOutcome::Unchanged;
        }

        if to == Stage::Lost {
            tracing::info!("⏸️ Loss of '{}' held until a reason is given", lead.name);
            self.pending = Some(PendingLoss {
                lead_id: lead.id.clone(),
                from: lead.stage,
            });
            return MoveOutcome::AwaitingLossReason;
        }

        if self.pending.as_ref().is_some_and(|p| p.lead_id == lead.id) {
            self.pending = None;
        }

        let from = lead.stage;
        lead.stage = to;
        lead.loss_reason = None;
        log.record(
            ActivityKind::Moved,
            format!("Moved {} from {from} to {to}", lead.name),
            actor,
            Some(lead.id.as_str()),
            now,
        );
        tracing::info!("➡️ Lead '{}' moved {from} → {to}", lead.name);
        MoveOutcome::Moved { from, to }
    }

    /// Finalize the pending loss. Blank reasons fall back to the default.
    pub fn confirm_loss(
        &mut self,
        leads: &mut [Lead],
        reason: &str,
        log: &mut ActivityLog,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<LossOutcome> {
        let Some(pending) = self.pending.take() else {
            tracing::debug!("confirm_loss with nothing pending, ignored");
            return Ok(LossOutcome::NoPending);
        };

        let Some(lead) = leads.iter_mut().find(|l| l.id == pending.lead_id) else {
            return Err(LeadflowError::not_found("lead", pending.lead_id));
        };

        let reason = match reason.trim() {
            "" => self.default_reason.clone(),
            r => r.to_string(),
        };
        let from = lead.stage;
        lead.stage = Stage::Lost;
        lead.loss_reason = Some(reason.clone());
        log.record(
            ActivityKind::Moved,
            format!("Moved {} from {from} to lost ({reason})", lead.name),
            actor,
            Some(lead.id.as_str()),
            now,
        );
        tracing::info!("❌ Lead '{}' lost: {reason}", lead.name);
        Ok(LossOutcome::Confirmed {
            lead_id: lead.id.clone(),
            from,
            reason,
        })
    }

    /// Discard the pending loss, leaving the lead untouched.
    pub fn cancel_loss(&mut self) -> Option<PendingLoss> {
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::LeadDraft;

    fn setup(stage: Stage) -> (PipelineStateMachine, Vec<Lead>, ActivityLog) {
        let lead = Lead::from_draft("lead-1".into(), LeadDraft::new("Ana", "Acme").stage(stage), Utc::now());
        (PipelineStateMachine::new("not informed"), vec![lead], ActivityLog::new())
    }

    #[test]
    fn test_same_stage_is_noop() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        let out = sm.request_move(&mut leads[0], Stage::Sample, &mut log, "ana", Utc::now());
        assert_eq!(out, MoveOutcome::Unchanged);
        assert!(log.is_empty());
    }

    #[test]
    fn test_regular_move_records_activity() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        let out = sm.request_move(&mut leads[0], Stage::Qualified, &mut log, "ana", Utc::now());
        assert_eq!(out, MoveOutcome::Moved { from: Stage::Sample, to: Stage::Qualified });
        assert_eq!(leads[0].stage, Stage::Qualified);
        assert_eq!(log.entries().next().unwrap().kind, ActivityKind::Moved);
    }

    #[test]
    fn test_loss_is_held_until_confirmed() {
        let (mut sm, mut leads, mut log) = setup(Stage::Negotiation);
        let out = sm.request_move(&mut leads[0], Stage::Lost, &mut log, "ana", Utc::now());
        assert_eq!(out, MoveOutcome::AwaitingLossReason);
        assert_eq!(leads[0].stage, Stage::Negotiation);
        assert!(leads[0].loss_reason.is_none());
        assert!(log.is_empty());

        let out = sm.confirm_loss(&mut leads, "price too high", &mut log, "ana", Utc::now()).unwrap();
        assert_eq!(
            out,
            LossOutcome::Confirmed {
                lead_id: "lead-1".into(),
                from: Stage::Negotiation,
                reason: "price too high".into()
            }
        );
        assert_eq!(leads[0].stage, Stage::Lost);
        assert_eq!(leads[0].loss_reason.as_deref(), Some("price too high"));
        assert_eq!(log.len(), 1);
        assert!(sm.pending().is_none());
    }

    #[test]
    fn test_blank_reason_uses_default() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        sm.request_move(&mut leads[0], Stage::Lost, &mut log, "ana", Utc::now());
        sm.confirm_loss(&mut leads, "   ", &mut log, "ana", Utc::now()).unwrap();
        assert_eq!(leads[0].loss_reason.as_deref(), Some("not informed"));
    }

    #[test]
    fn test_cancel_discards_pending() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        sm.request_move(&mut leads[0], Stage::Lost, &mut log, "ana", Utc::now());
        assert!(sm.cancel_loss().is_some());
        assert_eq!(leads[0].stage, Stage::Sample);
        let out = sm.confirm_loss(&mut leads, "late", &mut log, "ana", Utc::now()).unwrap();
        assert_eq!(out, LossOutcome::NoPending);
        assert_eq!(leads[0].stage, Stage::Sample);
        assert!(log.is_empty());
    }

    #[test]
    fn test_leaving_lost_clears_reason() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        sm.request_move(&mut leads[0], Stage::Lost, &mut log, "ana", Utc::now());
        sm.confirm_loss(&mut leads, "budget", &mut log, "ana", Utc::now()).unwrap();
        sm.request_move(&mut leads[0], Stage::Qualified, &mut log, "ana", Utc::now());
        assert_eq!(leads[0].stage, Stage::Qualified);
        assert!(leads[0].loss_reason.is_none());
    }

    #[test]
    fn test_moving_pending_lead_elsewhere_drops_pending() {
        let (mut sm, mut leads, mut log) = setup(Stage::Sample);
        sm.request_move(&mut leads[0], Stage::Lost, &mut log, "ana", Utc::now());
        sm.request_move(&mut leads[0], Stage::Qualified, &mut log, "ana", Utc::now());
        assert!(sm.pending().is_none());
    }
}
