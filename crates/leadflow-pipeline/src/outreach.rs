//! Channel action executor: the single path that records an outreach.
//!
//! Quick actions and job execution both land here, so the side effects
//! are identical whatever the trigger: one automatic interaction, a
//! refreshed last-interaction time, an activity entry and a success
//! notification.

use chrono::{DateTime, Utc};
use leadflow_core::{
    ActivityKind, Channel, IdGenerator, Interaction, JobKind, Lead, NotificationKind,
};

use crate::activity::ActivityLog;
use crate::notify::NotificationCenter;

/// Subject and description for an outreach record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composed {
    pub subject: String,
    pub description: String,
}

/// Build the subject/description for an outreach of `kind` to `lead`.
pub fn compose(lead: &Lead, channel: Channel, kind: JobKind) -> Composed {
    match kind {
        JobKind::AdCampaign => Composed {
            subject: format!("Campaign message via {channel}"),
            description: format!("Automated campaign message sent to {} via {channel}", lead.name),
        },
        JobKind::DirectContact => Composed {
            subject: format!("Direct contact via {channel}"),
            description: format!("Direct {channel} contact with {}", lead.name),
        },
    }
}

/// Collections an execution writes to.
pub struct OutreachContext<'a> {
    pub interactions: &'a mut Vec<Interaction>,
    pub notifications: &'a mut NotificationCenter,
    pub activities: &'a mut ActivityLog,
    pub actor: &'a str,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct ChannelActionExecutor {
    ids: IdGenerator,
}

impl ChannelActionExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outreach to `lead` and return the new interaction.
    pub fn execute(
        &self,
        lead: &mut Lead,
        channel: Channel,
        kind: JobKind,
        ctx: OutreachContext<'_>,
    ) -> Interaction {
        let Composed { subject, description } = compose(lead, channel, kind);
        let interaction = Interaction {
            id: self.ids.next("int"),
            lead_ref: lead.id.clone(),
            channel,
            timestamp: ctx.now,
            subject: subject.clone(),
            description: description.clone(),
            automatic: true,
        };
        ctx.interactions.push(interaction.clone());
        lead.touch(ctx.now);

        ctx.activities.record(
            ActivityKind::Interaction,
            description.clone(),
            ctx.actor,
            Some(lead.id.as_str()),
            ctx.now,
        );
        ctx.notifications.notify(
            NotificationKind::Success,
            &subject,
            &description,
            Some(lead.id.as_str()),
            ctx.now,
        );
        tracing::info!("📤 {} → {} ({channel})", subject, lead.name);
        interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::LeadDraft;

    #[test]
    fn test_compose_by_kind() {
        let lead = Lead::from_draft("l1".into(), LeadDraft::new("Ana", "Acme"), Utc::now());
        let ad = compose(&lead, Channel::Email, JobKind::AdCampaign);
        assert_eq!(ad.subject, "Campaign message via email");
        assert!(ad.description.contains("Ana"));
        let direct = compose(&lead, Channel::Whatsapp, JobKind::DirectContact);
        assert_eq!(direct.subject, "Direct contact via whatsapp");
        assert_eq!(direct.description, "Direct whatsapp contact with Ana");
    }

    #[test]
    fn test_execute_side_effects() {
        let now = Utc::now();
        let mut lead = Lead::from_draft("l1".into(), LeadDraft::new("Ana", "Acme").inactive_for(40), now);
        let mut interactions = Vec::new();
        let mut notifications = NotificationCenter::new(10, 5);
        let mut activities = ActivityLog::new();

        let exec = ChannelActionExecutor::new();
        let i = exec.execute(
            &mut lead,
            Channel::Linkedin,
            JobKind::DirectContact,
            OutreachContext {
                interactions: &mut interactions,
                notifications: &mut notifications,
                activities: &mut activities,
                actor: "ana",
                now,
            },
        );

        assert!(i.automatic);
        assert_eq!(interactions.len(), 1);
        assert_eq!(lead.days_inactive, Some(0));
        assert_eq!(lead.last_interaction_at, Some(now));
        assert_eq!(activities.entries().next().unwrap().kind, ActivityKind::Interaction);
        let n = notifications.recent.iter().next().unwrap();
        assert_eq!(n.kind, NotificationKind::Success);
        assert_eq!(n.lead_ref.as_deref(), Some("l1"));
    }
}
