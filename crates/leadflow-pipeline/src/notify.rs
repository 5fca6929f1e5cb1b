//! Notification storage.
//!
//! Two independent populations:
//! - [`DerivedAlerts`]: rebuilt wholesale by the deriver on every
//!   recompute. Read flags do not survive a rebuild.
//! - [`RecentNotifications`]: ad-hoc notifications appended by actions,
//!   newest first, capped, auto-marked read once they age past a delay.
//!
//! [`NotificationCenter`] composes both for display.

use chrono::{DateTime, Duration, Utc};
use leadflow_core::{BoundedBuffer, IdGenerator, Notification, NotificationKind};

/// Alerts recomputed from leads, tasks and reps.
///
/// Ids, kinds, titles and messages depend only on the entities. `created_at`
/// is the clock reading of the rebuild, so two rebuilds compare equal only
/// when they ran with the same `now`.
#[derive(Debug, Default)]
pub struct DerivedAlerts {
    items: Vec<Notification>,
}

impl DerivedAlerts {
    /// Discard the previous set and install `items`.
    pub fn replace(&mut self, items: Vec<Notification>) {
        tracing::debug!("🔄 Derived alerts rebuilt: {} → {}", self.items.len(), items.len());
        self.items = items;
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    fn acknowledge(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }
}

/// Rolling buffer of ad-hoc notifications.
#[derive(Debug)]
pub struct RecentNotifications {
    buffer: BoundedBuffer<Notification>,
    auto_read_after: Duration,
    ids: IdGenerator,
}

impl RecentNotifications {
    pub fn new(max_recent: usize, auto_read_secs: u64) -> Self {
        Self {
            buffer: BoundedBuffer::new(max_recent),
            auto_read_after: Duration::seconds(i64::try_from(auto_read_secs).unwrap_or(i64::MAX)),
            ids: IdGenerator::new(),
        }
    }

    /// Prepend a notification; the oldest is evicted past capacity.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        lead_ref: Option<&str>,
        now: DateTime<Utc>,
    ) -> String {
        let id = self.ids.next("ntf");
        let evicted = self.buffer.push(Notification {
            id: id.clone(),
            kind,
            title: title.to_string(),
            message: message.to_string(),
            created_at: now,
            read: false,
            lead_ref: lead_ref.map(str::to_string),
        });
        if let Some(old) = evicted {
            tracing::debug!("🗑️ Notification evicted: {}", old.title);
        }
        id
    }

    /// Mark read every notification older than the auto-read delay.
    pub fn expire(&mut self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for n in self.buffer.iter_mut() {
            if !n.read && n.created_at + self.auto_read_after <= now {
                n.read = true;
                expired += 1;
            }
        }
        expired
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn acknowledge(&mut self, id: &str) -> bool {
        match self.buffer.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }
}

/// Both notification populations behind one facade.
#[derive(Debug)]
pub struct NotificationCenter {
    pub derived: DerivedAlerts,
    pub recent: RecentNotifications,
}

impl NotificationCenter {
    pub fn new(max_recent: usize, auto_read_secs: u64) -> Self {
        Self {
            derived: DerivedAlerts::default(),
            recent: RecentNotifications::new(max_recent, auto_read_secs),
        }
    }

    /// Shorthand for an ad-hoc notification.
    pub fn notify(
        &mut self,
        kind: NotificationKind,
        title: &str,
        message: &str,
        lead_ref: Option<&str>,
        now: DateTime<Utc>,
    ) -> String {
        self.recent.push(kind, title, message, lead_ref, now)
    }

    /// Explicit read acknowledgement. Returns false for unknown ids.
    pub fn acknowledge(&mut self, id: &str) -> bool {
        self.recent.acknowledge(id) || self.derived.acknowledge(id)
    }

    pub fn mark_all_read(&mut self) {
        for n in self.recent.buffer.iter_mut() {
            n.read = true;
        }
        for n in self.derived.items.iter_mut() {
            n.read = true;
        }
    }

    /// Ad-hoc (newest first) followed by derived alerts.
    pub fn all(&self) -> Vec<Notification> {
        self.recent
            .iter()
            .chain(self.derived.items())
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.recent
            .iter()
            .chain(self.derived.items())
            .filter(|n| !n.read)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recent_capped_newest_first() {
        let mut center = NotificationCenter::new(10, 5);
        let now = Utc::now();
        for i in 0..12 {
            center.notify(NotificationKind::Info, &format!("n{i}"), "", None, now);
        }
        assert_eq!(center.recent.len(), 10);
        let titles: Vec<_> = center.recent.iter().map(|n| n.title.clone()).collect();
        assert_eq!(titles.first().map(String::as_str), Some("n11"));
        assert_eq!(titles.last().map(String::as_str), Some("n2"));
    }

    #[test]
    fn test_auto_read_after_delay() {
        let mut center = NotificationCenter::new(10, 5);
        let t0 = Utc::now();
        center.notify(NotificationKind::Success, "old", "", None, t0);
        center.notify(NotificationKind::Success, "new", "", None, t0 + Duration::seconds(3));

        assert_eq!(center.recent.expire(t0 + Duration::seconds(4)), 0);
        assert_eq!(center.recent.expire(t0 + Duration::seconds(5)), 1);
        assert_eq!(center.unread_count(), 1);
        assert_eq!(center.recent.expire(t0 + Duration::seconds(8)), 1);
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_acknowledge_both_populations() {
        let mut center = NotificationCenter::new(10, 5);
        let now = Utc::now();
        let id = center.notify(NotificationKind::Info, "hi", "", None, now);
        center.derived.replace(vec![Notification {
            id: "alert-x".into(),
            kind: NotificationKind::Warning,
            title: "w".into(),
            message: String::new(),
            created_at: now,
            read: false,
            lead_ref: None,
        }]);
        assert_eq!(center.unread_count(), 2);
        assert!(center.acknowledge(&id));
        assert!(center.acknowledge("alert-x"));
        assert!(!center.acknowledge("missing"));
        assert_eq!(center.unread_count(), 0);
    }

    #[test]
    fn test_rebuild_drops_read_flags() {
        let mut center = NotificationCenter::new(10, 5);
        let alert = Notification {
            id: "alert-x".into(),
            kind: NotificationKind::Warning,
            title: "w".into(),
            message: String::new(),
            created_at: Utc::now(),
            read: false,
            lead_ref: None,
        };
        center.derived.replace(vec![alert.clone()]);
        center.mark_all_read();
        center.derived.replace(vec![alert]);
        assert_eq!(center.unread_count(), 1);
    }
}
