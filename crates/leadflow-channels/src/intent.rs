//! Intent-only transport: records what would be sent, sends nothing.

use std::sync::Mutex;

use async_trait::async_trait;
use leadflow_core::{Channel, OutreachMessage, OutreachTransport, Result};

#[derive(Debug, Default)]
pub struct IntentLogTransport {
    sent: Mutex<Vec<OutreachMessage>>,
}

impl IntentLogTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages handed to this transport so far.
    pub fn sent(&self) -> Vec<OutreachMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OutreachTransport for IntentLogTransport {
    fn name(&self) -> &str {
        "intent-log"
    }

    fn supports(&self, _channel: Channel) -> bool {
        true
    }

    async fn send(&self, message: &OutreachMessage) -> Result<()> {
        tracing::info!(
            "📨 [{}] would send '{}' to {} (template: {})",
            message.channel,
            message.subject,
            message.lead_name,
            message.template_ref.as_deref().unwrap_or("-")
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}
