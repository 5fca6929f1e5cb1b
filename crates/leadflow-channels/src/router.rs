//! Transport router: picks the best registered transport per channel.

use std::sync::Arc;

use leadflow_core::config::ChannelsConfig;
use leadflow_core::{Channel, LeadflowError, OutreachMessage, OutreachTransport, Result};

use crate::intent::IntentLogTransport;
use crate::webhook::WebhookTransport;

struct Route {
    transport: Arc<dyn OutreachTransport>,
    /// Lower = preferred.
    priority: u8,
}

#[derive(Default)]
pub struct TransportRouter {
    routes: Vec<Route>,
}

impl TransportRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configured transports, with the intent log as last resort.
    pub fn from_config(config: &ChannelsConfig) -> Self {
        let mut router = Self::new();
        if let Some(wh) = config.webhook.as_ref().and_then(WebhookTransport::from_config) {
            router.register(Arc::new(wh), 10);
        }
        router.register(Arc::new(IntentLogTransport::new()), u8::MAX);
        router
    }

    pub fn register(&mut self, transport: Arc<dyn OutreachTransport>, priority: u8) {
        tracing::debug!("🔌 Transport registered: {} (priority {priority})", transport.name());
        self.routes.push(Route { transport, priority });
        self.routes.sort_by_key(|r| r.priority);
    }

    /// Best transport for `channel`.
    pub fn route(&self, channel: Channel) -> Option<&Arc<dyn OutreachTransport>> {
        self.routes
            .iter()
            .find(|r| r.transport.supports(channel))
            .map(|r| &r.transport)
    }

    /// Deliver through the best transport, returning its name.
    pub async fn deliver(&self, message: &OutreachMessage) -> Result<String> {
        let transport = self.route(message.channel).ok_or_else(|| {
            LeadflowError::Channel(format!("no transport for {}", message.channel))
        })?;
        transport.send(message).await?;
        Ok(transport.name().to_string())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
