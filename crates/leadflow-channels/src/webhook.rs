//! Generic HTTP webhook transport: POSTs each outreach as JSON.
//!
//! Lets an external sender (mail relay, WhatsApp gateway, automation
//! tool) do the actual delivery.

use async_trait::async_trait;
use leadflow_core::config::WebhookConfig;
use leadflow_core::{Channel, LeadflowError, OutreachMessage, OutreachTransport, Result};

pub struct WebhookTransport {
    url: String,
    headers: Vec<(String, String)>,
    channels: Vec<Channel>,
    client: reqwest::Client,
}

impl WebhookTransport {
    /// Webhook for the messaging channels (calls and meetings are not sendable).
    pub fn new(url: &str, headers: Vec<(String, String)>) -> Self {
        Self {
            url: url.to_string(),
            headers,
            channels: vec![
                Channel::Email,
                Channel::Whatsapp,
                Channel::Instagram,
                Channel::Linkedin,
            ],
            client: reqwest::Client::new(),
        }
    }

    /// Build from config, if a webhook is configured and enabled.
    pub fn from_config(config: &WebhookConfig) -> Option<Self> {
        (config.enabled && !config.url.is_empty())
            .then(|| Self::new(&config.url, config.headers.clone()))
    }

    /// Restrict the channels this webhook handles.
    pub fn with_channels(mut self, channels: Vec<Channel>) -> Self {
        self.channels = channels;
        self
    }

    fn payload(message: &OutreachMessage) -> serde_json::Value {
        serde_json::json!({
            "job_id": message.job_id,
            "lead_id": message.lead_id,
            "lead_name": message.lead_name,
            "channel": message.channel,
            "kind": message.kind,
            "template": message.template_ref,
            "subject": message.subject,
            "body": message.body,
        })
    }
}

#[async_trait]
impl OutreachTransport for WebhookTransport {
    fn name(&self) -> &str {
        "webhook"
    }

    fn supports(&self, channel: Channel) -> bool {
        self.channels.contains(&channel)
    }

    async fn send(&self, message: &OutreachMessage) -> Result<()> {
        let mut req = self
            .client
            .post(&self.url)
            .json(&Self::payload(message))
            .timeout(std::time::Duration::from_secs(10));
        for (key, value) in &self.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| LeadflowError::Channel(format!("Webhook send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("✅ Webhook outreach sent to {}: {}", self.url, message.subject);
            Ok(())
        } else {
            let status = resp.status();
            Err(LeadflowError::Channel(format!("Webhook error {status}")))
        }
    }
}
