//! Collaborator boundaries: outreach transport and geocoding lookup.
//!
//! The core only records intent to send. Real senders plug in behind
//! [`OutreachTransport`]; the lookup is a fallible async call the core
//! never depends on.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Channel, Coordinates, JobKind};

/// Everything a transport needs to deliver one outreach message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutreachMessage {
    pub job_id: Option<String>,
    pub lead_id: String,
    pub lead_name: String,
    pub channel: Channel,
    pub kind: JobKind,
    pub template_ref: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Abstract "send via channel" capability.
#[async_trait]
pub trait OutreachTransport: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this transport can deliver on `channel`.
    fn supports(&self, channel: Channel) -> bool;

    async fn send(&self, message: &OutreachMessage) -> Result<()>;
}

/// Free-text location lookup. `Ok(None)` means "not found".
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>>;
}
