//! # Leadflow Channels
//! Outreach transports and the geocoding lookup.
//!
//! The built-in [`IntentLogTransport`] never talks to the outside world;
//! it logs what would have been sent and always succeeds. Real senders
//! implement [`leadflow_core::OutreachTransport`] and register with the
//! [`TransportRouter`].

pub mod geo;
pub mod intent;
pub mod router;
pub mod webhook;

pub use geo::NominatimLookup;
pub use intent::IntentLogTransport;
pub use router::TransportRouter;
pub use webhook::WebhookTransport;
