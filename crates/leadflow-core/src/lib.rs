//! # Leadflow Core
//!
//! Shared building blocks for the outreach automation core:
//! domain types, the error type, configuration, id generation,
//! the bounded buffer used for rolling collections, and the
//! collaborator traits (channel transport, geocoding lookup).

pub mod bounded;
pub mod config;
pub mod error;
pub mod ids;
pub mod traits;
pub mod types;

pub use bounded::BoundedBuffer;
pub use config::LeadflowConfig;
pub use error::{LeadflowError, Result};
pub use ids::IdGenerator;
pub use traits::{GeoLookup, OutreachMessage, OutreachTransport};
pub use types::*;
