//! Geocoding via a Nominatim-compatible search endpoint.

use async_trait::async_trait;
use leadflow_core::config::GeoConfig;
use leadflow_core::{Coordinates, GeoLookup, LeadflowError, Result};

pub struct NominatimLookup {
    config: GeoConfig,
    client: reqwest::Client,
}

impl NominatimLookup {
    pub fn new(config: GeoConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// First hit of a Nominatim JSON response, if any.
    fn parse(body: &serde_json::Value) -> Result<Option<Coordinates>> {
        let Some(first) = body.as_array().and_then(|hits| hits.first()) else {
            return Ok(None);
        };
        let coord = |key: &str| -> Result<f64> {
            let raw = &first[key];
            raw.as_str()
                .and_then(|s| s.parse::<f64>().ok())
                .or_else(|| raw.as_f64())
                .ok_or_else(|| LeadflowError::Lookup(format!("missing or invalid '{key}' in response")))
        };
        Ok(Some(Coordinates {
            lat: coord("lat")?,
            lon: coord("lon")?,
        }))
    }
}

#[async_trait]
impl GeoLookup for NominatimLookup {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let resp = self
            .client
            .get(&self.config.base_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .header("User-Agent", &self.config.user_agent)
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| LeadflowError::Lookup(format!("Geocoding request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(LeadflowError::Lookup(format!("Geocoding error {}", resp.status())));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| LeadflowError::Lookup(format!("Invalid geocoding response: {e}")))?;
        let found = Self::parse(&body)?;
        tracing::debug!("🗺️ Geocoded '{query}': {found:?}");
        Ok(found)
    }
}
