//! Cadence catalog: reusable ordered step templates.

use leadflow_core::{Cadence, CadenceStep, IdGenerator, LeadflowError, Result};

#[derive(Debug, Default)]
pub struct CadenceCatalog {
    cadences: Vec<Cadence>,
    ids: IdGenerator,
}

impl CadenceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cadence. Steps keep their declared order.
    pub fn create(&mut self, name: &str, steps: Vec<CadenceStep>, pause_on_reply: bool) -> Result<Cadence> {
        if name.trim().is_empty() {
            return Err(LeadflowError::validation("cadence name is required"));
        }
        if steps.is_empty() {
            return Err(LeadflowError::validation("cadence needs at least one step"));
        }
        if let Some(step) = steps.iter().find(|s| s.template_ref.trim().is_empty()) {
            return Err(LeadflowError::validation(format!(
                "{} step at day {} has no template",
                step.channel, step.delay_days
            )));
        }
        let cadence = Cadence {
            id: self.ids.next("cad"),
            name: name.trim().to_string(),
            steps,
            pause_on_reply,
        };
        tracing::info!("🗂️ Cadence created: '{}' ({} steps)", cadence.name, cadence.steps.len());
        self.cadences.push(cadence.clone());
        Ok(cadence)
    }

    pub fn get(&self, id: &str) -> Option<&Cadence> {
        self.cadences.iter().find(|c| c.id == id)
    }

    pub fn list(&self) -> &[Cadence] {
        &self.cadences
    }
}
