//! Lead scoring: a pure function of the lead's attributes.
//!
//! ```text
//! stage base   prospecting 20 · sample 40 · qualified 60 · negotiation 80 · post-sale 100 · lost 0
//! value tier   >100k +30 · >50k +20 · >20k +10 · else 0
//! engagement   ≤7d +20 · ≤15d +15 · ≤30d +10 · >30d −10 · unknown 0
//! interest     min(2 × products, 10)
//! ```
//! The sum is clamped to 0..=100.

use leadflow_core::{Lead, Stage};
use serde::Serialize;

pub const MAX_SCORE: i32 = 100;

/// Per-component contributions, before clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub stage: i32,
    pub value: i32,
    pub engagement: i32,
    pub interest: i32,
}

impl ScoreBreakdown {
    pub fn of(lead: &Lead) -> Self {
        Self {
            stage: stage_base(lead.stage),
            value: value_bonus(lead.estimated_value),
            engagement: engagement(lead.days_inactive),
            interest: interest_bonus(lead.interested_products.len()),
        }
    }

    pub fn raw(&self) -> i32 {
        self.stage + self.value + self.engagement + self.interest
    }

    pub fn score(&self) -> u8 {
        self.raw().clamp(0, MAX_SCORE) as u8
    }
}

/// Score a lead. Deterministic, no side effects.
pub fn compute_score(lead: &Lead) -> u8 {
    ScoreBreakdown::of(lead).score()
}

pub fn stage_base(stage: Stage) -> i32 {
    match stage {
        Stage::Prospecting => 20,
        Stage::Sample => 40,
        Stage::Qualified => 60,
        Stage::Negotiation => 80,
        Stage::PostSale => 100,
        Stage::Lost => 0,
    }
}

pub fn value_bonus(value: Option<f64>) -> i32 {
    match value {
        Some(v) if v > 100_000.0 => 30,
        Some(v) if v > 50_000.0 => 20,
        Some(v) if v > 20_000.0 => 10,
        _ => 0,
    }
}

pub fn engagement(days_inactive: Option<u32>) -> i32 {
    match days_inactive {
        None => 0,
        Some(d) if d <= 7 => 20,
        Some(d) if d <= 15 => 15,
        Some(d) if d <= 30 => 10,
        Some(_) => -10,
    }
}

pub fn interest_bonus(products: usize) -> i32 {
    (products.saturating_mul(2)).min(10) as i32
}
