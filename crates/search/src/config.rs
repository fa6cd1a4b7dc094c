use serde::{Deserialize, Serialize};

use crate::fuzzy::{default_field_weights, FieldWeight, DEFAULT_FUZZY_THRESHOLD};
use crate::normalize::DEFAULT_SIMILARITY_THRESHOLD;

/// Tunables for the matcher. Defaults are the parity constants, not proven optima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Homophone tier: comparable forms must be more similar than this.
    pub similarity_threshold: f64,
    /// Fuzzy tier: per-field distance must be at most this.
    pub fuzzy_threshold: f64,
    pub field_weights: Vec<FieldWeight>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            field_weights: default_field_weights(),
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by `CANTEEN_SIMILARITY_THRESHOLD` / `CANTEEN_FUZZY_THRESHOLD`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(v) = env_unit_f64("CANTEEN_SIMILARITY_THRESHOLD") { cfg.similarity_threshold = v; }
        if let Some(v) = env_unit_f64("CANTEEN_FUZZY_THRESHOLD") { cfg.fuzzy_threshold = v; }
        cfg
    }
}

fn env_unit_f64(key: &str) -> Option<f64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring threshold outside 0..=1");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_parity_constants() {
        let c = SearchConfig::default();
        assert_eq!(c.similarity_threshold, 0.7);
        assert_eq!(c.field_weights.len(), 4);
        assert_eq!(c.field_weights[0].weight, 2.0);
    }
}
