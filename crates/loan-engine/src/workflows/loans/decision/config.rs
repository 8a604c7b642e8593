use serde::{Deserialize, Serialize};

/// Dials governing automatic decisions and admission control. All three are
/// independently adjustable; the thresholds bound the manual-review band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    pub low_threshold: f64,
    pub high_threshold: f64,
    pub max_pending_per_applicant: u32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            low_threshold: 0.35,
            high_threshold: 0.65,
            max_pending_per_applicant: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DecisionConfigError {
    #[error("low threshold {low} must not exceed high threshold {high}")]
    ThresholdOrder { low: f64, high: f64 },
    #[error("decision thresholds must be finite numbers")]
    NonFiniteThreshold,
}

impl DecisionConfig {
    /// Validate at startup; a misordered band must fail fast, not at the
    /// first auto-decision.
    pub fn validated(self) -> Result<Self, DecisionConfigError> {
        if !self.low_threshold.is_finite() || !self.high_threshold.is_finite() {
            return Err(DecisionConfigError::NonFiniteThreshold);
        }
        if self.low_threshold > self.high_threshold {
            return Err(DecisionConfigError::ThresholdOrder {
                low: self.low_threshold,
                high: self.high_threshold,
            });
        }
        Ok(self)
    }
}
