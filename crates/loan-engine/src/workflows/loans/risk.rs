use serde::{Deserialize, Serialize};

use super::domain::{InvalidLoanInput, LoanTerms};

const DEBT_RATIO_WEIGHT: f64 = 0.5;
const CREDIT_FACTOR_WEIGHT: f64 = 0.4;
const TERM_FACTOR_WEIGHT: f64 = 0.1;

/// Intermediate factors behind a risk score, kept for the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub debt_ratio: f64,
    pub credit_factor: f64,
    pub term_factor: f64,
    pub risk_score: f64,
}

/// Fixed-weight closed-form risk model. Pure and deterministic: identical
/// inputs yield bit-identical scores, and concurrent calls are safe.
///
/// The formula applies no clamping. `debt_ratio` exceeds 1.0 whenever the
/// requested amount exceeds annual income, so the score is unbounded above;
/// callers must not assume `risk_score <= 1.0`.
pub struct RiskScorer;

impl RiskScorer {
    pub fn breakdown(terms: &LoanTerms) -> Result<RiskBreakdown, InvalidLoanInput> {
        terms.validate()?;

        let debt_ratio = terms.amount / terms.income;
        let credit_factor = f64::from(850 - terms.credit_score) / 550.0;
        let term_factor = f64::from(terms.term_months) / 360.0;

        let risk_score = DEBT_RATIO_WEIGHT * debt_ratio
            + CREDIT_FACTOR_WEIGHT * credit_factor
            + TERM_FACTOR_WEIGHT * term_factor;

        Ok(RiskBreakdown {
            debt_ratio,
            credit_factor,
            term_factor,
            risk_score,
        })
    }

    pub fn score(terms: &LoanTerms) -> Result<f64, InvalidLoanInput> {
        Self::breakdown(terms).map(|breakdown| breakdown.risk_score)
    }
}

/// Reporting-only derived value; never an input to a transition.
pub fn approval_chance(risk_score: f64) -> f64 {
    1.0 - risk_score
}
