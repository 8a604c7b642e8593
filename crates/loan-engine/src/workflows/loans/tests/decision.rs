use chrono::Utc;

use super::common::*;
use crate::workflows::loans::decision::{
    DecisionConfig, DecisionConfigError, DecisionError, DecisionPolicy,
};
use crate::workflows::loans::domain::{DecisionAction, LoanStatus};
use crate::workflows::loans::lifecycle::TransitionError;

fn policy() -> DecisionPolicy {
    DecisionPolicy::new(decision_config())
}

#[test]
fn auto_approves_below_low_threshold() {
    let mut application = pending_application(0.3394);
    let action = policy()
        .auto(&mut application, &reviewer(), Utc::now())
        .expect("low risk auto-approves");
    assert_eq!(action, DecisionAction::Approve);
    assert_eq!(application.status, LoanStatus::Approved);
}

#[test]
fn auto_rejects_above_high_threshold() {
    let mut application = pending_application(0.80);
    let action = policy()
        .auto(&mut application, &reviewer(), Utc::now())
        .expect("high risk auto-rejects");
    assert_eq!(action, DecisionAction::Reject);
    assert_eq!(application.status, LoanStatus::Rejected);
}

#[test]
fn band_defers_without_transition() {
    let mut application = pending_application(0.50);
    let err = policy()
        .auto(&mut application, &reviewer(), Utc::now())
        .expect_err("mid-band risk defers");

    assert!(matches!(
        err,
        DecisionError::RequiresManualReview { risk_score, .. } if risk_score == 0.50
    ));
    assert_eq!(application.status, LoanStatus::Pending);
    assert!(application.decided_at.is_none());

    // a reviewer can still decide the deferred application either way
    policy()
        .manual(
            &mut application,
            DecisionAction::Approve,
            &reviewer(),
            Utc::now(),
        )
        .expect("manual decision always permitted while pending");
    assert_eq!(application.status, LoanStatus::Approved);
}

#[test]
fn band_boundaries_are_inclusive() {
    for risk in [0.35, 0.65] {
        let mut application = pending_application(risk);
        let err = policy()
            .auto(&mut application, &reviewer(), Utc::now())
            .expect_err("boundary scores defer to manual review");
        assert!(matches!(err, DecisionError::RequiresManualReview { .. }));
        assert_eq!(application.status, LoanStatus::Pending);
    }
}

#[test]
fn manual_overrides_any_risk_score() {
    let mut risky = pending_application(1.5);
    policy()
        .manual(&mut risky, DecisionAction::Approve, &reviewer(), Utc::now())
        .expect("manual approval ignores thresholds");
    assert_eq!(risky.status, LoanStatus::Approved);

    let mut safe = pending_application(0.01);
    policy()
        .manual(&mut safe, DecisionAction::Reject, &reviewer(), Utc::now())
        .expect("manual rejection ignores thresholds");
    assert_eq!(safe.status, LoanStatus::Rejected);
}

#[test]
fn auto_checks_role_before_thresholds() {
    let mut application = pending_application(0.50);
    let err = policy()
        .auto(&mut application, &applicant(), Utc::now())
        .expect_err("applicants may not trigger auto decisions");
    assert!(matches!(
        err,
        DecisionError::Transition(TransitionError::Unauthorized)
    ));
}

#[test]
fn auto_reports_already_decided_before_thresholds() {
    let mut application = pending_application(0.80);
    policy()
        .auto(&mut application, &reviewer(), Utc::now())
        .expect("first decision succeeds");

    let err = policy()
        .auto(&mut application, &reviewer(), Utc::now())
        .expect_err("second decision fails");
    assert!(matches!(
        err,
        DecisionError::Transition(TransitionError::AlreadyDecided { .. })
    ));
}

#[test]
fn config_rejects_inverted_band() {
    let err = DecisionConfig {
        low_threshold: 0.7,
        high_threshold: 0.3,
        max_pending_per_applicant: 2,
    }
    .validated()
    .expect_err("inverted band is invalid");
    assert!(matches!(err, DecisionConfigError::ThresholdOrder { .. }));
}

#[test]
fn config_rejects_non_finite_thresholds() {
    let err = DecisionConfig {
        low_threshold: f64::NAN,
        high_threshold: 0.65,
        max_pending_per_applicant: 2,
    }
    .validated()
    .expect_err("NaN threshold is invalid");
    assert!(matches!(err, DecisionConfigError::NonFiniteThreshold));
}

#[test]
fn config_accepts_degenerate_empty_band() {
    // low == high means every score on the point still defers; both sides
    // remain independently adjustable
    let config = DecisionConfig {
        low_threshold: 0.5,
        high_threshold: 0.5,
        max_pending_per_applicant: 1,
    }
    .validated()
    .expect("equal thresholds are allowed");
    assert_eq!(config.low_threshold, config.high_threshold);
}
