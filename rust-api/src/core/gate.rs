//! Final go/no-go decision

use serde::{Deserialize, Serialize};

use super::quality::RELIABILITY_THRESHOLD;

pub const REASON_NEGATIVE_EV: &str = "expected value is negative";
pub const REASON_VOLATILE: &str = "race too volatile for insufficient edge";
pub const REASON_LOW_QUALITY: &str = "data quality insufficient";

const VOLATILE_STABILITY: u8 = 30;
const VOLATILE_MIN_EV: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub abstain: bool,
    pub reasons: Vec<String>,
}

pub struct AbstentionGate;

impl AbstentionGate {
    /// Collect every abstention reason that applies; abstain if any does
    pub fn evaluate(expected_value: f64, stability: u8, quality: f64) -> Verdict {
        let mut reasons = Vec::new();

        if expected_value < 0.0 {
            reasons.push(REASON_NEGATIVE_EV.to_string());
        }
        if stability < VOLATILE_STABILITY && expected_value < VOLATILE_MIN_EV {
            reasons.push(REASON_VOLATILE.to_string());
        }
        if quality < RELIABILITY_THRESHOLD {
            reasons.push(REASON_LOW_QUALITY.to_string());
        }

        Verdict {
            abstain: !reasons.is_empty(),
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proceed() {
        let verdict = AbstentionGate::evaluate(25.0, 80, 1.0);
        assert!(!verdict.abstain);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn test_negative_ev() {
        let verdict = AbstentionGate::evaluate(-0.1, 80, 1.0);
        assert!(verdict.abstain);
        assert_eq!(verdict.reasons, vec![REASON_NEGATIVE_EV]);
    }

    #[test]
    fn test_volatile_race_needs_large_edge() {
        assert!(AbstentionGate::evaluate(49.9, 29, 1.0).abstain);
        assert!(!AbstentionGate::evaluate(50.0, 29, 1.0).abstain);
        assert!(!AbstentionGate::evaluate(10.0, 30, 1.0).abstain);
    }

    #[test]
    fn test_all_reasons_in_order() {
        let verdict = AbstentionGate::evaluate(-20.0, 10, 0.5);
        assert_eq!(
            verdict.reasons,
            vec![REASON_NEGATIVE_EV, REASON_VOLATILE, REASON_LOW_QUALITY]
        );
    }

    #[test]
    fn test_quality_threshold() {
        assert!(!AbstentionGate::evaluate(0.0, 50, 0.7).abstain);
        assert!(AbstentionGate::evaluate(0.0, 50, 0.69).abstain);
    }
}
