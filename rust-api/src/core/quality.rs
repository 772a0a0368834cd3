//! Data quality scoring
//!
//! Weighted checklist over a fused race record. Weights are kept in
//! hundredths so the score and its threshold comparison are exact.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::RaceSnapshot;

/// Minimum score for a race record to be analysed
pub const RELIABILITY_THRESHOLD: f64 = 0.7;

/// Trifecta odds entries must exceed this count
pub const MIN_TRIFECTA_ODDS: usize = 100;

const BOATS_PER_RACE: usize = 6;

/// Individual quality checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    BoatCount,
    NationalWinRate,
    MotorRate,
    CurrentMeetStats,
    FormAnalysis,
    TrialTimes,
    Odds,
    Weather,
}

impl CheckKind {
    pub const ALL: [CheckKind; 8] = [
        CheckKind::BoatCount,
        CheckKind::NationalWinRate,
        CheckKind::MotorRate,
        CheckKind::CurrentMeetStats,
        CheckKind::FormAnalysis,
        CheckKind::TrialTimes,
        CheckKind::Odds,
        CheckKind::Weather,
    ];

    /// Weight in hundredths; all checks sum to 100
    fn points(self) -> u32 {
        match self {
            CheckKind::TrialTimes | CheckKind::Odds => 20,
            _ => 10,
        }
    }

    pub fn weight(self) -> f64 {
        self.points() as f64 / 100.0
    }

    pub fn label(self) -> &'static str {
        match self {
            CheckKind::BoatCount => "boat count",
            CheckKind::NationalWinRate => "national win rate",
            CheckKind::MotorRate => "motor rate",
            CheckKind::CurrentMeetStats => "current-meet stats",
            CheckKind::FormAnalysis => "form analysis",
            CheckKind::TrialTimes => "trial times",
            CheckKind::Odds => "odds",
            CheckKind::Weather => "weather",
        }
    }

    fn passes(self, race: &RaceSnapshot) -> bool {
        let full_field = race.boats.len() == BOATS_PER_RACE;
        match self {
            CheckKind::BoatCount => full_field,
            CheckKind::NationalWinRate => {
                full_field && race.boats.iter().all(|b| b.national_win_rate > 0.0)
            }
            CheckKind::MotorRate => full_field && race.boats.iter().all(|b| b.motor_in2_rate > 0.0),
            CheckKind::CurrentMeetStats => {
                full_field
                    && race
                        .boats
                        .iter()
                        .all(|b| b.current_period.as_ref().is_some_and(|p| !p.is_empty()))
            }
            CheckKind::FormAnalysis => {
                full_field
                    && race
                        .boats
                        .iter()
                        .all(|b| b.form.as_ref().is_some_and(|f| !f.is_empty()))
            }
            CheckKind::TrialTimes => {
                let boats: HashSet<u8> = race.trials.iter().map(|t| t.boat_no).collect();
                boats.len() == BOATS_PER_RACE
            }
            CheckKind::Odds => race.odds.trifecta.len() > MIN_TRIFECTA_ODDS,
            CheckKind::Weather => race.weather.wind_speed.is_some(),
        }
    }
}

/// Outcome of one check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityCheck {
    pub check: CheckKind,
    pub label: String,
    pub weight: f64,
    pub passed: bool,
}

/// Quality assessment of one race record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: f64,
    pub checks: Vec<QualityCheck>,
    pub is_reliable: bool,
    /// Labels of the failed checks
    pub missing_critical: Vec<String>,
}

impl QualityReport {
    pub fn passed(&self, kind: CheckKind) -> bool {
        self.checks.iter().any(|c| c.check == kind && c.passed)
    }
}

/// Scores completeness of a fused race record
pub struct QualityScorer;

impl QualityScorer {
    pub fn score(race: &RaceSnapshot) -> QualityReport {
        let mut points = 0u32;
        let mut checks = Vec::with_capacity(CheckKind::ALL.len());
        let mut missing_critical = Vec::new();

        for kind in CheckKind::ALL {
            let passed = kind.passes(race);
            if passed {
                points += kind.points();
            } else {
                missing_critical.push(kind.label().to_string());
            }
            checks.push(QualityCheck {
                check: kind,
                label: kind.label().to_string(),
                weight: kind.weight(),
                passed,
            });
        }

        let score = points as f64 / 100.0;

        QualityReport {
            score,
            checks,
            is_reliable: score >= RELIABILITY_THRESHOLD,
            missing_critical,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::odds::trifecta_key;
    use crate::data::venue::Venue;
    use crate::models::{BoatRecord, FormAnalysis, PeriodStats, TrialTime, Weather};
    use chrono::Utc;

    fn complete_race() -> RaceSnapshot {
        let boats = (1..=6)
            .map(|course| BoatRecord {
                national_win_rate: 5.0,
                motor_in2_rate: 30.0,
                current_period: Some(PeriodStats {
                    races: 4,
                    ..PeriodStats::default()
                }),
                form: Some(FormAnalysis {
                    form_score: Some(0.6),
                    ..FormAnalysis::default()
                }),
                ..BoatRecord::new(course)
            })
            .collect();

        let mut race = RaceSnapshot {
            venue: Venue::from_code(24).unwrap(),
            date: 20241230,
            race_no: 12,
            boats,
            odds: Default::default(),
            trials: (1..=6)
                .map(|boat_no| TrialTime {
                    boat_no,
                    time: 6.8,
                    rank: boat_no,
                    start_timing: 0.15,
                })
                .collect(),
            weather: Weather {
                wind_speed: Some(2.0),
                ..Weather::default()
            },
            captured_at: Utc::now(),
        };

        for a in 1..=6 {
            for b in 1..=6 {
                for c in 1..=6 {
                    if a != b && b != c && a != c {
                        race.odds.trifecta.insert(trifecta_key(a, b, c), 10.0);
                    }
                }
            }
        }
        race
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: u32 = CheckKind::ALL.iter().map(|k| k.points()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_complete_race_scores_one() {
        let report = QualityScorer::score(&complete_race());
        assert_eq!(report.score, 1.0);
        assert!(report.is_reliable);
        assert!(report.missing_critical.is_empty());
        assert_eq!(report.checks.len(), 8);
    }

    #[test]
    fn test_missing_trial_times() {
        let mut race = complete_race();
        race.trials.clear();

        let report = QualityScorer::score(&race);
        assert_eq!(report.score, 0.8);
        assert!(report.is_reliable);
        assert_eq!(report.missing_critical, vec!["trial times".to_string()]);
        assert!(!report.passed(CheckKind::TrialTimes));
    }

    #[test]
    fn test_threshold_is_exact() {
        let mut race = complete_race();
        race.trials.clear();
        race.boats[3].form = None;

        let report = QualityScorer::score(&race);
        assert_eq!(report.score, 0.7);
        assert!(report.is_reliable);

        race.weather.wind_speed = None;
        let report = QualityScorer::score(&race);
        assert_eq!(report.score, 0.6);
        assert!(!report.is_reliable);
    }

    #[test]
    fn test_odds_require_more_than_hundred() {
        let mut race = complete_race();
        let keys: Vec<String> = race.odds.trifecta.keys().skip(100).cloned().collect();
        for key in keys {
            race.odds.trifecta.remove(&key);
        }
        assert_eq!(race.odds.trifecta.len(), 100);

        let report = QualityScorer::score(&race);
        assert!(!report.passed(CheckKind::Odds));
        assert_eq!(report.score, 0.8);
    }

    #[test]
    fn test_empty_period_stats_count_as_missing() {
        let mut race = complete_race();
        race.boats[0].current_period = Some(PeriodStats::default());
        race.boats[2].form = Some(FormAnalysis::default());

        let report = QualityScorer::score(&race);
        assert!(!report.passed(CheckKind::CurrentMeetStats));
        assert!(!report.passed(CheckKind::FormAnalysis));
    }

    #[test]
    fn test_short_field_fails_per_boat_checks() {
        let mut race = complete_race();
        race.boats.pop();

        let report = QualityScorer::score(&race);
        assert!(!report.passed(CheckKind::BoatCount));
        assert!(!report.passed(CheckKind::NationalWinRate));
        assert!(!report.passed(CheckKind::MotorRate));
        assert!(!report.is_reliable);
    }

    #[test]
    fn test_zero_rate_fails() {
        let mut race = complete_race();
        race.boats[4].national_win_rate = 0.0;
        race.boats[5].motor_in2_rate = 0.0;

        let report = QualityScorer::score(&race);
        assert!(!report.passed(CheckKind::NationalWinRate));
        assert!(!report.passed(CheckKind::MotorRate));
        assert_eq!(report.score, 0.8);
    }

    #[test]
    fn test_trial_times_need_six_distinct_boats() {
        let mut race = complete_race();
        for trial in &mut race.trials {
            trial.boat_no = 1;
        }

        let report = QualityScorer::score(&race);
        assert_eq!(race.trials.len(), 6);
        assert!(!report.passed(CheckKind::TrialTimes));
        assert_eq!(report.score, 0.8);
    }
}
