//! Race analysis pipeline
//!
//! fusion -> quality -> classification -> likelihoods -> ranking
//! -> tickets -> abstention gate

use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{AppConfig, FetchConfig};
use crate::core::{
    AbstentionGate, Category, OutcomeRanker, QualityReport, QualityScorer, RaceClassifier,
    StrategyResult, TicketOptimizer, TierCandidates,
};
use crate::data::{DataFusion, DataSource, FeatureEngineering, FileDataSource, Venue};
use crate::error::{validate_race_number, AnalysisError};
use crate::models::{AnalyzeRequest, RaceSnapshot};
use crate::predictor::{
    check_likelihoods, load_estimator, FallbackPredictor, LikelihoodEstimator, Likelihoods,
};

const ABSTAIN_RECOMMENDATION: &str = "skip this race";

/// Outcome of one race analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    /// Quality below the reliability threshold; nothing else was computed
    DataInsufficient {
        quality_score: f64,
        missing: Vec<String>,
        recommendation: String,
    },
    Abstain {
        category: Category,
        stability: u8,
        expected_value: f64,
        reasons: Vec<String>,
        recommendation: String,
    },
    Success(Box<Analysis>),
}

impl Decision {
    pub fn status(&self) -> &'static str {
        match self {
            Decision::DataInsufficient { .. } => "data_insufficient",
            Decision::Abstain { .. } => "abstain",
            Decision::Success(_) => "success",
        }
    }

    pub fn stability(&self) -> Option<u8> {
        match self {
            Decision::DataInsufficient { .. } => None,
            Decision::Abstain { stability, .. } => Some(*stability),
            Decision::Success(analysis) => Some(analysis.stability),
        }
    }

    pub fn demo_mode(&self) -> bool {
        matches!(self, Decision::Success(analysis) if analysis.demo_mode)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub category: Category,
    pub stability: u8,
    pub description: String,
    pub predictions: TierCandidates,
    pub strategy: StrategyResult,
    pub expected_value: f64,
    pub quality: QualityReport,
    /// Likelihoods came from the heuristic rather than a trained model
    pub demo_mode: bool,
}

pub struct Pipeline {
    fusion: DataFusion,
    estimator: Option<Arc<dyn LikelihoodEstimator>>,
    fallback: FallbackPredictor,
}

impl Pipeline {
    pub fn new(source: Arc<dyn DataSource>, fetch: FetchConfig) -> Self {
        Self {
            fusion: DataFusion::new(source, fetch),
            estimator: None,
            fallback: FallbackPredictor::new(),
        }
    }

    /// File-backed pipeline with the configured model, if any
    pub fn from_config(config: &AppConfig) -> Self {
        info!("Reading race data from {:?}", config.data.data_dir);
        let source = Arc::new(FileDataSource::new(&config.data.data_dir));
        let pipeline = Self::new(source, config.fetch.clone());
        match load_estimator(config.data.model_path.as_deref()) {
            Some(estimator) => pipeline.with_estimator(estimator),
            None => pipeline,
        }
    }

    pub fn with_estimator(mut self, estimator: Arc<dyn LikelihoodEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub fn model_loaded(&self) -> bool {
        self.estimator.as_ref().is_some_and(|e| e.is_available())
    }

    /// Validate the request, fuse the race data and evaluate it
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<Decision, AnalysisError> {
        let venue = Venue::parse(&request.venue)
            .ok_or_else(|| AnalysisError::InvalidVenue(request.venue.clone()))?;
        validate_race_number(request.race_number)?;
        let date = request.date.unwrap_or_else(today);

        info!("Analysis request: {} {}R ({})", venue, request.race_number, date);

        let race = self.fusion.fuse(venue, date, request.race_number).await?;
        Ok(self.evaluate(&race))
    }

    /// Run the decision steps over a fused race record
    pub fn evaluate(&self, race: &RaceSnapshot) -> Decision {
        let quality = QualityScorer::score(race);
        if !quality.is_reliable {
            warn!(
                "Data quality insufficient: {:.0}% (missing: {})",
                quality.score * 100.0,
                quality.missing_critical.join(", ")
            );
            return Decision::DataInsufficient {
                quality_score: quality.score,
                missing: quality.missing_critical,
                recommendation: ABSTAIN_RECOMMENDATION.to_string(),
            };
        }

        let classification = RaceClassifier::classify(race);
        info!(
            "Classified as {} (stability {})",
            classification.category, classification.stability
        );

        let (likelihoods, demo_mode) = self.likelihoods(race);
        let predictions = OutcomeRanker::rank_tiers(&likelihoods);

        let strategy = TicketOptimizer::optimize(&predictions, &race.odds, classification.stability);
        let expected_value = strategy.expected_value.unwrap_or(0.0);
        info!(
            "Strategy: {} ({} tickets, stake {})",
            strategy.label,
            strategy.tickets.len(),
            strategy.total_stake
        );

        let verdict = AbstentionGate::evaluate(expected_value, classification.stability, quality.score);
        if verdict.abstain {
            info!("Abstain: {}", verdict.reasons.join(", "));
            return Decision::Abstain {
                category: classification.category,
                stability: classification.stability,
                expected_value,
                reasons: verdict.reasons,
                recommendation: ABSTAIN_RECOMMENDATION.to_string(),
            };
        }

        Decision::Success(Box::new(Analysis {
            category: classification.category,
            stability: classification.stability,
            description: classification.description,
            predictions,
            strategy,
            expected_value,
            quality,
            demo_mode,
        }))
    }

    /// Likelihoods from the injected estimator, or the heuristic when it is
    /// missing, unavailable, fails or returns unusable values. The flag is set when the heuristic was used.
    fn likelihoods(&self, race: &RaceSnapshot) -> (Likelihoods, bool) {
        let features = FeatureEngineering::create_race_features(race);

        if let Some(estimator) = self.estimator.as_ref().filter(|e| e.is_available()) {
            match estimator.predict(&features).and_then(check_likelihoods) {
                Ok(likelihoods) => return (likelihoods, false),
                Err(e) => warn!("{} estimator failed, using heuristic: {}", estimator.name(), e),
            }
        }

        (self.fallback.likelihoods(&features), true)
    }
}

/// Today's date as YYYYMMDD
fn today() -> u32 {
    let now = Local::now();
    now.year() as u32 * 10_000 + now.month() * 100 + now.day()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::odds::trifecta_key;
    use crate::data::source::MockDataSource;
    use crate::models::{BoatRecord, FormAnalysis, PeriodStats, TrialTime, Weather};
    use chrono::Utc;

    fn race(wind: f64, odds: f64) -> RaceSnapshot {
        let mut race = RaceSnapshot {
            venue: Venue::from_code(24).unwrap(),
            date: 20241230,
            race_no: 12,
            boats: (1..=6)
                .map(|course| BoatRecord {
                    national_win_rate: 5.0,
                    motor_in2_rate: 30.0,
                    current_period: Some(PeriodStats {
                        races: 4,
                        ..PeriodStats::default()
                    }),
                    form: Some(FormAnalysis {
                        form_score: Some(0.5),
                        ..FormAnalysis::default()
                    }),
                    ..BoatRecord::new(course)
                })
                .collect(),
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
                wind_speed: Some(wind),
                ..Weather::default()
            },
            captured_at: Utc::now(),
        };
        for [a, b, c] in OutcomeRanker::enumerate() {
            race.odds.trifecta.insert(trifecta_key(a, b, c), odds);
        }
        race
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(MockDataSource::new()), FetchConfig::default())
    }

    #[test]
    fn test_uniform_race_succeeds_in_demo_mode() {
        let decision = pipeline().evaluate(&race(0.0, 10.0));
        let Decision::Success(analysis) = decision else {
            panic!("expected success");
        };
        assert_eq!(analysis.category, Category::Stable);
        assert_eq!(analysis.stability, 100);
        assert!(analysis.demo_mode);
        assert_eq!(analysis.strategy.tickets.len(), 1);
        assert_eq!(analysis.strategy.tickets[0].stake, 2500);
        assert!(analysis.expected_value > 0.0);
    }

    #[test]
    fn test_low_quality_short_circuits() {
        let mut race = race(0.0, 10.0);
        race.trials.clear();
        race.weather.wind_speed = None;
        race.boats[0].form = None;

        let decision = pipeline().evaluate(&race);
        match decision {
            Decision::DataInsufficient { quality_score, missing, .. } => {
                assert_eq!(quality_score, 0.6);
                assert!(missing.contains(&"trial times".to_string()));
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_volatile_race_abstains() {
        // wind 30 m/s drives stability to 10, mixed/upset tiers carry no EV
        let decision = pipeline().evaluate(&race(30.0, 10.0));
        match decision {
            Decision::Abstain { stability, reasons, .. } => {
                assert_eq!(stability, 10);
                assert_eq!(reasons, vec!["race too volatile for insufficient edge"]);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_negative_ev_abstains() {
        let decision = pipeline().evaluate(&race(0.0, 1.5));
        match decision {
            Decision::Abstain { expected_value, reasons, category, .. } => {
                assert!(expected_value < 0.0);
                assert_eq!(category, Category::Stable);
                assert_eq!(reasons, vec!["expected value is negative"]);
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_input_rejected_before_fetch() {
        let mut source = MockDataSource::new();
        source.expect_fetch_base_race().never();
        let pipeline = Pipeline::new(Arc::new(source), FetchConfig::default());

        let err = pipeline
            .analyze(&AnalyzeRequest {
                venue: "東京".to_string(),
                race_number: 1,
                date: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidVenue(_)));

        let err = pipeline
            .analyze(&AnalyzeRequest {
                venue: "大村".to_string(),
                race_number: 13,
                date: Some(20241230),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRaceNumber(13)));
    }

    #[test]
    fn test_decision_serializes_with_status_tag() {
        let decision = Decision::DataInsufficient {
            quality_score: 0.5,
            missing: vec!["odds".to_string()],
            recommendation: ABSTAIN_RECOMMENDATION.to_string(),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["status"], "data_insufficient");
        assert_eq!(json["missing"][0], "odds");
        assert_eq!(decision.status(), "data_insufficient");
        assert_eq!(decision.stability(), None);
    }

    #[test]
    fn test_today_format() {
        let date = today();
        assert!(date > 20000101 && date < 99991231);
    }
}
