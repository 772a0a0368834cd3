//! Bounded history of analysis responses, owned by the HTTP layer

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, VecDeque};

use crate::core::Category;
use crate::models::{AnalyzeRequest, AnalyzeResponse, StatsResponse};
use crate::pipeline::Decision;

/// Ring buffer of the most recent responses, oldest evicted first
pub struct AuditLog {
    entries: VecDeque<AnalyzeResponse>,
    capacity: usize,
    sequence: u64,
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assign an id to a decision and keep the response
    pub fn record(
        &mut self,
        request: &AnalyzeRequest,
        decision: Decision,
        now: DateTime<Utc>,
    ) -> AnalyzeResponse {
        self.sequence += 1;
        let response = AnalyzeResponse {
            prediction_id: format!("pred_{}_{:04}", now.format("%Y%m%d_%H%M%S"), self.sequence),
            venue: request.venue.clone(),
            race_number: request.race_number,
            timestamp: now,
            decision,
        };

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(response.clone());
        response
    }

    pub fn get(&self, prediction_id: &str) -> Option<&AnalyzeResponse> {
        self.entries.iter().find(|r| r.prediction_id == prediction_id)
    }

    /// Aggregates over the retained entries
    pub fn stats(&self) -> StatsResponse {
        let mut category_distribution: BTreeMap<String, usize> = [
            Category::Stable,
            Category::Mixed,
            Category::Upset,
        ]
        .iter()
        .map(|c| (c.to_string(), 0))
        .collect();

        let mut stats = StatsResponse {
            total_predictions: self.entries.len(),
            ..StatsResponse::default()
        };
        let mut stability_sum = 0u64;
        let mut stability_count = 0u64;

        for response in &self.entries {
            let decision = &response.decision;
            if decision.demo_mode() {
                stats.demo_mode_predictions += 1;
            }
            if let Some(stability) = decision.stability() {
                stability_sum += stability as u64;
                stability_count += 1;
            }
            match decision {
                Decision::DataInsufficient { .. } => stats.insufficient_data += 1,
                Decision::Abstain { .. } => stats.skipped_races += 1,
                Decision::Success(analysis) => {
                    stats.successful_predictions += 1;
                    *category_distribution
                        .entry(analysis.category.to_string())
                        .or_default() += 1;
                }
            }
        }

        if stability_count > 0 {
            stats.average_stability = stability_sum as f64 / stability_count as f64;
        }
        stats.category_distribution = category_distribution;
        stats
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{QualityScorer, StrategyResult, TicketOptimizer, TierCandidates};
    use crate::data::odds::OddsTable;
    use crate::data::venue::Venue;
    use crate::models::RaceSnapshot;
    use crate::pipeline::Analysis;
    use chrono::TimeZone;

    fn request() -> AnalyzeRequest {
        AnalyzeRequest {
            venue: "大村".to_string(),
            race_number: 12,
            date: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 30, 15, 4, 5).unwrap()
    }

    fn skip(stability: u8) -> Decision {
        Decision::Abstain {
            category: Category::Upset,
            stability,
            expected_value: 0.0,
            reasons: vec!["race too volatile for insufficient edge".to_string()],
            recommendation: "skip this race".to_string(),
        }
    }

    fn success(category: Category, stability: u8, demo_mode: bool) -> Decision {
        let race = RaceSnapshot {
            venue: Venue::from_code(24).unwrap(),
            date: 20241230,
            race_no: 12,
            boats: Vec::new(),
            odds: OddsTable::default(),
            trials: Vec::new(),
            weather: Default::default(),
            captured_at: now(),
        };
        let strategy: StrategyResult =
            TicketOptimizer::mixed_strategy(&[], &OddsTable::default());
        Decision::Success(Box::new(Analysis {
            category,
            stability,
            description: category.description().to_string(),
            predictions: TierCandidates::default(),
            strategy,
            expected_value: 0.0,
            quality: QualityScorer::score(&race),
            demo_mode,
        }))
    }

    #[test]
    fn test_record_assigns_unique_ids() {
        let mut log = AuditLog::new(10);
        let a = log.record(&request(), skip(20), now());
        let b = log.record(&request(), skip(20), now());

        assert!(a.prediction_id.starts_with("pred_20241230_150405"));
        assert_ne!(a.prediction_id, b.prediction_id);
        assert_eq!(log.len(), 2);
        assert!(log.get(&b.prediction_id).is_some());
    }

    #[test]
    fn test_evicts_oldest() {
        let mut log = AuditLog::new(3);
        let first = log.record(&request(), skip(10), now());
        for _ in 0..3 {
            log.record(&request(), skip(10), now());
        }

        assert_eq!(log.len(), 3);
        assert!(log.get(&first.prediction_id).is_none());
    }

    #[test]
    fn test_stats() {
        let mut log = AuditLog::default();
        log.record(&request(), success(Category::Stable, 80, true), now());
        log.record(&request(), success(Category::Mixed, 50, false), now());
        log.record(&request(), skip(20), now());
        log.record(
            &request(),
            Decision::DataInsufficient {
                quality_score: 0.4,
                missing: Vec::new(),
                recommendation: "skip this race".to_string(),
            },
            now(),
        );

        let stats = log.stats();
        assert_eq!(stats.total_predictions, 4);
        assert_eq!(stats.successful_predictions, 2);
        assert_eq!(stats.skipped_races, 1);
        assert_eq!(stats.insufficient_data, 1);
        assert_eq!(stats.demo_mode_predictions, 1);
        assert!((stats.average_stability - 50.0).abs() < 1e-9);
        assert_eq!(stats.category_distribution["stable"], 1);
        assert_eq!(stats.category_distribution["mixed"], 1);
        assert_eq!(stats.category_distribution["upset"], 0);
    }

    #[test]
    fn test_empty_stats() {
        let stats = AuditLog::new(5).stats();
        assert_eq!(stats.total_predictions, 0);
        assert_eq!(stats.average_stability, 0.0);
        assert_eq!(stats.category_distribution.len(), 3);
    }
}
