//! Race stability classification
//!
//! Six race-wide factors adjust a base score of 100; the clamped score picks
//! the category and with it the candidate tier used downstream.

use serde::{Deserialize, Serialize};

use super::ranker::Tier;
use crate::data::features::{course1_advantage, spread, variance};
use crate::models::RaceSnapshot;

pub const STABLE_THRESHOLD: u8 = 70;
pub const MIXED_THRESHOLD: u8 = 40;

/// Race category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Stable,
    Mixed,
    Upset,
}

impl Category {
    pub fn from_stability(stability: u8) -> Self {
        if stability >= STABLE_THRESHOLD {
            Category::Stable
        } else if stability >= MIXED_THRESHOLD {
            Category::Mixed
        } else {
            Category::Upset
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Stable => "stable",
            Category::Mixed => "mixed",
            Category::Upset => "upset",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Category::Stable => "Solid race: favorites expected to hold, narrow focus on the top pick",
            Category::Mixed => "Mixed race: several contenders, spread across balanced picks",
            Category::Upset => "Volatile race: upset likely, long shots only where the odds pay",
        }
    }

    /// Candidate tier recommended for this category
    pub fn tier(self) -> Tier {
        match self {
            Category::Stable => Tier::Favorite,
            Category::Mixed => Tier::Balanced,
            Category::Upset => Tier::LongShot,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw factor values behind a stability score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationFactors {
    pub rate_variance: f64,
    pub rate_spread: f64,
    pub odds_variance: f64,
    pub course1_advantage: f64,
    pub wind_speed: f64,
    pub motor_spread: f64,
}

impl ClassificationFactors {
    /// Weighted stability score, clamped to [0, 100]
    pub fn stability(&self) -> f64 {
        let score = 100.0 - self.rate_variance * 2.0 + self.rate_spread * 0.5
            + self.course1_advantage * 5.0
            - self.odds_variance * 0.5
            - self.wind_speed * 3.0
            - self.motor_spread * 0.3;
        if score.is_nan() {
            return 0.0;
        }
        score.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: Category,
    pub stability: u8,
    pub description: String,
    pub tier: Tier,
    pub factors: ClassificationFactors,
}

pub struct RaceClassifier;

impl RaceClassifier {
    pub fn classify(race: &RaceSnapshot) -> Classification {
        let factors = Self::extract_factors(race);
        let stability = factors.stability() as u8;
        let category = Category::from_stability(stability);

        Classification {
            category,
            stability,
            description: category.description().to_string(),
            tier: category.tier(),
            factors,
        }
    }

    pub fn extract_factors(race: &RaceSnapshot) -> ClassificationFactors {
        let win_rates = race.win_rates();
        let odds: Vec<f64> = race.odds.trifecta.values().copied().collect();

        ClassificationFactors {
            rate_variance: variance(&win_rates),
            rate_spread: spread(&win_rates),
            odds_variance: variance(&odds),
            course1_advantage: course1_advantage(race),
            wind_speed: race.weather.wind_speed.unwrap_or(0.0),
            motor_spread: spread(&race.motor_rates()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::odds::trifecta_key;
    use crate::data::venue::Venue;
    use crate::models::{BoatRecord, Weather};
    use chrono::Utc;

    fn race(win_rates: [f64; 6], wind: Option<f64>) -> RaceSnapshot {
        RaceSnapshot {
            venue: Venue::from_code(18).unwrap(),
            date: 20241230,
            race_no: 5,
            boats: win_rates
                .iter()
                .enumerate()
                .map(|(i, &rate)| BoatRecord {
                    national_win_rate: rate,
                    motor_in2_rate: 30.0,
                    ..BoatRecord::new(i as u8 + 1)
                })
                .collect(),
            odds: Default::default(),
            trials: Vec::new(),
            weather: Weather {
                wind_speed: wind,
                ..Weather::default()
            },
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(Category::from_stability(100), Category::Stable);
        assert_eq!(Category::from_stability(70), Category::Stable);
        assert_eq!(Category::from_stability(69), Category::Mixed);
        assert_eq!(Category::from_stability(40), Category::Mixed);
        assert_eq!(Category::from_stability(39), Category::Upset);
        assert_eq!(Category::from_stability(0), Category::Upset);
    }

    #[test]
    fn test_category_tiers() {
        assert_eq!(Category::Stable.tier(), Tier::Favorite);
        assert_eq!(Category::Mixed.tier(), Tier::Balanced);
        assert_eq!(Category::Upset.tier(), Tier::LongShot);
    }

    #[test]
    fn test_uniform_race_is_fully_stable() {
        let mut race = race([5.0; 6], Some(0.0));
        for a in 1..=6 {
            for b in 1..=6 {
                for c in 1..=6 {
                    if a != b && b != c && a != c {
                        race.odds.trifecta.insert(trifecta_key(a, b, c), 10.0);
                    }
                }
            }
        }

        let result = RaceClassifier::classify(&race);
        assert_eq!(result.stability, 100);
        assert_eq!(result.category, Category::Stable);
        assert_eq!(result.factors.odds_variance, 0.0);
        assert_eq!(result.factors.course1_advantage, 0.0);
    }

    #[test]
    fn test_wind_lowers_stability() {
        // 100 - 3 * 12
        let result = RaceClassifier::classify(&race([5.0; 6], Some(12.0)));
        assert_eq!(result.stability, 64);
        assert_eq!(result.category, Category::Mixed);
    }

    #[test]
    fn test_missing_wind_counts_as_calm() {
        let result = RaceClassifier::classify(&race([5.0; 6], None));
        assert_eq!(result.factors.wind_speed, 0.0);
        assert_eq!(result.stability, 100);
    }

    #[test]
    fn test_strong_course1_raises_score() {
        let weak = RaceClassifier::classify(&race([4.0, 6.0, 6.0, 6.0, 6.0, 6.0], Some(10.0)));
        let strong = RaceClassifier::classify(&race([8.0, 5.0, 5.0, 5.0, 5.0, 5.0], Some(10.0)));
        assert!(strong.factors.course1_advantage > 0.0);
        assert!(weak.factors.course1_advantage < 0.0);
        assert!(strong.stability > weak.stability);
    }

    #[test]
    fn test_volatile_odds_push_to_upset() {
        let mut race = race([5.0; 6], Some(2.0));
        race.odds.trifecta.insert(trifecta_key(1, 2, 3), 2.0);
        race.odds.trifecta.insert(trifecta_key(6, 5, 4), 40.0);

        let result = RaceClassifier::classify(&race);
        // odds variance 361 alone drives the score to the floor
        assert_eq!(result.stability, 0);
        assert_eq!(result.category, Category::Upset);
    }

    #[test]
    fn test_stability_is_clamped() {
        let factors = ClassificationFactors {
            rate_variance: 0.0,
            rate_spread: 0.0,
            odds_variance: 0.0,
            course1_advantage: 20.0,
            wind_speed: 0.0,
            motor_spread: 0.0,
        };
        assert_eq!(factors.stability(), 100.0);
    }
}
