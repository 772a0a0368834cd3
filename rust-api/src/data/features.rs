//! Feature Engineering
//!
//! Generate model features from the fused race record: racer, motor and
//! boat statistics, meet and form data, trial times, odds and weather.

use serde::{Deserialize, Serialize};

use crate::models::{BoatRecord, RaceSnapshot};

/// Number of values produced by `RaceFeatures::to_vec`
pub const NUM_FEATURES: usize = 6 * (BASE_LEN + PERIOD_LEN + EXHIBITION_LEN + ODDS_LEN + RELATIVE_LEN)
    + WEATHER_LEN
    + RACE_LEN;

const BASE_LEN: usize = 8;
const PERIOD_LEN: usize = 10;
const EXHIBITION_LEN: usize = 3;
const ODDS_LEN: usize = 2;
const RELATIVE_LEN: usize = 2;
const WEATHER_LEN: usize = 3;
const RACE_LEN: usize = 4;

/// Average trifecta odds assumed for a boat without quotes
const DEFAULT_AVERAGE_ODDS: f64 = 50.0;
/// Venue win rate assumed when the racer has no venue record
const DEFAULT_VENUE_WIN_RATE: f64 = 0.2;
/// Cap on the consecutive win streak
const MAX_STREAK: u32 = 5;

/// Course advantage by boat number (lane 1 is most advantageous)
fn course_advantage(course: u8) -> f64 {
    match course {
        1 => 2.0,
        2 => 1.1,
        3 => 0.8,
        4 => 0.6,
        5 => 0.5,
        6 => 0.4,
        _ => 0.0,
    }
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean(values);
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Max minus min, 0 for an empty slice
pub fn spread(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let max = values.iter().cloned().fold(f64::MIN, f64::max);
    let min = values.iter().cloned().fold(f64::MAX, f64::min);
    max - min
}

/// Course-1 win rate minus the mean of the other boats
pub fn course1_advantage(race: &RaceSnapshot) -> f64 {
    if race.boats.len() < 2 {
        return 0.0;
    }
    let course1 = race.boat(1).map(|b| b.national_win_rate).unwrap_or(0.0);
    let others: Vec<f64> = race
        .boats
        .iter()
        .filter(|b| b.course != 1)
        .map(|b| b.national_win_rate)
        .collect();
    course1 - mean(&others)
}

/// Base features from the race card and racer master
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseFeatures {
    pub national_win_rate: f64,
    pub national_in2_rate: f64,
    pub local_win_rate: f64,
    pub motor_in2_rate: f64,
    pub boat_in2_rate: f64,
    pub class_encoded: f64,
    pub course_advantage: f64,
    pub venue_win_rate: f64,
}

/// Current/previous meet and form features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodFeatures {
    pub current_win_rate: f64,
    pub current_avg_st: f64,
    pub current_avg_finish: f64,
    pub previous_win_rate: f64,
    pub previous_avg_finish: f64,
    pub form_score: f64,
    pub recent_avg_finish: f64,
    pub recent_avg_st: f64,
    pub trend: f64,
    pub streak: f64,
}

impl Default for PeriodFeatures {
    /// Neutral values when a racer has no period data
    fn default() -> Self {
        Self {
            current_win_rate: 0.0,
            current_avg_st: 0.15,
            current_avg_finish: 3.5,
            previous_win_rate: 0.0,
            previous_avg_finish: 3.5,
            form_score: 0.5,
            recent_avg_finish: 3.5,
            recent_avg_st: 0.15,
            trend: 0.5,
            streak: 0.0,
        }
    }
}

/// Exhibition (trial) features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhibitionFeatures {
    pub exhibition_time: f64,
    pub exhibition_rank: f64,
    pub start_timing: f64,
}

impl Default for ExhibitionFeatures {
    /// Default values when exhibition time is not available
    fn default() -> Self {
        Self {
            exhibition_time: 6.90,
            exhibition_rank: 3.0,
            start_timing: 0.15,
        }
    }
}

/// Market features derived from trifecta odds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsFeatures {
    pub average_odds: f64,
    pub confidence: f64,
}

/// Position relative to the rest of the field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelativeFeatures {
    pub win_rate_diff_from_avg: f64,
    pub motor_rate_diff_from_avg: f64,
}

/// Complete feature set for one boat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoatFeatures {
    pub course: u8,
    pub base: BaseFeatures,
    pub period: PeriodFeatures,
    pub exhibition: ExhibitionFeatures,
    pub odds: OddsFeatures,
    pub relative: RelativeFeatures,
}

/// Weather features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherFeatures {
    pub wind_speed: f64,
    pub wave_height: f64,
    pub temperature: f64,
}

/// Race-wide aggregates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceLevelFeatures {
    pub rate_variance: f64,
    pub rate_spread: f64,
    pub odds_variance: f64,
    pub course1_advantage: f64,
}

/// Features for a whole race, boats in course order 1-6
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaceFeatures {
    pub boats: Vec<BoatFeatures>,
    pub weather: WeatherFeatures,
    pub race: RaceLevelFeatures,
}

impl RaceFeatures {
    /// Convert features to a flat vector for model input
    ///
    /// Order: base (6×8), period (6×10), exhibition (6×3), odds (6×2),
    /// weather (3), relative (6×2), race (4)
    pub fn to_vec(&self) -> Vec<f64> {
        let mut features = Vec::with_capacity(NUM_FEATURES);

        for b in &self.boats {
            features.extend([
                b.base.national_win_rate,
                b.base.national_in2_rate,
                b.base.local_win_rate,
                b.base.motor_in2_rate,
                b.base.boat_in2_rate,
                b.base.class_encoded,
                b.base.course_advantage,
                b.base.venue_win_rate,
            ]);
        }

        for b in &self.boats {
            features.extend([
                b.period.current_win_rate,
                b.period.current_avg_st,
                b.period.current_avg_finish,
                b.period.previous_win_rate,
                b.period.previous_avg_finish,
                b.period.form_score,
                b.period.recent_avg_finish,
                b.period.recent_avg_st,
                b.period.trend,
                b.period.streak,
            ]);
        }

        for b in &self.boats {
            features.extend([
                b.exhibition.exhibition_time,
                b.exhibition.exhibition_rank,
                b.exhibition.start_timing,
            ]);
        }

        for b in &self.boats {
            features.extend([b.odds.average_odds, b.odds.confidence]);
        }

        features.extend([
            self.weather.wind_speed,
            self.weather.wave_height,
            self.weather.temperature,
        ]);

        for b in &self.boats {
            features.extend([
                b.relative.win_rate_diff_from_avg,
                b.relative.motor_rate_diff_from_avg,
            ]);
        }

        features.extend([
            self.race.rate_variance,
            self.race.rate_spread,
            self.race.odds_variance,
            self.race.course1_advantage,
        ]);

        features
    }
}

/// Feature engineering for fused race records
pub struct FeatureEngineering;

impl FeatureEngineering {
    /// Create the full feature set for a race
    ///
    /// Courses without a boat record get default-valued features so the
    /// output always covers courses 1-6.
    pub fn create_race_features(race: &RaceSnapshot) -> RaceFeatures {
        let win_rates = race.win_rates();
        let motor_rates = race.motor_rates();
        let avg_win_rate = mean(&win_rates);
        let avg_motor_rate = mean(&motor_rates);

        let boats = (1..=6u8)
            .map(|course| {
                let fallback = BoatRecord::new(course);
                let boat = race.boat(course).unwrap_or(&fallback);

                BoatFeatures {
                    course,
                    base: Self::create_base_features(boat),
                    period: Self::create_period_features(boat),
                    exhibition: race
                        .trial(course)
                        .map(|t| ExhibitionFeatures {
                            exhibition_time: t.time,
                            exhibition_rank: t.rank as f64,
                            start_timing: t.start_timing,
                        })
                        .unwrap_or_default(),
                    odds: Self::create_odds_features(race, course),
                    relative: RelativeFeatures {
                        win_rate_diff_from_avg: boat.national_win_rate - avg_win_rate,
                        motor_rate_diff_from_avg: boat.motor_in2_rate - avg_motor_rate,
                    },
                }
            })
            .collect();

        let odds_values: Vec<f64> = race.odds.trifecta.values().copied().collect();

        RaceFeatures {
            boats,
            weather: WeatherFeatures {
                wind_speed: race.weather.wind_speed.unwrap_or(0.0),
                wave_height: race.weather.wave_height.unwrap_or(0.0),
                temperature: race.weather.temperature.unwrap_or(20.0),
            },
            race: RaceLevelFeatures {
                rate_variance: variance(&win_rates),
                rate_spread: spread(&win_rates),
                odds_variance: variance(&odds_values),
                course1_advantage: course1_advantage(race),
            },
        }
    }

    /// Create base features from a boat record
    pub fn create_base_features(boat: &BoatRecord) -> BaseFeatures {
        BaseFeatures {
            national_win_rate: boat.national_win_rate,
            national_in2_rate: boat.national_in2_rate,
            local_win_rate: boat.local_win_rate,
            motor_in2_rate: boat.motor_in2_rate,
            boat_in2_rate: boat.boat_in2_rate,
            class_encoded: boat.racer_class.encode(),
            course_advantage: course_advantage(boat.course),
            venue_win_rate: boat
                .venue_stats
                .as_ref()
                .map(|v| v.win_rate)
                .unwrap_or(DEFAULT_VENUE_WIN_RATE),
        }
    }

    /// Create meet and form features, neutral where data is missing
    pub fn create_period_features(boat: &BoatRecord) -> PeriodFeatures {
        let mut features = PeriodFeatures::default();

        if let Some(ref current) = boat.current_period {
            features.current_win_rate = current.win_rate;
            features.current_avg_st = current.avg_st.unwrap_or(features.current_avg_st);
            features.current_avg_finish = current.avg_finish.unwrap_or(features.current_avg_finish);
        }

        if let Some(ref previous) = boat.previous_period {
            features.previous_win_rate = previous.win_rate;
            features.previous_avg_finish =
                previous.avg_finish.unwrap_or(features.previous_avg_finish);
        }

        if let Some(ref form) = boat.form {
            features.form_score = form.form_score.unwrap_or(features.form_score);
            features.recent_avg_finish = form.recent_avg_finish.unwrap_or(features.recent_avg_finish);
            features.recent_avg_st = form.recent_avg_st.unwrap_or(features.recent_avg_st);
            features.trend = form.trend.encode();
            features.streak = form.consecutive_wins.min(MAX_STREAK) as f64 / MAX_STREAK as f64;
        }

        features
    }

    fn create_odds_features(race: &RaceSnapshot, course: u8) -> OddsFeatures {
        let average_odds = race
            .odds
            .average_trifecta_involving(course)
            .unwrap_or(DEFAULT_AVERAGE_ODDS);
        let confidence = if average_odds > 0.0 {
            1.0 / (average_odds + 1.0)
        } else {
            0.5
        };
        OddsFeatures {
            average_odds,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::venue::Venue;
    use crate::models::{FormAnalysis, PeriodStats, RacerClass, TrialTime, Trend, Weather};
    use chrono::Utc;

    fn sample_race() -> RaceSnapshot {
        let rates = [7.0, 5.5, 5.0, 4.5, 4.0, 3.0];
        let boats = rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| BoatRecord {
                racer_class: if i == 0 { RacerClass::A1 } else { RacerClass::B1 },
                national_win_rate: rate,
                motor_in2_rate: 30.0 + i as f64,
                ..BoatRecord::new(i as u8 + 1)
            })
            .collect();

        RaceSnapshot {
            venue: Venue::from_code(12).unwrap(),
            date: 20241230,
            race_no: 1,
            boats,
            odds: Default::default(),
            trials: vec![TrialTime {
                boat_no: 2,
                time: 6.72,
                rank: 1,
                start_timing: 0.11,
            }],
            weather: Weather {
                wind_speed: Some(3.0),
                ..Weather::default()
            },
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn test_statistics_helpers() {
        assert_eq!(variance(&[]), 0.0);
        assert_eq!(variance(&[5.0, 5.0, 5.0]), 0.0);
        assert!((variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
        assert_eq!(spread(&[2.0, 9.0, 4.0]), 7.0);
        assert_eq!(spread(&[]), 0.0);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_course1_advantage() {
        let race = sample_race();
        // 7.0 - mean(5.5, 5.0, 4.5, 4.0, 3.0)
        assert!((course1_advantage(&race) - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_feature_vector_length() {
        let features = FeatureEngineering::create_race_features(&sample_race());
        assert_eq!(features.boats.len(), 6);
        assert_eq!(features.to_vec().len(), NUM_FEATURES);
        assert_eq!(NUM_FEATURES, 157);
    }

    #[test]
    fn test_defaults_for_missing_layers() {
        let features = FeatureEngineering::create_race_features(&sample_race());

        let boat1 = &features.boats[0];
        assert_eq!(boat1.base.class_encoded, 4.0);
        assert_eq!(boat1.base.course_advantage, 2.0);
        assert_eq!(boat1.base.venue_win_rate, 0.2);
        assert_eq!(boat1.exhibition.exhibition_time, 6.90);
        assert_eq!(boat1.odds.average_odds, 50.0);
        assert_eq!(boat1.period.form_score, 0.5);

        let boat2 = &features.boats[1];
        assert_eq!(boat2.exhibition.exhibition_time, 6.72);
        assert_eq!(boat2.exhibition.exhibition_rank, 1.0);

        assert_eq!(features.weather.wind_speed, 3.0);
        assert_eq!(features.weather.temperature, 20.0);
    }

    #[test]
    fn test_period_features() {
        let boat = BoatRecord {
            current_period: Some(PeriodStats {
                races: 5,
                wins: 2,
                win_rate: 6.4,
                avg_st: Some(0.12),
                avg_finish: None,
            }),
            form: Some(FormAnalysis {
                trend: Trend::Rising,
                consecutive_wins: 8,
                ..FormAnalysis::default()
            }),
            ..BoatRecord::new(3)
        };

        let period = FeatureEngineering::create_period_features(&boat);
        assert_eq!(period.current_win_rate, 6.4);
        assert_eq!(period.current_avg_st, 0.12);
        assert_eq!(period.current_avg_finish, 3.5);
        assert_eq!(period.trend, 1.0);
        assert_eq!(period.streak, 1.0);
    }

    #[test]
    fn test_relative_features_sum_to_zero() {
        let features = FeatureEngineering::create_race_features(&sample_race());
        let total: f64 = features
            .boats
            .iter()
            .map(|b| b.relative.win_rate_diff_from_avg)
            .sum();
        assert!(total.abs() < 1e-9);
    }
}
