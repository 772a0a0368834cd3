use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::odds::OddsTable;
use crate::data::venue::Venue;
use crate::pipeline::Decision;

/// Racer class, ordered so that `A1 > A2 > B1 > B2`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RacerClass {
    B2,
    #[default]
    B1,
    A2,
    A1,
}

impl RacerClass {
    /// Numeric encoding used as a model feature
    pub fn encode(self) -> f64 {
        match self {
            RacerClass::A1 => 4.0,
            RacerClass::A2 => 3.0,
            RacerClass::B1 => 2.0,
            RacerClass::B2 => 1.0,
        }
    }
}

/// Career totals from the racer master
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerStats {
    pub races: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub in2_rate: f64,
    pub in3_rate: f64,
}

/// Racer results at one venue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueStats {
    pub races: u32,
    pub win_rate: f64,
    pub in2_rate: f64,
}

/// Aggregated results over one meet (current or previous)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodStats {
    pub races: u32,
    pub wins: u32,
    pub win_rate: f64,
    pub avg_st: Option<f64>,
    pub avg_finish: Option<f64>,
}

impl PeriodStats {
    pub fn is_empty(&self) -> bool {
        self.races == 0
            && self.wins == 0
            && self.win_rate == 0.0
            && self.avg_st.is_none()
            && self.avg_finish.is_none()
    }
}

/// One past race of a racer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentRace {
    pub date: u32,
    pub venue_code: u8,
    pub course: u8,
    pub rank: u8,
    #[serde(default)]
    pub start_timing: Option<f64>,
}

/// Direction of a racer's recent results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    #[serde(alias = "上昇中")]
    Rising,
    #[default]
    #[serde(alias = "安定")]
    Stable,
    #[serde(alias = "下降中")]
    Falling,
}

impl Trend {
    pub fn encode(self) -> f64 {
        match self {
            Trend::Rising => 1.0,
            Trend::Stable => 0.5,
            Trend::Falling => 0.0,
        }
    }
}

/// Recent-form summary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormAnalysis {
    pub form_score: Option<f64>,
    pub recent_avg_finish: Option<f64>,
    pub recent_avg_st: Option<f64>,
    pub trend: Trend,
    pub consecutive_wins: u32,
}

impl FormAnalysis {
    pub fn is_empty(&self) -> bool {
        self.form_score.is_none()
            && self.recent_avg_finish.is_none()
            && self.recent_avg_st.is_none()
            && self.trend == Trend::Stable
            && self.consecutive_wins == 0
    }
}

/// One boat of a race, base entry plus the fused historical layers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoatRecord {
    pub course: u8,
    pub racer_id: Option<u32>,
    pub racer_name: String,
    pub racer_class: RacerClass,
    pub national_win_rate: f64,
    pub national_in2_rate: f64,
    pub local_win_rate: f64,
    pub motor_in2_rate: f64,
    pub boat_in2_rate: f64,
    pub career: Option<CareerStats>,
    pub venue_stats: Option<VenueStats>,
    pub current_period: Option<PeriodStats>,
    pub previous_period: Option<PeriodStats>,
    pub recent_races: Vec<RecentRace>,
    pub form: Option<FormAnalysis>,
}

impl BoatRecord {
    /// Bare entry for a course with every stat at its default
    pub fn new(course: u8) -> Self {
        Self {
            course,
            ..Self::default()
        }
    }
}

/// Layer 1: racer master keyed by racer id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RacerMaster {
    pub career_stats: CareerStats,
    /// Per-venue results keyed by 2-digit venue code ("01".."24")
    pub venue_stats: BTreeMap<String, VenueStats>,
}

/// Layer 2: period data keyed by racer id and year-month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodData {
    pub current_period: Option<PeriodStats>,
    pub previous_period: Option<PeriodStats>,
    #[serde(alias = "recent_10_races")]
    pub recent_races: Vec<RecentRace>,
    pub form_analysis: Option<FormAnalysis>,
}

/// Pre-race trial (exhibition) result for one boat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialTime {
    #[serde(alias = "boat_number")]
    pub boat_no: u8,
    pub time: f64,
    pub rank: u8,
    pub start_timing: f64,
}

/// Weather reading; a missing wind speed marks the feed as absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<String>,
    pub wave_height: Option<f64>,
    pub temperature: Option<f64>,
}

/// Layer 4: live data gathered shortly before the race
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveData {
    pub trials: Vec<TrialTime>,
    pub odds: OddsTable,
    pub weather: Weather,
}

/// Fused race record, input to the decision pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSnapshot {
    pub venue: Venue,
    pub date: u32,
    pub race_no: u8,
    /// Boats ordered by course
    pub boats: Vec<BoatRecord>,
    pub odds: OddsTable,
    pub trials: Vec<TrialTime>,
    pub weather: Weather,
    pub captured_at: DateTime<Utc>,
}

impl RaceSnapshot {
    pub fn boat(&self, course: u8) -> Option<&BoatRecord> {
        self.boats.iter().find(|b| b.course == course)
    }

    pub fn trial(&self, course: u8) -> Option<&TrialTime> {
        self.trials.iter().find(|t| t.boat_no == course)
    }

    pub fn win_rates(&self) -> Vec<f64> {
        self.boats.iter().map(|b| b.national_win_rate).collect()
    }

    pub fn motor_rates(&self) -> Vec<f64> {
        self.boats.iter().map(|b| b.motor_in2_rate).collect()
    }
}

/// Race analysis request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    /// Venue name (e.g. "大村") or 2-digit code
    pub venue: String,
    pub race_number: u8,
    /// Race date as YYYYMMDD, today when omitted
    #[serde(default)]
    pub date: Option<u32>,
}

/// Race analysis response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub prediction_id: String,
    pub venue: String,
    pub race_number: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub decision: Decision,
}

/// Aggregates over the retained request history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_predictions: usize,
    pub demo_mode_predictions: usize,
    pub skipped_races: usize,
    pub insufficient_data: usize,
    pub successful_predictions: usize,
    pub average_stability: f64,
    pub category_distribution: BTreeMap<String, usize>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
