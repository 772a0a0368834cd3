//! Data source seam: everything the pipeline needs from the outside world

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use super::odds::OddsTable;
use super::venue::Venue;
use crate::models::{BoatRecord, PeriodData, RacerMaster, TrialTime, Weather};

/// Data source errors
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed record: {0}")]
    Malformed(String),

    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Provider of the four data layers for one race.
///
/// `date` is YYYYMMDD and `year_month` is YYYYMM. Master and period lookups
/// return `Ok(None)` when the racer simply has no record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Layer 3: the race card with six boats
    async fn fetch_base_race(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<Vec<BoatRecord>, SourceError>;

    /// Layer 1: career and per-venue stats
    async fn fetch_racer_master(&self, racer_id: u32) -> Result<Option<RacerMaster>, SourceError>;

    /// Layer 2: current and previous meet stats, recent races and form
    async fn fetch_period_data(
        &self,
        racer_id: u32,
        year_month: u32,
    ) -> Result<Option<PeriodData>, SourceError>;

    /// Layer 4: pre-race trial times
    async fn fetch_trial_times(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<Vec<TrialTime>, SourceError>;

    /// Layer 4: odds
    async fn fetch_odds(&self, venue: Venue, date: u32, race_no: u8)
        -> Result<OddsTable, SourceError>;

    /// Layer 4: weather
    async fn fetch_weather(&self, venue: Venue, date: u32, race_no: u8)
        -> Result<Weather, SourceError>;
}
