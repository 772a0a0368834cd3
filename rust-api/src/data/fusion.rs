//! Data fusion
//!
//! Merges the four data layers into one `RaceSnapshot`:
//! - Layer 1: racer master (career and per-venue stats)
//! - Layer 2: period data (meet stats, recent races, form)
//! - Layer 3: race card (required)
//! - Layer 4: live data (trial times, odds, weather)
//!
//! Only a missing or malformed race card fails the fusion. Every other layer
//! degrades to its default and shows up in the quality score.

use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::source::{DataSource, SourceError};
use super::venue::Venue;
use crate::config::FetchConfig;
use crate::error::{validate_boat_number, validate_boat_set, AnalysisError};
use crate::models::{BoatRecord, LiveData, RaceSnapshot};

/// Await a live sub-feed under its own timeout, `None` on failure
async fn fetch_feed<T, F>(feed: &str, limit: Duration, fetch: F) -> Option<T>
where
    F: Future<Output = Result<T, SourceError>>,
{
    match tokio::time::timeout(limit, fetch).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!("{} unavailable: {}", feed, e);
            None
        }
        Err(_) => {
            warn!("{} unavailable: {}", feed, SourceError::Timeout(limit));
            None
        }
    }
}

pub struct DataFusion {
    source: Arc<dyn DataSource>,
    fetch: FetchConfig,
}

impl DataFusion {
    pub fn new(source: Arc<dyn DataSource>, fetch: FetchConfig) -> Self {
        Self { source, fetch }
    }

    /// Build the fused record for one race
    pub async fn fuse(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<RaceSnapshot, AnalysisError> {
        info!("Fusing {} {}R ({})", venue, race_no, date);

        let mut boats = self.source.fetch_base_race(venue, date, race_no).await?;
        validate_boat_set(&boats)?;
        boats.sort_by_key(|b| b.course);

        let year_month = date / 100;
        for boat in &mut boats {
            self.overlay_racer(boat, venue, year_month).await;
        }

        let live = self.fetch_live_data(venue, date, race_no).await;

        Ok(RaceSnapshot {
            venue,
            date,
            race_no,
            boats,
            odds: live.odds,
            trials: live.trials,
            weather: live.weather,
            captured_at: Utc::now(),
        })
    }

    /// Overlay layers 1 and 2 onto a boat with a known racer id
    async fn overlay_racer(&self, boat: &mut BoatRecord, venue: Venue, year_month: u32) {
        let Some(racer_id) = boat.racer_id else {
            return;
        };

        match self.source.fetch_racer_master(racer_id).await {
            Ok(Some(master)) => {
                boat.career = Some(master.career_stats);
                boat.venue_stats = master.venue_stats.get(&venue.code_str()).cloned();
            }
            Ok(None) => {}
            Err(e) => warn!("Racer master for {} unavailable: {}", racer_id, e),
        }

        match self.source.fetch_period_data(racer_id, year_month).await {
            Ok(Some(period)) => {
                boat.current_period = period.current_period;
                boat.previous_period = period.previous_period;
                boat.recent_races = period.recent_races;
                boat.form = period.form_analysis;
            }
            Ok(None) => {}
            Err(e) => warn!("Period data for {} unavailable: {}", racer_id, e),
        }
    }

    /// Fetch the three live sub-feeds concurrently
    ///
    /// Each feed that fails or times out is replaced by its default: no trial
    /// times, empty odds, weather without readings.
    pub async fn fetch_live_data(&self, venue: Venue, date: u32, race_no: u8) -> LiveData {
        let (trials, odds, weather) = tokio::join!(
            fetch_feed(
                "trial times",
                self.fetch.trial_timeout(),
                self.source.fetch_trial_times(venue, date, race_no),
            ),
            fetch_feed(
                "odds",
                self.fetch.odds_timeout(),
                self.source.fetch_odds(venue, date, race_no),
            ),
            fetch_feed(
                "weather",
                self.fetch.weather_timeout(),
                self.source.fetch_weather(venue, date, race_no),
            ),
        );

        let trials = trials
            .unwrap_or_default()
            .into_iter()
            .filter(|t| match validate_boat_number(t.boat_no) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Dropping trial time: {}", e);
                    false
                }
            })
            .collect();

        LiveData {
            trials,
            odds: odds.unwrap_or_default(),
            weather: weather.unwrap_or_default(),
        }
    }
}
