//! JSON file backed data source
//!
//! Directory layout under the data root:
//!
//! ```text
//! daily/{date}/{venue}_race{n}.json          race card ({"boats": [...]})
//! racers/master/{racer_id}.json              racer master
//! racers/periods/{racer_id}_{yyyymm}.json    period data
//! live/{date}/{venue}_race{n}_trial.json     trial times
//! live/{date}/{venue}_race{n}_odds.json      odds
//! live/{date}/{venue}_race{n}_weather.json   weather
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::odds::OddsTable;
use super::source::{DataSource, SourceError};
use super::venue::Venue;
use crate::models::{BoatRecord, PeriodData, RacerMaster, TrialTime, Weather};

/// Race card file structure
#[derive(Debug, Deserialize)]
struct RaceCardFile {
    boats: Vec<BoatRecord>,
}

/// Trial time file structure
#[derive(Debug, Deserialize)]
struct TrialFile {
    #[serde(alias = "tenji_time")]
    trials: Vec<TrialTime>,
}

/// Data source reading pre-collected JSON files
#[derive(Debug, Clone)]
pub struct FileDataSource {
    root: PathBuf,
}

impl FileDataSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn race_card_path(&self, venue: Venue, date: u32, race_no: u8) -> PathBuf {
        self.root
            .join("daily")
            .join(date.to_string())
            .join(format!("{}_race{}.json", venue.code_str(), race_no))
    }

    fn live_path(&self, venue: Venue, date: u32, race_no: u8, feed: &str) -> PathBuf {
        self.root
            .join("live")
            .join(date.to_string())
            .join(format!("{}_race{}_{}.json", venue.code_str(), race_no, feed))
    }

    /// Read and decode a JSON file, `None` when it does not exist
    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SourceError> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No file at {:?}", path);
                Ok(None)
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }

    async fn read_required<T: DeserializeOwned>(path: PathBuf) -> Result<T, SourceError> {
        Self::read_json(&path)
            .await?
            .ok_or_else(|| SourceError::NotFound(path.display().to_string()))
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch_base_race(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<Vec<BoatRecord>, SourceError> {
        let card: RaceCardFile =
            Self::read_required(self.race_card_path(venue, date, race_no)).await?;
        Ok(card.boats)
    }

    async fn fetch_racer_master(&self, racer_id: u32) -> Result<Option<RacerMaster>, SourceError> {
        let path = self
            .root
            .join("racers")
            .join("master")
            .join(format!("{}.json", racer_id));
        Self::read_json(&path).await
    }

    async fn fetch_period_data(
        &self,
        racer_id: u32,
        year_month: u32,
    ) -> Result<Option<PeriodData>, SourceError> {
        let path = self
            .root
            .join("racers")
            .join("periods")
            .join(format!("{}_{}.json", racer_id, year_month));
        Self::read_json(&path).await
    }

    async fn fetch_trial_times(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<Vec<TrialTime>, SourceError> {
        let file: TrialFile =
            Self::read_required(self.live_path(venue, date, race_no, "trial")).await?;
        Ok(file.trials)
    }

    async fn fetch_odds(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<OddsTable, SourceError> {
        Self::read_required(self.live_path(venue, date, race_no, "odds")).await
    }

    async fn fetch_weather(
        &self,
        venue: Venue,
        date: u32,
        race_no: u8,
    ) -> Result<Weather, SourceError> {
        Self::read_required(self.live_path(venue, date, race_no, "weather")).await
    }
}
