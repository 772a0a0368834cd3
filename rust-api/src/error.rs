use std::collections::HashSet;
use thiserror::Error;

use crate::data::source::SourceError;
use crate::models::BoatRecord;

/// Failures that stop an analysis.
///
/// Degraded layers, low data quality and missing models are not errors;
/// they surface in the returned `Decision`.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Unknown venue name or code
    #[error("Unknown venue: {0}")]
    InvalidVenue(String),

    /// Race number outside 1-12
    #[error("Race number must be between 1 and 12, got {0}")]
    InvalidRaceNumber(u8),

    /// Base race could not be fetched or violates the boat-set invariant
    #[error("Race data unavailable: {0}")]
    DataUnavailable(#[from] SourceError),
}

impl AnalysisError {
    /// Rejected before any fetch; retrying the same request cannot succeed
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidVenue(_) | AnalysisError::InvalidRaceNumber(_)
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AnalysisError::InvalidVenue(_) => "invalid_venue",
            AnalysisError::InvalidRaceNumber(_) => "invalid_race_number",
            AnalysisError::DataUnavailable(_) => "data_unavailable",
        }
    }
}

#[cfg(feature = "api")]
mod response {
    use actix_web::{http::StatusCode, HttpResponse, ResponseError};

    use super::AnalysisError;
    use crate::models::ErrorResponse;

    impl ResponseError for AnalysisError {
        fn status_code(&self) -> StatusCode {
            match self {
                AnalysisError::InvalidVenue(_) | AnalysisError::InvalidRaceNumber(_) => {
                    StatusCode::BAD_REQUEST
                }
                AnalysisError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            }
        }

        fn error_response(&self) -> HttpResponse {
            HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: self.error_code().to_string(),
                message: self.to_string(),
            })
        }
    }
}

/// Validation functions
pub fn validate_race_number(race_no: u8) -> Result<(), AnalysisError> {
    if !(1..=12).contains(&race_no) {
        return Err(AnalysisError::InvalidRaceNumber(race_no));
    }
    Ok(())
}

pub fn validate_boat_number(boat_no: u8) -> Result<(), SourceError> {
    if !(1..=6).contains(&boat_no) {
        return Err(SourceError::Malformed(format!(
            "Boat number must be between 1 and 6, got {}",
            boat_no
        )));
    }
    Ok(())
}

/// Check the race card invariant: six boats, courses 1-6 each once, racer ids unique
pub fn validate_boat_set(boats: &[BoatRecord]) -> Result<(), SourceError> {
    if boats.len() != 6 {
        return Err(SourceError::Malformed(format!(
            "Exactly 6 boats required, got {}",
            boats.len()
        )));
    }

    let mut courses = HashSet::new();
    for boat in boats {
        validate_boat_number(boat.course)?;
        if !courses.insert(boat.course) {
            return Err(SourceError::Malformed(format!(
                "Duplicate course {}",
                boat.course
            )));
        }
    }

    let mut racer_ids = HashSet::new();
    for id in boats.iter().filter_map(|b| b.racer_id) {
        if !racer_ids.insert(id) {
            return Err(SourceError::Malformed(format!("Duplicate racer id {}", id)));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boats() -> Vec<BoatRecord> {
        (1..=6)
            .map(|course| BoatRecord {
                racer_id: Some(4000 + course as u32),
                ..BoatRecord::new(course)
            })
            .collect()
    }

    #[test]
    fn test_validate_race_number_valid() {
        for i in 1..=12 {
            assert!(validate_race_number(i).is_ok());
        }
    }

    #[test]
    fn test_validate_race_number_invalid() {
        assert!(validate_race_number(0).is_err());
        assert!(validate_race_number(13).is_err());
    }

    #[test]
    fn test_validate_boat_number() {
        for i in 1..=6 {
            assert!(validate_boat_number(i).is_ok());
        }
        assert!(validate_boat_number(0).is_err());
        assert!(validate_boat_number(7).is_err());
    }

    #[test]
    fn test_validate_boat_set_valid() {
        assert!(validate_boat_set(&boats()).is_ok());
    }

    #[test]
    fn test_validate_boat_set_wrong_count() {
        let mut set = boats();
        set.pop();
        assert!(validate_boat_set(&set).is_err());
    }

    #[test]
    fn test_validate_boat_set_duplicate_course() {
        let mut set = boats();
        set[5].course = 1;
        assert!(validate_boat_set(&set).is_err());
    }

    #[test]
    fn test_validate_boat_set_duplicate_racer() {
        let mut set = boats();
        set[1].racer_id = set[0].racer_id;
        assert!(validate_boat_set(&set).is_err());
    }

    #[test]
    fn test_validate_boat_set_missing_ids_allowed() {
        let mut set = boats();
        set[0].racer_id = None;
        set[1].racer_id = None;
        assert!(validate_boat_set(&set).is_ok());
    }

    #[test]
    fn test_error_display() {
        let err = AnalysisError::InvalidVenue("東京".to_string());
        assert!(err.to_string().contains("Unknown venue"));
        assert!(err.is_invalid_input());
        assert_eq!(err.error_code(), "invalid_venue");

        let err = AnalysisError::from(SourceError::NotFound("x".to_string()));
        assert!(!err.is_invalid_input());
        assert_eq!(err.error_code(), "data_unavailable");
    }

    #[cfg(feature = "api")]
    #[test]
    fn test_error_status_codes() {
        use actix_web::{http::StatusCode, ResponseError};

        assert_eq!(
            AnalysisError::InvalidRaceNumber(13).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AnalysisError::InvalidVenue(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AnalysisError::DataUnavailable(SourceError::Unavailable(String::new())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
