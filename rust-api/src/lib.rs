//! Kyotei - boat race betting decision pipeline
//!
//! This library provides:
//! - Fusion of racer master, period, race card and live data
//! - Data quality scoring and race stability classification
//! - Trifecta (3連単) ranking at three risk tiers
//! - Expected-value based ticket selection and abstention
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use kyotei::config::FetchConfig;
//! use kyotei::data::FileDataSource;
//! use kyotei::models::AnalyzeRequest;
//! use kyotei::pipeline::Pipeline;
//!
//! # async fn run() -> Result<(), kyotei::error::AnalysisError> {
//! let source = Arc::new(FileDataSource::new("data"));
//! let pipeline = Pipeline::new(source, FetchConfig::default());
//!
//! let request = AnalyzeRequest {
//!     venue: "大村".to_string(),
//!     race_number: 12,
//!     date: Some(20241230),
//! };
//! let decision = pipeline.analyze(&request).await?;
//! println!("{}", decision.status());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod predictor;

// Re-export commonly used types
pub use data::{DataSource, FileDataSource, SourceError, Venue};
pub use error::AnalysisError;
pub use models::{AnalyzeRequest, AnalyzeResponse, RaceSnapshot};
pub use pipeline::{Analysis, Decision, Pipeline};
pub use predictor::{FallbackPredictor, LikelihoodEstimator, Likelihoods};
