//! Data sources, fusion and feature engineering

pub mod features;
pub mod file_source;
pub mod fusion;
pub mod odds;
pub mod source;
pub mod venue;

// Re-export commonly used types
pub use features::{FeatureEngineering, RaceFeatures, NUM_FEATURES};
pub use file_source::FileDataSource;
pub use fusion::DataFusion;
pub use odds::OddsTable;
pub use source::{DataSource, SourceError};
pub use venue::Venue;
