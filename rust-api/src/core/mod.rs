//! Decision pipeline components

pub mod classifier;
pub mod gate;
pub mod optimizer;
pub mod quality;
pub mod ranker;

// Re-export commonly used types
pub use classifier::{Category, Classification, ClassificationFactors, RaceClassifier};
pub use gate::{AbstentionGate, Verdict};
pub use optimizer::{BetType, StrategyResult, Ticket, TicketOptimizer};
pub use quality::{CheckKind, QualityCheck, QualityReport, QualityScorer, RELIABILITY_THRESHOLD};
pub use ranker::{Candidate, OutcomeRanker, Tier, TierCandidates};
