//! Per-boat likelihood estimation
//!
//! Two implementations of `LikelihoodEstimator`: a trained ONNX model
//! (`onnx` feature) and the heuristic `FallbackPredictor`.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::features::RaceFeatures;

/// Win likelihood per boat, course order 1-6, summing to 1
pub type Likelihoods = [f64; 6];

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("invalid likelihoods: {0}")]
    InvalidOutput(String),

    #[error("failed to load model: {0}")]
    Load(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("unexpected model output: expected 6 values, got {0}")]
    Shape(usize),
}

/// Estimates per-boat likelihoods from race features
pub trait LikelihoodEstimator: Send + Sync {
    fn name(&self) -> &str;

    fn is_available(&self) -> bool;

    fn predict(&self, features: &RaceFeatures) -> Result<Likelihoods, EstimatorError>;
}

/// Scale raw scores to sum 1, uniform when they cannot be normalized
fn normalize(scores: [f64; 6]) -> Likelihoods {
    let total: f64 = scores.iter().sum();
    if total > 0.0 && total.is_finite() {
        scores.map(|s| s / total)
    } else {
        [1.0 / 6.0; 6]
    }
}

/// Accept estimator output only if every value is finite and non-negative
/// with a positive total; the result is rescaled to sum 1
pub fn check_likelihoods(likelihoods: Likelihoods) -> Result<Likelihoods, EstimatorError> {
    if let Some(bad) = likelihoods.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(EstimatorError::InvalidOutput(format!("value {}", bad)));
    }
    let total: f64 = likelihoods.iter().sum();
    if total <= 0.0 {
        return Err(EstimatorError::InvalidOutput("all values are zero".to_string()));
    }
    Ok(likelihoods.map(|v| v / total))
}

/// Numerically stable softmax
pub fn softmax(logits: [f64; 6]) -> Likelihoods {
    let max = logits.iter().cloned().fold(f64::MIN, f64::max);
    normalize(logits.map(|l| (l - max).exp()))
}

/// Fallback predictor using heuristics (when no trained model is available)
pub struct FallbackPredictor {
    course_advantage: [f64; 6],
}

impl FallbackPredictor {
    pub fn new() -> Self {
        Self {
            course_advantage: [0.30, 0.15, 0.10, 0.05, 0.0, -0.05],
        }
    }

    /// win rate / 10 + motor rate / 100 + course bonus, normalized
    pub fn likelihoods(&self, features: &RaceFeatures) -> Likelihoods {
        let mut scores = [0.0; 6];
        for boat in &features.boats {
            let idx = (boat.course as usize).wrapping_sub(1);
            if let Some(score) = scores.get_mut(idx) {
                *score = boat.base.national_win_rate / 10.0
                    + boat.base.motor_in2_rate / 100.0
                    + self.course_advantage[idx];
            }
        }
        normalize(scores)
    }
}

impl Default for FallbackPredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl LikelihoodEstimator for FallbackPredictor {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn predict(&self, features: &RaceFeatures) -> Result<Likelihoods, EstimatorError> {
        Ok(self.likelihoods(features))
    }
}

/// Load the trained estimator, `None` when absent or unusable
pub fn load_estimator(model_path: Option<&Path>) -> Option<Arc<dyn LikelihoodEstimator>> {
    match model_path {
        Some(path) => load_model(path),
        None => {
            info!("No model configured, using heuristic predictor");
            None
        }
    }
}

#[cfg(feature = "onnx")]
fn load_model(path: &Path) -> Option<Arc<dyn LikelihoodEstimator>> {
    match OnnxPredictor::new(path) {
        Ok(predictor) => {
            info!("ONNX model loaded successfully");
            Some(Arc::new(predictor))
        }
        Err(e) => {
            warn!("{}. Using fallback predictor.", e);
            None
        }
    }
}

#[cfg(not(feature = "onnx"))]
fn load_model(path: &Path) -> Option<Arc<dyn LikelihoodEstimator>> {
    warn!(
        "Model {:?} configured but built without the onnx feature. Using fallback predictor.",
        path
    );
    None
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxPredictor;

#[cfg(feature = "onnx")]
mod onnx {
    use ort::{
        session::{builder::GraphOptimizationLevel, Session},
        value::Tensor,
    };
    use std::path::Path;
    use std::sync::Mutex;
    use tracing::info;

    use super::{softmax, EstimatorError, LikelihoodEstimator, Likelihoods};
    use crate::data::features::{RaceFeatures, NUM_FEATURES};

    /// ONNX model taking one row of race features and emitting 6 logits
    pub struct OnnxPredictor {
        session: Mutex<Session>,
    }

    impl OnnxPredictor {
        pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self, EstimatorError> {
            let model_path = model_path.as_ref();
            info!("Loading model: {:?}", model_path);

            let session =
                Self::load(model_path).map_err(|e| EstimatorError::Load(e.to_string()))?;

            Ok(Self {
                session: Mutex::new(session),
            })
        }

        fn load(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
            Ok(Session::builder()?
                .with_optimization_level(GraphOptimizationLevel::Level3)?
                .commit_from_file(model_path)?)
        }

        fn run(&self, features: &RaceFeatures) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
            let input: Vec<f32> = features.to_vec().iter().map(|&x| x as f32).collect();
            let input_tensor = Tensor::from_array(([1usize, NUM_FEATURES], input))?;

            let mut session = match self.session.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let outputs = session.run(ort::inputs!["input" => input_tensor])?;
            let (_, output_data) = outputs[0].try_extract_tensor::<f32>()?;
            Ok(output_data.to_vec())
        }
    }

    impl LikelihoodEstimator for OnnxPredictor {
        fn name(&self) -> &str {
            "onnx"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn predict(&self, features: &RaceFeatures) -> Result<Likelihoods, EstimatorError> {
            let output = self
                .run(features)
                .map_err(|e| EstimatorError::Inference(e.to_string()))?;

            let logits: [f32; 6] = output
                .as_slice()
                .try_into()
                .map_err(|_| EstimatorError::Shape(output.len()))?;
            Ok(softmax(logits.map(f64::from)))
        }
    }
}
