use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use std::sync::OnceLock;

use crate::classifier::ClassifierError;

static ENVIRONMENT: OnceLock<Result<(), String>> = OnceLock::new();

/// ONNX Runtime execution settings.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Threads used to run independent graph nodes; 0 lets ONNX Runtime decide.
    pub inter_threads: usize,
    /// Threads used inside a single node; 0 lets ONNX Runtime decide.
    pub intra_threads: usize,
    pub optimization_level: OptimizationLevel,
}

/// Mirror of [`GraphOptimizationLevel`] that can be cloned and compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disable,
    Level1,
    Level2,
    Level3,
}

impl From<OptimizationLevel> for GraphOptimizationLevel {
    fn from(level: OptimizationLevel) -> Self {
        match level {
            OptimizationLevel::Disable => GraphOptimizationLevel::Disable,
            OptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
            OptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
            OptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0,
            intra_threads: 0,
            optimization_level: OptimizationLevel::Level3,
        }
    }
}

impl RuntimeConfig {
    pub fn with_intra_threads(mut self, threads: usize) -> Self {
        self.intra_threads = threads;
        self
    }
}

/// Commits the process-wide ONNX Runtime environment once; later calls
/// return the outcome of the first attempt.
pub fn ensure_initialized() -> Result<(), ClassifierError> {
    ENVIRONMENT
        .get_or_init(|| {
            ort::init()
                .with_name("phishing-detector")
                .commit()
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .clone()
        .map_err(ClassifierError::ModelError)
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, ClassifierError> {
    ensure_initialized()?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }
    builder = builder.with_optimization_level(config.optimization_level.into())?;

    Ok(builder)
}
