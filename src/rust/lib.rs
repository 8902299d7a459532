//! Phishing vs. legitimate email classification with a pretrained ONNX model.
//!
//! The model and tokenizer are fetched from the Hugging Face hub once, then
//! shared read-only by every request through a [`Detector`].
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use phishing_detector::{load_detector, ModelInfo, ModelManager, RuntimeConfig};
//!
//! let manager = ModelManager::new_default()?;
//! let detector = load_detector(&manager, &ModelInfo::from_env(), RuntimeConfig::default(), false).await;
//!
//! let prediction = detector.predict("Your account has been compromised! Click here to verify")?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`Detector`] is cheap to clone and `Send + Sync`; clones share the same
//! read-only model.

pub mod classifier;
pub mod detector;
pub mod model_manager;
pub mod models;
pub mod report;
mod runtime;
pub mod server;

pub use classifier::{ClassifierBuilder, ClassifierError, PhishingClassifier, SequenceScorer};
pub use detector::{load_detector, DetectError, Detector, Label, Prediction};
pub use model_manager::{ModelError, ModelManager};
pub use models::{BuiltinModel, ModelCharacteristics, ModelInfo};
pub use runtime::{create_session_builder, OptimizationLevel, RuntimeConfig};

/// Installs `env_logger`; `RUST_LOG` overrides the default `info` level.
pub fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
