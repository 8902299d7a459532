//! Sequence classification over an ONNX graph and a Hugging Face tokenizer.

mod builder;
mod classifier;
mod error;
mod utils;

pub use builder::{configure_tokenizer, ClassifierBuilder};
pub use classifier::PhishingClassifier;
pub use error::ClassifierError;
pub(crate) use utils::{argmax, softmax};

/// Produces raw class logits for a piece of text.
///
/// Implementations must be deterministic and safe to call from many
/// threads at once; the detector shares one instance across all requests.
pub trait SequenceScorer: Send + Sync {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError>;
}

