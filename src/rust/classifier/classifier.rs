use std::collections::HashMap;
use std::sync::Arc;
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer};

use super::error::ClassifierError;
use super::SequenceScorer;
use crate::ModelCharacteristics;

/// A sequence classifier backed by an ONNX Runtime session.
///
/// # Thread Safety
///
/// `Tokenizer` and `Session` are both `Send + Sync` and are only read after
/// construction, so one instance can be shared behind an `Arc` by every
/// request handler.
///
/// ```rust,no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use phishing_detector::{PhishingClassifier, SequenceScorer};
///
/// let classifier = PhishingClassifier::builder()
///     .with_custom_model("model.onnx", "tokenizer.json")?
///     .build()?;
///
/// let logits = classifier.logits("quarterly meeting moved to tuesday")?;
/// assert_eq!(logits.len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PhishingClassifier {
    pub(crate) tokenizer: Arc<Tokenizer>,
    pub(crate) session: Arc<Session>,
    pub(crate) input_names: Vec<String>,
    pub(crate) model_characteristics: ModelCharacteristics,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<PhishingClassifier>();
    }
};

impl PhishingClassifier {
    /// Creates a new ClassifierBuilder for fluent construction
    pub fn builder() -> super::builder::ClassifierBuilder {
        super::builder::ClassifierBuilder::new()
    }

    /// Tokenizes `text` with special tokens; the tokenizer is already set up
    /// to truncate and pad to the model's maximum sequence length.
    pub fn encode(&self, text: &str) -> Result<Encoding, ClassifierError> {
        self.tokenizer
            .encode(text, true)
            .map_err(|e| ClassifierError::TokenizerError(e.to_string()))
    }

    /// Runs the graph on one encoding and returns the logits of the single row.
    ///
    /// Only the inputs the graph declares are fed, so both BERT-style graphs
    /// (with `token_type_ids`) and DistilBERT-style graphs work.
    pub fn forward(&self, encoding: &Encoding) -> Result<Vec<f32>, ClassifierError> {
        let mut input_tensors = HashMap::new();
        for name in &self.input_names {
            let values = match name.as_str() {
                "input_ids" => encoding.get_ids(),
                "attention_mask" => encoding.get_attention_mask(),
                "token_type_ids" => encoding.get_type_ids(),
                other => {
                    return Err(ClassifierError::ModelError(format!(
                        "Unsupported model input '{}'",
                        other
                    )))
                }
            };
            input_tensors.insert(name.as_str(), to_tensor(values, name)?);
        }

        let outputs = self.session.run(input_tensors)
            .map_err(|e| ClassifierError::ModelError(format!("Failed to run model: {}", e)))?;
        let logits = outputs[0].try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::ModelError(format!("Failed to extract output tensor: {}", e)))?;

        let shape = logits.shape();
        if shape.len() != 2 || shape[0] != 1 {
            return Err(ClassifierError::PredictionError(format!(
                "Expected logits of shape [1, num_labels], got {:?}",
                shape
            )));
        }
        Ok(logits.iter().copied().collect())
    }
}

impl SequenceScorer for PhishingClassifier {
    fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
        let encoding = self.encode(text)?;
        self.forward(&encoding)
    }
}

fn to_tensor(values: &[u32], name: &str) -> Result<Tensor<i64>, ClassifierError> {
    let array = Array2::from_shape_vec((1, values.len()), values.iter().map(|&x| i64::from(x)).collect())
        .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} array: {}", name, e)))?;
    let array_dyn = array.into_dyn();
    let standard = array_dyn.as_standard_layout();
    Tensor::from_array(&standard)
        .map_err(|e| ClassifierError::ModelError(format!("Failed to create {} tensor: {}", name, e)))
}

