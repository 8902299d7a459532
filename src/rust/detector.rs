//! Shared inference contract behind both front-ends.
//!
//! A [`Detector`] is created once at startup and handed to every handler.
//! It either holds a scorer or is in the unavailable state left behind by a
//! failed model load; it never changes afterwards.

use std::fmt;
use std::sync::Arc;

use crate::classifier::{argmax, softmax, ClassifierBuilder, ClassifierError, SequenceScorer};
use crate::{ModelInfo, ModelManager, RuntimeConfig};

/// Output classes of the model, in logit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Legitimate = 0,
    Phishing = 1,
}

impl Label {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Legitimate),
            1 => Some(Self::Phishing),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legitimate => "Legitimate",
            Self::Phishing => "Phishing",
        }
    }

    pub fn is_phishing(self) -> bool {
        self == Self::Phishing
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: Label,
    /// Probability of `label`, in `0.0..=1.0`.
    pub confidence: f32,
    /// Probabilities indexed by [`Label::index`]; they sum to 1.
    pub probabilities: [f32; 2],
}

impl Prediction {
    /// Softmax over exactly two finite logits, then argmax.
    pub fn from_logits(logits: &[f32]) -> Result<Self, ClassifierError> {
        if logits.len() != 2 {
            return Err(ClassifierError::PredictionError(format!(
                "Expected 2 logits, got {}",
                logits.len()
            )));
        }
        if logits.iter().any(|l| !l.is_finite()) {
            return Err(ClassifierError::PredictionError(format!(
                "Model produced non-finite logits: {:?}",
                logits
            )));
        }

        let probs = softmax(logits);
        let index = argmax(&probs)
            .ok_or_else(|| ClassifierError::PredictionError("Empty probability vector".into()))?;
        let label = Label::from_index(index)
            .ok_or_else(|| ClassifierError::PredictionError(format!("Unknown class index {}", index)))?;

        Ok(Self {
            label,
            confidence: probs[index],
            probabilities: [probs[0], probs[1]],
        })
    }

    pub fn probability(&self, label: Label) -> f32 {
        self.probabilities[label.index()]
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("No text provided")]
    InvalidInput,
    #[error(transparent)]
    Inference(#[from] ClassifierError),
}

/// Process-wide handle to the classifier, or to its absence.
#[derive(Clone)]
pub struct Detector {
    scorer: Option<Arc<dyn SequenceScorer>>,
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("available", &self.is_available())
            .finish()
    }
}

impl Detector {
    pub fn new(scorer: Arc<dyn SequenceScorer>) -> Self {
        Self { scorer: Some(scorer) }
    }

    /// A detector that answers every request with [`DetectError::ModelUnavailable`].
    pub fn unavailable() -> Self {
        Self { scorer: None }
    }

    pub fn is_available(&self) -> bool {
        self.scorer.is_some()
    }

    /// Classifies `text` after lower-casing it.
    ///
    /// Availability is checked before the input, and neither failure
    /// reaches the scorer.
    pub fn predict(&self, text: &str) -> Result<Prediction, DetectError> {
        let scorer = self.scorer.as_ref().ok_or(DetectError::ModelUnavailable)?;
        if text.trim().is_empty() {
            return Err(DetectError::InvalidInput);
        }

        let logits = scorer.logits(&text.to_lowercase())?;
        let prediction = Prediction::from_logits(&logits)?;
        log::debug!(
            "Predicted {} with confidence {:.4}",
            prediction.label,
            prediction.confidence
        );
        Ok(prediction)
    }
}

/// Fetches the model described by `info` and builds a detector around it.
///
/// Any failure (network, missing repository, incompatible graph) is logged
/// and yields [`Detector::unavailable`]; there is no retry.
pub async fn load_detector(
    manager: &ModelManager,
    info: &ModelInfo,
    runtime_config: RuntimeConfig,
    fresh: bool,
) -> Detector {
    if fresh {
        log::info!("Fresh download requested - removing any cached files for {}", info.repo);
        if let Err(e) = manager.remove_download(info) {
            log::warn!("Could not remove cached files: {}", e);
        }
    }

    if let Err(e) = manager.ensure_model_downloaded(info).await {
        log::error!("Failed to load model {}: {}", info.repo, e);
        if e.is_not_found() {
            log::error!(
                "{} must provide '{}' and '{}'; export the model to ONNX and set PHISHING_DETECTOR_MODEL or PHISHING_DETECTOR_ONNX_FILE",
                info.repo,
                info.onnx_file,
                info.tokenizer_file
            );
        }
        return Detector::unavailable();
    }

    let built = ClassifierBuilder::new()
        .with_runtime_config(runtime_config)
        .with_model(manager, info)
        .and_then(ClassifierBuilder::build);

    match built {
        Ok(classifier) => {
            log::info!("Model {} loaded from the hub", info.repo);
            Detector::new(Arc::new(classifier))
        }
        Err(e) => {
            log::error!("Failed to load model {}: {}", info.repo, e);
            Detector::unavailable()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scores by keyword and records every call.
    #[derive(Default)]
    struct KeywordScorer {
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl SequenceScorer for KeywordScorer {
        fn logits(&self, text: &str) -> Result<Vec<f32>, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(text.to_string());
            if text.contains("verify") {
                Ok(vec![-2.1, 3.4])
            } else {
                Ok(vec![1.7, -0.9])
            }
        }
    }

    struct FixedScorer(Vec<f32>);

    impl SequenceScorer for FixedScorer {
        fn logits(&self, _text: &str) -> Result<Vec<f32>, ClassifierError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_prediction_invariants() {
        for logits in [[0.3, 0.1], [-5.0, 5.0], [12.0, 11.999], [0.0, 0.0]] {
            let prediction = Prediction::from_logits(&logits).unwrap();
            let sum: f32 = prediction.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
            assert_eq!(prediction.confidence, prediction.probability(prediction.label));
            assert!(prediction.confidence >= 0.5);
        }
    }

    #[test]
    fn test_ties_pick_legitimate() {
        let prediction = Prediction::from_logits(&[1.0, 1.0]).unwrap();
        assert_eq!(prediction.label, Label::Legitimate);
    }

    #[test]
    fn test_bad_logits_rejected() {
        assert!(Prediction::from_logits(&[1.0]).is_err());
        assert!(Prediction::from_logits(&[1.0, 2.0, 3.0]).is_err());
        assert!(Prediction::from_logits(&[f32::NAN, 0.0]).is_err());
    }

    #[test]
    fn test_lowercases_before_scoring() {
        let scorer = Arc::new(KeywordScorer::default());
        let detector = Detector::new(scorer.clone());

        let prediction = detector.predict("Please VERIFY your account").unwrap();
        assert_eq!(prediction.label, Label::Phishing);
        assert!(prediction.label.is_phishing());
        assert_eq!(scorer.seen.lock().unwrap().as_slice(), ["please verify your account"]);
    }

    #[test]
    fn test_empty_input_never_scored() {
        let scorer = Arc::new(KeywordScorer::default());
        let detector = Detector::new(scorer.clone());

        for text in ["", "   ", "\n\t "] {
            assert!(matches!(detector.predict(text), Err(DetectError::InvalidInput)));
        }
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unavailable_model() {
        let detector = Detector::unavailable();
        assert!(!detector.is_available());
        assert!(matches!(detector.predict("hello"), Err(DetectError::ModelUnavailable)));
        assert!(matches!(detector.predict(""), Err(DetectError::ModelUnavailable)));
    }

    #[test]
    fn test_idempotent() {
        let detector = Detector::new(Arc::new(KeywordScorer::default()));
        let first = detector.predict("The quarterly meeting is on Tuesday").unwrap();
        let second = detector.predict("The quarterly meeting is on Tuesday").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.label, Label::Legitimate);
    }

    #[test]
    fn test_scorer_shape_errors_fail_request() {
        let detector = Detector::new(Arc::new(FixedScorer(vec![0.1, 0.2, 0.3])));
        assert!(matches!(
            detector.predict("hello"),
            Err(DetectError::Inference(ClassifierError::PredictionError(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_failure_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let info = ModelInfo::new("acme/missing").with_hub_url("http://127.0.0.1:9");

        let detector = load_detector(&manager, &info, RuntimeConfig::default(), true).await;
        assert!(!detector.is_available());
    }
}
