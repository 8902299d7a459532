use std::path::Path;
use std::sync::Arc;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use ort::session::Session;
use log::{info, error};

use super::error::ClassifierError;
use super::classifier::PhishingClassifier;
use super::SequenceScorer;
use crate::{ModelCharacteristics, ModelInfo, ModelManager, runtime::{RuntimeConfig, create_session_builder}};

const PAD_TOKENS: [&str; 3] = ["[PAD]", "<pad>", "<PAD>"];
const SUPPORTED_INPUTS: [&str; 3] = ["input_ids", "attention_mask", "token_type_ids"];

/// A builder for constructing a [`PhishingClassifier`] with a fluent interface.
#[derive(Debug, Default)]
pub struct ClassifierBuilder {
    model_path: Option<String>,
    tokenizer_path: Option<String>,
    model_characteristics: ModelCharacteristics,
    runtime_config: RuntimeConfig,
}

/// Sets truncation and padding to exactly `max_length` tokens. The pad token
/// is taken from the tokenizer's own padding config, then from well-known pad
/// tokens in the vocabulary, then id 0.
pub fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> Result<(), ClassifierError> {
    if max_length == 0 {
        return Err(ClassifierError::ValidationError("Max sequence length must be positive".into()));
    }

    let mut padding = tokenizer.get_padding().cloned().unwrap_or_else(|| {
        let mut params = PaddingParams::default();
        if let Some((token, id)) = PAD_TOKENS
            .iter()
            .find_map(|t| tokenizer.token_to_id(t).map(|id| (*t, id)))
        {
            params.pad_token = token.to_string();
            params.pad_id = id;
        } else {
            params.pad_id = 0;
        }
        params
    });
    padding.strategy = PaddingStrategy::Fixed(max_length);
    padding.pad_to_multiple_of = None;
    tokenizer.with_padding(Some(padding));

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| ClassifierError::TokenizerError(format!("Failed to set truncation: {}", e)))?;
    Ok(())
}

impl ClassifierBuilder {
    /// Creates a new empty ClassifierBuilder instance with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the runtime configuration for ONNX model execution
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Overrides the token limit (512 by default).
    pub fn with_max_sequence_length(mut self, max_sequence_length: usize) -> Self {
        self.model_characteristics.max_sequence_length = max_sequence_length;
        self
    }

    /// Uses the files cached by `manager` for `model`.
    ///
    /// # Errors
    /// * `BuildError` if paths are already set or the model is not downloaded
    pub fn with_model(self, manager: &ModelManager, model: &ModelInfo) -> Result<Self, ClassifierError> {
        if !manager.is_model_downloaded(model) {
            return Err(ClassifierError::BuildError(format!(
                "Model '{}' is not downloaded. Please download it first using ModelManager::download_model()",
                model.repo
            )));
        }
        let model_path = manager.get_model_path(model);
        let tokenizer_path = manager.get_tokenizer_path(model);
        self.with_custom_model(&model_path.to_string_lossy(), &tokenizer_path.to_string_lossy())
    }

    /// Sets a custom ONNX graph and tokenizer file.
    ///
    /// # Errors
    /// * `BuildError` if either path is empty, does not exist, or paths are already set
    pub fn with_custom_model(mut self, model_path: &str, tokenizer_path: &str) -> Result<Self, ClassifierError> {
        if model_path.is_empty() || tokenizer_path.is_empty() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths cannot be empty".to_string()));
        }
        if self.model_path.is_some() || self.tokenizer_path.is_some() {
            return Err(ClassifierError::BuildError("Model and tokenizer paths already set".to_string()));
        }
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::BuildError(format!("Model file not found: {}", model_path)));
        }
        if !Path::new(tokenizer_path).exists() {
            return Err(ClassifierError::BuildError(format!("Tokenizer file not found: {}", tokenizer_path)));
        }

        self.model_path = Some(model_path.to_string());
        self.tokenizer_path = Some(tokenizer_path.to_string());
        Ok(self)
    }

    /// Loads the tokenizer and the ONNX session, validates the graph and
    /// runs one probe input to check the number of logits.
    pub fn build(self) -> Result<PhishingClassifier, ClassifierError> {
        let (Some(model_path), Some(tokenizer_path)) = (self.model_path, self.tokenizer_path) else {
            return Err(ClassifierError::BuildError("Model and tokenizer paths must be set".to_string()));
        };
        let characteristics = self.model_characteristics;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| {
                error!("Failed to load tokenizer: {}", e);
                ClassifierError::BuildError(format!("Failed to load tokenizer: {}", e))
            })?;
        configure_tokenizer(&mut tokenizer, characteristics.max_sequence_length)?;
        info!("Tokenizer loaded from {}", tokenizer_path);

        let session = create_session_builder(&self.runtime_config)?
            .commit_from_file(&model_path)?;
        let input_names = Self::validate_model(&session)?;
        info!("Model structure validated, inputs: {:?}", input_names);

        let classifier = PhishingClassifier {
            tokenizer: Arc::new(tokenizer),
            session: Arc::new(session),
            input_names,
            model_characteristics: characteristics,
        };

        let probe = classifier.logits("test input to check the classification head")?;
        if probe.len() != classifier.model_characteristics.num_labels {
            return Err(ClassifierError::BuildError(format!(
                "Model produces {} logits, expected {}",
                probe.len(),
                classifier.model_characteristics.num_labels
            )));
        }

        Ok(classifier)
    }

    /// Checks that the graph takes `input_ids` and `attention_mask` (and
    /// optionally `token_type_ids`, nothing else) and has an output.
    fn validate_model(session: &Session) -> Result<Vec<String>, ClassifierError> {
        let input_names: Vec<String> = session.inputs.iter().map(|input| input.name.clone()).collect();

        for required in ["input_ids", "attention_mask"] {
            if !input_names.iter().any(|name| name == required) {
                return Err(ClassifierError::ModelError(format!(
                    "Model is missing required input '{}', found {:?}",
                    required, input_names
                )));
            }
        }
        if let Some(unknown) = input_names.iter().find(|name| !SUPPORTED_INPUTS.contains(&name.as_str())) {
            return Err(ClassifierError::ModelError(format!("Unsupported model input '{}'", unknown)));
        }
        if session.outputs.is_empty() {
            return Err(ClassifierError::ModelError(
                "Model must have at least 1 output for logits".to_string()
            ));
        }

        Ok(input_names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/tokenizer.json");

    fn fixture_tokenizer() -> Tokenizer {
        Tokenizer::from_file(FIXTURE).expect("fixture tokenizer")
    }

    #[test]
    fn test_fixed_padding_and_truncation() -> Result<(), ClassifierError> {
        let mut tokenizer = fixture_tokenizer();
        configure_tokenizer(&mut tokenizer, 4)?;

        let short = tokenizer.encode("verify account", false).unwrap();
        assert_eq!(short.get_ids().len(), 4);
        assert_eq!(short.get_attention_mask(), &[1, 1, 0, 0]);
        assert_eq!(&short.get_ids()[2..], &[0, 0]);

        let long = tokenizer.encode("verify your account now click here", false).unwrap();
        assert_eq!(long.get_ids().len(), 4);
        assert_eq!(long.get_attention_mask(), &[1, 1, 1, 1]);
        Ok(())
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut tokenizer = fixture_tokenizer();
        assert!(matches!(
            configure_tokenizer(&mut tokenizer, 0),
            Err(ClassifierError::ValidationError(_))
        ));
    }

    #[test]
    fn test_path_validation() {
        assert!(ClassifierBuilder::new().with_custom_model("", "").is_err());
        assert!(ClassifierBuilder::new()
            .with_custom_model("/nonexistent/model.onnx", FIXTURE)
            .is_err());
        assert!(ClassifierBuilder::new()
            .with_custom_model(FIXTURE, "/nonexistent/tokenizer.json")
            .is_err());
    }

    #[test]
    fn test_paths_set_twice() {
        let result = ClassifierBuilder::new()
            .with_custom_model(FIXTURE, FIXTURE)
            .and_then(|builder| builder.with_custom_model(FIXTURE, FIXTURE));
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_build_requires_paths() {
        let result = ClassifierBuilder::new().with_max_sequence_length(128).build();
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }

    #[test]
    fn test_with_model_requires_download() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ModelManager::new(dir.path()).unwrap();
        let info = ModelInfo::new("acme/mail-guard");
        let result = ClassifierBuilder::new().with_model(&manager, &info);
        assert!(matches!(result, Err(ClassifierError::BuildError(_))));
    }
}
