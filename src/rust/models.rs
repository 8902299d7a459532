use std::env;

/// Hub repository of the default phishing model.
///
/// ONNX Runtime loads an ONNX graph, not PyTorch weights. When a repository
/// only ships `pytorch_model.bin` or `model.safetensors`, export it first:
///
/// ```text
/// optimum-cli export onnx --model moizsheraz/phishing-detection-model \
///     --task text-classification phishing-onnx/
/// ```
///
/// then publish `phishing-onnx/model.onnx` under `onnx/` in a repository of
/// your own and point `PHISHING_DETECTOR_MODEL` at it, or set
/// `PHISHING_DETECTOR_ONNX_FILE` to where the graph lives. Without a graph
/// at that path the detector starts in the unavailable state.
pub const DEFAULT_REPO: &str = "moizsheraz/phishing-detection-model";
/// Base URL files are resolved against.
pub const DEFAULT_HUB_URL: &str = "https://huggingface.co";

/// Static properties of a sequence-classification model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCharacteristics {
    /// Inputs longer than this are truncated by the tokenizer.
    pub max_sequence_length: usize,
    /// Number of logits the classification head produces.
    pub num_labels: usize,
}

impl Default for ModelCharacteristics {
    fn default() -> Self {
        Self {
            max_sequence_length: 512,
            num_labels: 2,
        }
    }
}

/// Models shipped with a known hub location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinModel {
    /// Binary phishing / legitimate email classifier.
    PhishingDetector,
}

impl BuiltinModel {
    pub fn get_model_info(&self) -> ModelInfo {
        match self {
            Self::PhishingDetector => ModelInfo::new(DEFAULT_REPO),
        }
    }
}

/// Where a model lives on the hub and how its files are checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Repository name, e.g. `owner/model`.
    pub repo: String,
    /// Branch, tag or commit.
    pub revision: String,
    /// Path of the ONNX graph inside the repository.
    pub onnx_file: String,
    /// Path of the tokenizer definition inside the repository.
    pub tokenizer_file: String,
    /// Hub base URL, `https://huggingface.co` unless overridden.
    pub hub_url: String,
    /// Optional SHA-256 of the ONNX graph, lowercase hex.
    pub model_hash: Option<String>,
    /// Optional SHA-256 of the tokenizer file, lowercase hex.
    pub tokenizer_hash: Option<String>,
}

impl ModelInfo {
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            revision: "main".to_string(),
            onnx_file: "onnx/model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            model_hash: None,
            tokenizer_hash: None,
        }
    }

    /// Builds the default model description, letting environment variables
    /// override the repository, revision, graph path and hub URL.
    pub fn from_env() -> Self {
        let mut info = BuiltinModel::PhishingDetector.get_model_info();
        if let Ok(repo) = env::var("PHISHING_DETECTOR_MODEL") {
            info.repo = repo;
        }
        if let Ok(revision) = env::var("PHISHING_DETECTOR_REVISION") {
            info.revision = revision;
        }
        if let Ok(file) = env::var("PHISHING_DETECTOR_ONNX_FILE") {
            info.onnx_file = file;
        }
        if let Ok(url) = env::var("PHISHING_DETECTOR_HUB_URL") {
            info.hub_url = url;
        }
        info
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    pub fn with_onnx_file(mut self, file: impl Into<String>) -> Self {
        self.onnx_file = file.into();
        self
    }

    pub fn with_hub_url(mut self, url: impl Into<String>) -> Self {
        self.hub_url = url.into();
        self
    }

    pub fn with_hashes(mut self, model_hash: impl Into<String>, tokenizer_hash: impl Into<String>) -> Self {
        self.model_hash = Some(model_hash.into());
        self.tokenizer_hash = Some(tokenizer_hash.into());
        self
    }

    pub fn model_url(&self) -> String {
        self.resolve_url(&self.onnx_file)
    }

    pub fn tokenizer_url(&self) -> String {
        self.resolve_url(&self.tokenizer_file)
    }

    /// Directory name used for this model inside the local cache.
    pub fn cache_name(&self) -> String {
        format!("{}@{}", self.repo.replace('/', "--"), self.revision)
    }

    fn resolve_url(&self, file: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.hub_url.trim_end_matches('/'),
            self.repo,
            self.revision,
            file.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_urls() {
        let info = BuiltinModel::PhishingDetector.get_model_info();
        assert_eq!(
            info.model_url(),
            "https://huggingface.co/moizsheraz/phishing-detection-model/resolve/main/onnx/model.onnx"
        );
        assert_eq!(
            info.tokenizer_url(),
            "https://huggingface.co/moizsheraz/phishing-detection-model/resolve/main/tokenizer.json"
        );
    }

    #[test]
    fn test_overrides() {
        let info = ModelInfo::new("acme/mail-guard")
            .with_revision("v2")
            .with_onnx_file("/model.onnx")
            .with_hub_url("http://localhost:8080/");
        assert_eq!(info.model_url(), "http://localhost:8080/acme/mail-guard/resolve/v2/model.onnx");
        assert_eq!(info.cache_name(), "acme--mail-guard@v2");
    }
}
