use std::path::{Path, PathBuf};
use std::fs;
use std::io;
use std::sync::Arc;
use std::env;
use tokio::sync::Mutex;
use sha2::{Sha256, Digest};

use crate::models::ModelInfo;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Download error: {0}")]
    DownloadError(#[from] reqwest::Error),
    #[error("Hub returned {status} for {url}")]
    HttpStatus {
        status: reqwest::StatusCode,
        url: String,
    },
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Model verification failed")]
    VerificationFailed,
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

impl ModelError {
    /// True when the hub has no file at the requested path.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

/// Local cache of hub model files.
///
/// Files live under `<models_dir>/<cache name>/`; downloads are serialized
/// through a shared lock so clones of the same manager never fetch a file twice.
#[derive(Clone, Debug)]
pub struct ModelManager {
    models_dir: PathBuf,
    download_lock: Arc<Mutex<()>>,
}

impl ModelManager {
    /// Creates a new ModelManager with the default models directory
    pub fn new_default() -> io::Result<Self> {
        Self::new(Self::get_default_models_dir())
    }

    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        Self::models_dir_from(env::var_os("PHISHING_DETECTOR_CACHE").map(PathBuf::from))
    }

    fn models_dir_from(cache_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = cache_override {
            return path.join("models");
        }

        if let Some(cache_dir) = dirs::cache_dir() {
            return cache_dir.join("phishing-detector").join("models");
        }

        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".cache").join("phishing-detector").join("models");
        }

        env::temp_dir().join("phishing-detector").join("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> io::Result<Self> {
        let models_dir = models_dir.as_ref().to_path_buf();
        fs::create_dir_all(&models_dir)?;
        Ok(Self {
            models_dir,
            download_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// Local copy of the graph; mirrors its path inside the repository so a
    /// different `onnx_file` never resolves to a previously cached graph.
    pub fn get_model_path(&self, info: &ModelInfo) -> PathBuf {
        self.cached_file(info, &info.onnx_file)
    }

    pub fn get_tokenizer_path(&self, info: &ModelInfo) -> PathBuf {
        self.cached_file(info, &info.tokenizer_file)
    }

    fn cached_file(&self, info: &ModelInfo, repo_file: &str) -> PathBuf {
        let mut path = self.models_dir.join(info.cache_name());
        for part in repo_file.split('/').filter(|part| !part.is_empty() && *part != "." && *part != "..") {
            path.push(part);
        }
        path
    }

    pub fn is_model_downloaded(&self, info: &ModelInfo) -> bool {
        let model_path = self.get_model_path(info);
        let tokenizer_path = self.get_tokenizer_path(info);
        log::debug!("Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::debug!("Tokenizer path: {:?} (exists: {})", tokenizer_path, tokenizer_path.exists());
        model_path.exists() && tokenizer_path.exists()
    }

    /// Downloads the graph and tokenizer of `info`, reusing cached files
    /// that still pass verification. Partial downloads are removed on failure.
    pub async fn download_model(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let _lock = self.download_lock.lock().await;

        let model_dir = self.models_dir.join(info.cache_name());
        log::info!("Using model directory {:?}", model_dir);
        fs::create_dir_all(&model_dir)?;

        let model_path = self.get_model_path(info);
        let model_result = self
            .fetch_if_needed(&info.model_url(), &model_path, info.model_hash.as_deref(), "model")
            .await;

        let tokenizer_path = self.get_tokenizer_path(info);
        let tokenizer_result = match &model_result {
            Ok(()) => {
                self.fetch_if_needed(
                    &info.tokenizer_url(),
                    &tokenizer_path,
                    info.tokenizer_hash.as_deref(),
                    "tokenizer",
                )
                .await
            }
            Err(_) => Ok(()),
        };

        match (model_result, tokenizer_result) {
            (Ok(()), Ok(())) => {
                log::info!("Model and tokenizer for {} ready to use", info.repo);
                Ok(())
            }
            (Err(e), _) => {
                log::error!("Failed to set up model file: {}", e);
                let _ = self.remove_download(info);
                Err(e)
            }
            (_, Err(e)) => {
                log::error!("Failed to set up tokenizer file: {}", e);
                let _ = self.remove_download(info);
                Err(e)
            }
        }
    }

    async fn fetch_if_needed(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        if path.exists() {
            if self.verify_file(path, expected_hash)? {
                log::info!("Existing {} file verified: {:?}", file_type, path);
                return Ok(());
            }
            log::warn!("{} file at {:?} failed verification, downloading again", file_type, path);
        }
        self.download_and_verify_file(url, path, expected_hash, file_type).await
    }

    /// A file without an expected hash passes as long as it exists.
    fn verify_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<bool, ModelError> {
        let Some(expected) = expected_hash else {
            return Ok(path.exists());
        };
        let bytes = fs::read(path)?;
        let hash = sha256_hex(&bytes);
        log::debug!("Calculated hash {} for {:?}, expected {}", hash, path, expected);
        Ok(hash.eq_ignore_ascii_case(expected))
    }

    pub fn verify_model(&self, info: &ModelInfo) -> Result<bool, ModelError> {
        let model_path = self.get_model_path(info);
        let tokenizer_path = self.get_tokenizer_path(info);

        if !model_path.exists() || !tokenizer_path.exists() {
            log::info!("Model files for {} are not present", info.repo);
            return Ok(false);
        }

        let model_ok = self.verify_file(&model_path, info.model_hash.as_deref())?;
        let tokenizer_ok = self.verify_file(&tokenizer_path, info.tokenizer_hash.as_deref())?;
        log::info!("Verification of {}: model {}, tokenizer {}", info.repo, model_ok, tokenizer_ok);

        Ok(model_ok && tokenizer_ok)
    }

    async fn download_and_verify_file(
        &self,
        url: &str,
        path: &Path,
        expected_hash: Option<&str>,
        file_type: &str,
    ) -> Result<(), ModelError> {
        log::info!("Downloading {} file from {}", file_type, url);
        let response = reqwest::get(url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ModelError::HttpStatus {
                status,
                url: url.to_string(),
            });
        }
        let bytes = response.bytes().await?;
        log::info!("Downloaded {} bytes", bytes.len());

        if let Some(expected) = expected_hash {
            let hash = sha256_hex(&bytes);
            if !hash.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, hash);
                return Err(ModelError::HashMismatch {
                    file_type: file_type.to_string(),
                    expected: expected.to_string(),
                    actual: hash,
                });
            }
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;

        if !self.verify_file(path, expected_hash)? {
            return Err(ModelError::VerificationFailed);
        }

        log::info!("{} file stored at {:?}", file_type, path);
        Ok(())
    }

    pub fn remove_download(&self, info: &ModelInfo) -> Result<(), ModelError> {
        let model_path = self.get_model_path(info);
        let tokenizer_path = self.get_tokenizer_path(info);

        if model_path.exists() {
            fs::remove_file(&model_path)?;
        }
        if tokenizer_path.exists() {
            fs::remove_file(&tokenizer_path)?;
        }
        Ok(())
    }

    /// Ensures that a model is downloaded and verified.
    /// If the model doesn't exist, it will be downloaded.
    /// If verification fails, it will be re-downloaded.
    pub async fn ensure_model_downloaded(&self, info: &ModelInfo) -> Result<(), ModelError> {
        if !self.is_model_downloaded(info) {
            log::info!("Model {} not cached, downloading...", info.repo);
            self.download_model(info).await?;
        } else if !self.verify_model(info)? {
            log::warn!("Cached model {} failed verification, re-downloading...", info.repo);
            self.remove_download(info)?;
            self.download_model(info).await?;
        }
        Ok(())
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
