use phishing_detector::{BuiltinModel, ModelError, ModelInfo, ModelManager};

#[tokio::test]
async fn test_model_paths() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let info = ModelInfo::new("acme/mail-guard").with_revision("v1");

    let model_path = manager.get_model_path(&info);
    let tokenizer_path = manager.get_tokenizer_path(&info);
    assert!(model_path.ends_with("acme--mail-guard@v1/onnx/model.onnx"));
    assert!(tokenizer_path.ends_with("acme--mail-guard@v1/tokenizer.json"));
    assert!(model_path.starts_with(manager.models_dir()));
    Ok(())
}

#[tokio::test]
async fn test_model_verification() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let info = ModelInfo::new("acme/mail-guard").with_hashes(
        // SHA-256 of "graph" and "{}"
        "eef93e1d14482804277fca0172464032d1a4fdbcc338524059fa1e861454ad4d",
        "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a",
    );

    assert!(!manager.verify_model(&info)?);

    let model_path = manager.get_model_path(&info);
    std::fs::create_dir_all(model_path.parent().unwrap())?;
    std::fs::write(&model_path, "corrupted data")?;
    std::fs::write(manager.get_tokenizer_path(&info), "{}")?;
    assert!(!manager.verify_model(&info)?);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_hub() -> Result<(), ModelError> {
    let dir = tempfile::tempdir()?;
    let manager = ModelManager::new(dir.path())?;
    let info = ModelInfo::new("acme/mail-guard").with_hub_url("http://127.0.0.1:9");

    assert!(manager.ensure_model_downloaded(&info).await.is_err());
    assert!(!manager.is_model_downloaded(&info));
    Ok(())
}

#[tokio::test]
#[ignore = "downloads the model from the Hugging Face hub"]
async fn test_default_model_download() -> Result<(), ModelError> {
    let manager = ModelManager::new_default()?;
    let info = BuiltinModel::PhishingDetector.get_model_info();

    manager.ensure_model_downloaded(&info).await?;
    assert!(manager.is_model_downloaded(&info));
    assert!(manager.verify_model(&info)?);
    Ok(())
}
