//! Tests against the real hub model. They download several hundred MB and
//! need network access, so they only run with `--ignored`.

use phishing_detector::{load_detector, Detector, Label, ModelInfo, ModelManager, RuntimeConfig};

async fn real_detector() -> Detector {
    let manager = ModelManager::new_default().expect("model cache");
    let detector = load_detector(&manager, &ModelInfo::from_env(), RuntimeConfig::default(), false).await;
    assert!(detector.is_available(), "model failed to load");
    detector
}

#[tokio::test]
#[ignore = "downloads the model from the Hugging Face hub"]
async fn test_phishing_example() {
    let detector = real_detector().await;
    let prediction = detector
        .predict("Your account has been compromised! Click here to verify: http://secure-bank-verify.com")
        .unwrap();

    assert_eq!(prediction.label, Label::Phishing);
    assert!(prediction.probability(Label::Phishing) > prediction.probability(Label::Legitimate));
}

#[tokio::test]
#[ignore = "downloads the model from the Hugging Face hub"]
async fn test_legitimate_example() {
    let detector = real_detector().await;
    let prediction = detector
        .predict("The quarterly meeting is scheduled for Tuesday at 2 PM.")
        .unwrap();
    assert_eq!(prediction.label, Label::Legitimate);
    assert!(!prediction.label.is_phishing());
}

#[tokio::test]
#[ignore = "downloads the model from the Hugging Face hub"]
async fn test_real_model_properties() {
    let detector = real_detector().await;
    let long_text = "please confirm your banking details ".repeat(400);

    for text in ["hello there", "URGENT: reset your password", long_text.as_str()] {
        let first = detector.predict(text).unwrap();
        let second = detector.predict(text).unwrap();
        assert_eq!(first, second);

        let sum: f32 = first.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert_eq!(first.confidence, first.probability(first.label));
    }
}
