//! Formatting of predictions for the two front-ends.

use serde::Serialize;

use crate::detector::{Label, Prediction};

/// Sample texts offered by the interactive demo.
pub const EXAMPLES: [&str; 3] = [
    "Your account has been compromised! Click here to verify: http://secure-bank-verify.com",
    "The quarterly meeting is scheduled for Tuesday at 2 PM.",
    "Congratulations! You have won a $1000 gift card. Claim your prize now by entering your details.",
];

pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text to analyze.";

pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "The detection model is not available right now. Please try again later.";

/// Answer to a request body that is not valid JSON or exceeds the size limit.
pub const REJECTED_REQUEST_MESSAGE: &str =
    "This request could not be read. Send JSON like {\"text\": \"...\"} and keep it under the size limit.";

pub const ANALYSIS_FAILED_MESSAGE: &str = "Something went wrong while analyzing this text. Please try again.";

/// Converts a probability to a percentage rounded to two decimals.
pub fn percent(probability: f32) -> f64 {
    (f64::from(probability) * 10_000.0).round() / 100.0
}

/// JSON body of a successful `/api/predict` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub prediction: &'static str,
    pub is_phishing: bool,
    pub confidence: f64,
    pub probabilities: Probabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probabilities {
    pub legitimate: f64,
    pub phishing: f64,
}

impl From<&Prediction> for PredictResponse {
    fn from(prediction: &Prediction) -> Self {
        Self {
            prediction: prediction.label.as_str(),
            is_phishing: prediction.label.is_phishing(),
            confidence: percent(prediction.confidence),
            probabilities: Probabilities {
                legitimate: percent(prediction.probability(Label::Legitimate)),
                phishing: percent(prediction.probability(Label::Phishing)),
            },
        }
    }
}

const PHISHING_GUIDANCE: [&str; 5] = [
    "Do not click any links or open attachments in this message.",
    "Do not reply with passwords, codes or personal details.",
    "Check the sender address carefully; look-alike domains are common.",
    "Contact the organisation through a channel you already trust.",
    "Report the message to your IT or security team, then delete it.",
];

const LEGITIMATE_GUIDANCE: [&str; 3] = [
    "Stay alert: a legitimate verdict is not a guarantee.",
    "Verify unexpected requests for money or credentials with the sender directly.",
    "Hover over links to check where they really point before clicking.",
];

/// Renders the Markdown report shown by the interactive demo.
pub fn render_report(prediction: &Prediction) -> String {
    let (heading, summary, guidance): (&str, &str, &[&str]) = match prediction.label {
        Label::Phishing => (
            "## Warning: likely phishing",
            "This message shows strong signs of a phishing attempt.",
            &PHISHING_GUIDANCE[..],
        ),
        Label::Legitimate => (
            "## Looks legitimate",
            "This message does not show the usual signs of phishing.",
            &LEGITIMATE_GUIDANCE[..],
        ),
    };

    let mut report = String::new();
    report.push_str(heading);
    report.push_str("\n\n");
    report.push_str(summary);
    report.push_str("\n\n");
    report.push_str(&format!(
        "**Prediction:** {}  \n**Confidence:** {:.2}%\n\n",
        prediction.label,
        percent(prediction.confidence)
    ));
    report.push_str("### Probability breakdown\n\n");
    report.push_str("| Class | Probability |\n|---|---|\n");
    report.push_str(&format!(
        "| Legitimate | {:.2}% |\n| Phishing | {:.2}% |\n\n",
        percent(prediction.probability(Label::Legitimate)),
        percent(prediction.probability(Label::Phishing))
    ));
    report.push_str("### What to do\n\n");
    for line in guidance {
        report.push_str("- ");
        report.push_str(line);
        report.push('\n');
    }
    report
}
