//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Json, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use super::state::AppState;
use crate::classifier::ClassifierError;
use crate::detector::{DetectError, Detector, Prediction};
use crate::report::{
    self, PredictResponse, ANALYSIS_FAILED_MESSAGE, EMPTY_INPUT_MESSAGE, EXAMPLES, MODEL_UNAVAILABLE_MESSAGE,
    REJECTED_REQUEST_MESSAGE,
};

const INDEX_PAGE: &str = include_str!("assets/index.html");
const DEMO_PAGE: &str = include_str!("assets/demo.html");
const MARKDOWN: &str = "text/markdown; charset=utf-8";

/// Router for the JSON API
pub fn api_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(|| async { Html(INDEX_PAGE) }))
        .route("/health", get(health_check))
        .route("/api/predict", post(predict));
    finish(router, state)
}

/// Router for the interactive demo
pub fn demo_router(state: Arc<AppState>) -> Router {
    let router = Router::new()
        .route("/", get(|| async { Html(DEMO_PAGE) }))
        .route("/health", get(health_check))
        .route("/api/examples", get(examples))
        .route("/api/analyze", post(analyze));
    finish(router, state)
}

fn finish(router: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    let cors_enabled = state.config.cors_enabled;
    let router = router
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state);
    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Prediction request body
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub text: Option<String>,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model_loaded: bool,
    pub uptime_secs: u64,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        model_loaded: state.detector.is_available(),
        uptime_secs: state.uptime().as_secs(),
    })
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn from_rejection(rejection: &JsonRejection) -> Self {
        let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StatusCode::PAYLOAD_TOO_LARGE
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::new(status, rejection.body_text())
    }
}

impl From<DetectError> for ApiError {
    fn from(err: DetectError) -> Self {
        let status = match err {
            DetectError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::InvalidInput => StatusCode::BAD_REQUEST,
            DetectError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}

/// Runs one prediction off the async executor.
async fn run_prediction(detector: Detector, text: String) -> Result<Prediction, DetectError> {
    tokio::task::spawn_blocking(move || detector.predict(&text))
        .await
        .unwrap_or_else(|e| {
            Err(DetectError::Inference(ClassifierError::PredictionError(format!(
                "Inference task failed: {}",
                e
            ))))
        })
}

/// Structured prediction endpoint
async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    if !state.detector.is_available() {
        return Err(DetectError::ModelUnavailable.into());
    }
    let Json(request) = payload.map_err(|rejection| ApiError::from_rejection(&rejection))?;
    let text = request.text.unwrap_or_default();

    match run_prediction(state.detector.clone(), text).await {
        Ok(prediction) => Ok(Json(PredictResponse::from(&prediction))),
        Err(e) => {
            if let DetectError::Inference(inner) = &e {
                log::error!("Prediction failed: {}", inner);
            }
            Err(e.into())
        }
    }
}

async fn examples() -> impl IntoResponse {
    Json(EXAMPLES)
}

/// Narrative endpoint: always answers with Markdown meant for people.
async fn analyze(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Response {
    let text = match payload {
        Ok(Json(request)) => request.text.unwrap_or_default(),
        Err(rejection) => {
            let error = ApiError::from_rejection(&rejection);
            log::debug!("Rejected analyze request: {}", error.message);
            return (error.status, [(header::CONTENT_TYPE, MARKDOWN)], REJECTED_REQUEST_MESSAGE).into_response();
        }
    };

    let (status, body) = match run_prediction(state.detector.clone(), text).await {
        Ok(prediction) => (StatusCode::OK, report::render_report(&prediction)),
        Err(DetectError::ModelUnavailable) => (StatusCode::OK, MODEL_UNAVAILABLE_MESSAGE.to_string()),
        Err(DetectError::InvalidInput) => (StatusCode::OK, EMPTY_INPUT_MESSAGE.to_string()),
        Err(DetectError::Inference(e)) => {
            log::error!("Analysis failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED_MESSAGE.to_string())
        }
    };
    (status, [(header::CONTENT_TYPE, MARKDOWN)], body).into_response()
}
