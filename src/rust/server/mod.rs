//! HTTP front-ends.
//!
//! - [`api_router`]: JSON prediction endpoint plus a minimal page
//! - [`demo_router`]: interactive page rendering the Markdown report
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use phishing_detector::server::{api_router, AppState, ServerConfig};
//! use phishing_detector::Detector;
//!
//! # async fn run() -> std::io::Result<()> {
//! let config = ServerConfig::default().with_port(5000);
//! let state = Arc::new(AppState::new(config.clone(), Detector::unavailable()));
//! let listener = tokio::net::TcpListener::bind(config.addr).await?;
//! axum::serve(listener, api_router(state)).await
//! # }
//! ```

mod config;
mod handlers;
mod state;

pub use config::ServerConfig;
pub use handlers::{api_router, demo_router, health_check, PredictRequest};
pub use state::AppState;
