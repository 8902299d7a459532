//! State shared by the request handlers.

use std::time::{Duration, Instant};

use super::config::ServerConfig;
use crate::detector::Detector;

/// Application state shared across handlers
#[derive(Debug)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Loaded classifier, or the unavailable sentinel
    pub detector: Detector,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, detector: Detector) -> Self {
        Self {
            config,
            detector,
            start_time: Instant::now(),
        }
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
