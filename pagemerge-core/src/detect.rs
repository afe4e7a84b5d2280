use std::sync::Arc;

use futures::future;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tokio::sync::Semaphore;
use tracing::*;

use crate::{
    consts::{MAX_CONCURRENT_TASKS, MAX_CONCURRENT_TASKS_ENV_NAME},
    error::{JsonSnafu, MergeError},
    layout::{element::Detection, page::PageDetections},
};

/// Layout recognizer that turns a page image into raw detections.
#[async_trait::async_trait]
pub trait Detector: Send + Sync {
    async fn detect(
        &self,
        page_number: u32,
        image: &DynamicImage,
    ) -> Result<Vec<Detection>, MergeError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// Detector calls allowed in flight at once.
    pub max_concurrent_tasks: usize,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: MAX_CONCURRENT_TASKS,
        }
    }
}

impl DetectConfig {
    /// Default config with the concurrency cap taken from the environment
    /// when it holds a positive number.
    pub fn from_env() -> Self {
        match std::env::var(MAX_CONCURRENT_TASKS_ENV_NAME) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Self {
                    max_concurrent_tasks: n,
                },
                _ => {
                    warn!(
                        "Ignoring {}={:?}, using {}",
                        MAX_CONCURRENT_TASKS_ENV_NAME, raw, MAX_CONCURRENT_TASKS
                    );
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

/// Decodes the recognizer's JSON answer for one page.
pub fn try_parse_detections(raw: &str) -> Result<Vec<Detection>, MergeError> {
    serde_json::from_str(raw).context(JsonSnafu {
        stage: "parse-detections",
    })
}

/// Like [`try_parse_detections`], but a malformed answer is logged and read
/// as a page without detections.
pub fn parse_detections(raw: &str) -> Vec<Detection> {
    try_parse_detections(raw).unwrap_or_else(|e| {
        warn!("Malformed detector output, treating page as empty: {}", e);
        Vec::new()
    })
}

/// Runs the detector over every page with at most
/// `config.max_concurrent_tasks` calls in flight.
///
/// Results come back in input order. A page whose detection fails is logged
/// and returned with no detections, the other pages are unaffected.
pub async fn detect_pages<D: Detector + ?Sized>(
    detector: &D,
    pages: &[(u32, DynamicImage)],
    config: &DetectConfig,
) -> Vec<PageDetections> {
    let permits = Arc::new(Semaphore::new(config.max_concurrent_tasks.max(1)));

    let tasks = pages.iter().map(|(page_number, image)| {
        let permits = permits.clone();
        async move {
            let _permit = permits.acquire().await;
            let detections = match detector.detect(*page_number, image).await {
                Ok(detections) => {
                    debug!("Page {} yielded {} detections", page_number, detections.len());
                    detections
                }
                Err(e) => {
                    error!("Detection failed for page {}: {}", page_number, e);
                    Vec::new()
                }
            };
            PageDetections::new(*page_number, detections)
        }
    });

    let results = future::join_all(tasks).await;
    info!("Detected layout on {} pages", results.len());
    results
}
