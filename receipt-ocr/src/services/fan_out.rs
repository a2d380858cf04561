//! OCR fan-out coordinator
//!
//! Scatter-gather over a [`JoinSet`]: one task per image, all spawned up
//! front, gathered in completion order under one overall deadline. The
//! first failure (or the deadline) aborts every remaining task, so no
//! provider call outlives the request that started it.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use super::ocr_client::{OcrImage, OcrProvider, OcrRequest, ProviderError, RawRecognition};

/// Fan-out failure; exactly one is surfaced per run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FanOutError {
    #[error("OCR request for image {index} failed: {source}")]
    Provider { index: usize, source: ProviderError },

    #[error("OCR fan-out exceeded its {0:?} deadline")]
    DeadlineExceeded(Duration),

    #[error("OCR task failed: {0}")]
    TaskFailed(String),
}

/// Runs recognition requests concurrently against one provider
#[derive(Clone)]
pub struct FanOutCoordinator {
    provider: Arc<dyn OcrProvider>,
    version: String,
    lang: String,
    deadline: Duration,
}

impl FanOutCoordinator {
    pub fn new(
        provider: Arc<dyn OcrProvider>,
        version: impl Into<String>,
        lang: impl Into<String>,
        deadline: Duration,
    ) -> Self {
        Self {
            provider,
            version: version.into(),
            lang: lang.into(),
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Recognize every image, returning all results sorted by input index,
    /// or the first error observed.
    pub async fn recognize_all(
        &self,
        images: Vec<OcrImage>,
    ) -> Result<Vec<RawRecognition>, FanOutError> {
        let deadline = Instant::now() + self.deadline;
        let mut tasks = JoinSet::new();

        for (index, image) in images.into_iter().enumerate() {
            let provider = Arc::clone(&self.provider);
            let request = OcrRequest::new(&self.version, &self.lang, image);

            tasks.spawn(async move {
                let request_id = request.request_id.clone();
                match provider.recognize(&request).await {
                    Ok(document) => Ok(RawRecognition {
                        index,
                        request_id,
                        document,
                    }),
                    Err(source) => Err(FanOutError::Provider { index, source }),
                }
            });
        }

        let submitted = tasks.len();
        let mut results = Vec::with_capacity(submitted);

        let gathered = timeout_at(deadline, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Ok(recognition)) => {
                        debug!(
                            index = recognition.index,
                            request_id = %recognition.request_id,
                            "OCR result received"
                        );
                        results.push(recognition);
                    }
                    Ok(Err(e)) => return Err(e),
                    Err(join_error) => return Err(FanOutError::TaskFailed(join_error.to_string())),
                }
            }
            Ok(())
        })
        .await;

        match gathered {
            Ok(Ok(())) => {
                results.sort_by_key(|r| r.index);
                Ok(results)
            }
            Ok(Err(e)) => {
                tasks.abort_all();
                warn!(
                    images = submitted,
                    completed = results.len(),
                    error = %e,
                    "OCR fan-out failed, remaining requests aborted"
                );
                Err(e)
            }
            Err(_) => {
                tasks.abort_all();
                warn!(
                    images = submitted,
                    completed = results.len(),
                    deadline_ms = self.deadline.as_millis() as u64,
                    "OCR fan-out deadline exceeded, remaining requests aborted"
                );
                Err(FanOutError::DeadlineExceeded(self.deadline))
            }
        }
    }
}
