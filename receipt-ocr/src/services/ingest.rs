//! Receipt ingest pipeline
//!
//! recognize (fan-out) → normalize every result → save every record.
//! A provider or schema failure aborts before anything is written.
//! Records are saved concurrently and independently: a sibling's conflict
//! does not roll back records already saved.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::join_all;
use receipt_common::db::{PersistenceGuard, SaveError};
use receipt_common::Identity;
use thiserror::Error;
use tracing::{error, info, warn};

use super::fan_out::{FanOutCoordinator, FanOutError};
use super::normalizer::{NormalizeError, ResultNormalizer};
use super::ocr_client::OcrImage;

/// Format tags the provider accepts
const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "pdf", "tif", "tiff"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("no images submitted")]
    NoImages,

    #[error("image {index} is not valid base64: {reason}")]
    InvalidImage { index: usize, reason: String },

    #[error(transparent)]
    FanOut(#[from] FanOutError),

    #[error("OCR result for image {index} (request {request_id}) is unusable: {source}")]
    Normalize {
        index: usize,
        request_id: String,
        source: NormalizeError,
    },

    #[error("records already exist: {}", rnames.join(", "))]
    Conflict { rnames: Vec<String> },

    #[error("storage failure: {0}")]
    Storage(String),
}

/// Outcome of a fully successful ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    /// Record IDs in input order
    pub saved: Vec<String>,
}

/// Chains the fan-out coordinator, the normalizer and the persistence guard
pub struct IngestPipeline {
    fan_out: FanOutCoordinator,
    normalizer: ResultNormalizer,
    guard: PersistenceGuard,
    default_format: String,
}

impl IngestPipeline {
    pub fn new(
        fan_out: FanOutCoordinator,
        normalizer: ResultNormalizer,
        guard: PersistenceGuard,
        default_format: impl Into<String>,
    ) -> Self {
        Self {
            fan_out,
            normalizer,
            guard,
            default_format: default_format.into(),
        }
    }

    /// Recognize, normalize and save `images` for `identity`
    ///
    /// `format` applies to every image when given; otherwise each image's
    /// format is sniffed from its bytes.
    pub async fn process(
        &self,
        identity: &Identity,
        images: &[String],
        format: Option<&str>,
    ) -> Result<IngestSummary, IngestError> {
        if images.is_empty() {
            return Err(IngestError::NoImages);
        }

        let prepared = self.prepare_images(images, format)?;
        info!(uid = %identity.uid, images = prepared.len(), "Processing receipt images");

        let raw = self.fan_out.recognize_all(prepared).await?;

        let records = raw
            .iter()
            .map(|recognition| {
                self.normalizer
                    .normalize(&identity.uid, &recognition.document)
                    .map_err(|source| IngestError::Normalize {
                        index: recognition.index,
                        request_id: recognition.request_id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let outcomes = join_all(records.iter().map(|record| self.guard.save(identity, record))).await;

        let mut saved = Vec::with_capacity(records.len());
        let mut conflicts = Vec::new();
        let mut storage_failure = None;

        for (record, outcome) in records.iter().zip(outcomes) {
            match outcome {
                Ok(()) => saved.push(record.record.rid.clone()),
                Err(SaveError::Conflict { rname }) => conflicts.push(rname),
                Err(e) => {
                    error!(uid = %identity.uid, rname = %record.record.rname, error = %e, "Failed to save record");
                    if storage_failure.is_none() {
                        storage_failure = Some(e.to_string());
                    }
                }
            }
        }

        if let Some(reason) = storage_failure {
            return Err(IngestError::Storage(reason));
        }
        if !conflicts.is_empty() {
            warn!(uid = %identity.uid, duplicates = conflicts.len(), saved = saved.len(), "Duplicate receipts submitted");
            return Err(IngestError::Conflict { rnames: conflicts });
        }

        info!(uid = %identity.uid, records = saved.len(), "Receipts saved");
        Ok(IngestSummary { saved })
    }

    /// Validate payloads and pick each image's format tag
    fn prepare_images(
        &self,
        images: &[String],
        format: Option<&str>,
    ) -> Result<Vec<OcrImage>, IngestError> {
        let explicit = format.map(str::trim).filter(|f| !f.is_empty());

        images
            .iter()
            .enumerate()
            .map(|(index, payload)| {
                let data = strip_data_url(payload.trim());
                let bytes = STANDARD.decode(data).map_err(|e| IngestError::InvalidImage {
                    index,
                    reason: e.to_string(),
                })?;

                let tag = match explicit {
                    Some(f) => f.to_ascii_lowercase(),
                    None => sniff_format(&bytes).unwrap_or_else(|| self.default_format.clone()),
                };

                Ok(OcrImage::new(tag, data))
            })
            .collect()
    }
}

/// Drop a `data:image/png;base64,` prefix if present
fn strip_data_url(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => payload,
    }
}

fn sniff_format(bytes: &[u8]) -> Option<String> {
    infer::get(bytes)
        .map(|kind| kind.extension())
        .filter(|ext| SUPPORTED_FORMATS.contains(ext))
        .map(str::to_string)
}
