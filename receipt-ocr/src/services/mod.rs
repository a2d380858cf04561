//! Ingest services: provider client, fan-out, normalization, pipeline

pub mod fan_out;
pub mod ingest;
pub mod normalizer;
pub mod ocr_client;
pub mod schema_path;

pub use fan_out::{FanOutCoordinator, FanOutError};
pub use ingest::{IngestError, IngestPipeline, IngestSummary};
pub use normalizer::{NormalizeError, NumberPolicy, ResultNormalizer};
pub use ocr_client::{ClovaOcrClient, OcrImage, OcrProvider, OcrRequest, ProviderError, RawRecognition};
pub use schema_path::{PathError, SchemaPath};
