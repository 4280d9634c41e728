//! Coordination between the external feed and the local store.

pub mod ensure;

pub use ensure::{IngestionError, IngestionResult, Ingestor};
