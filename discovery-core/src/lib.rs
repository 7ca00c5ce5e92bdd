pub mod database;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod matching;
pub mod parser;
pub mod questions;
pub mod reconcile;
pub mod requirements;
pub mod settings;
pub mod types;

#[cfg(test)]
mod test_support;

pub use database::Database;
pub use engine::{DiscoveryEngine, OperationResult, OperationStatus};
pub use error::{DiscoveryError, StorageError};
pub use extractor::{DocumentExtractor, FileExtractor};
pub use generator::TextGenerator;
pub use settings::{EngineSettings, RetryPolicy};
