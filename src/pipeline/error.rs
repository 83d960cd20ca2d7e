use thiserror::Error;

use crate::codebook::CodebookError;
use crate::engine::EngineError;
use crate::features::FeatureError;
use crate::mapper::MapperError;

/// Errors from the pass controller and the batch transformer.
///
/// `Config`, `Codebook` and `Mapper` abort a batch before any item is touched;
/// the rest end a single item and are recorded in its outcome.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Codebook(#[from] CodebookError),

    #[error(transparent)]
    Mapper(#[from] MapperError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// The engine failed in the named stage.
    #[error("{stage} failed: {source}")]
    Engine {
        stage: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unexpected failure of the worker pool itself.
    #[error("Internal error: {0}")]
    Internal(String),
}
