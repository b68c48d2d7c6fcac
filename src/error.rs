// Error taxonomy for the router.
//
// Mirrors the teacher's `DbError`: one flat `thiserror` enum, string
// payloads for detail, a stable `code()` for callers that want to match
// on something other than the `Display` text.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Error, Debug)]
pub enum RouterError {
    #[error("failed to parse SQL: {0}")]
    ParseError(String),

    #[error("query references no tables")]
    NoTables,

    #[error("partition catalog missing for table root {0}")]
    CatalogMissing(String),

    #[error("engine {engine_id} failed: {detail}")]
    EngineError { engine_id: String, detail: String },

    #[error("engine {0} timed out")]
    EngineTimeout(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RouterError {
    /// Stable string code for the error surface, independent of the
    /// human-readable message.
    pub fn code(&self) -> &'static str {
        match self {
            RouterError::ParseError(_) => "PARSE_ERROR",
            RouterError::NoTables => "NO_TABLES",
            RouterError::CatalogMissing(_) => "CATALOG_MISSING",
            RouterError::EngineError { .. } => "ENGINE_ERROR",
            RouterError::EngineTimeout(_) => "ENGINE_TIMEOUT",
            RouterError::Config(_) => "CONFIG_ERROR",
            RouterError::Io(_) => "IO_ERROR",
        }
    }
}
