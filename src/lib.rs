//! # polyapi - terminal menu over public REST APIs
//!
//! polyapi looks up addresses, weather and stock quotes from public services
//! and keeps a small local cache so previous lookups can be reused:
//! - Local reference store (SQLite) for geocoded addresses and ticker symbols
//! - Census geocoding, NOAA weather and Alpha Vantage quote clients
//! - A numbered, text-driven menu tree read from standard input

pub mod api;
pub mod config;
pub mod menu;
pub mod record;
pub mod storage;
pub mod ui;

// Re-exports for convenient access
pub use record::{AddressRecord, NewTicker, TickerRecord};
pub use storage::ReferenceStore;

/// Result type alias for polyapi operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for polyapi operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0} environment variable is not set")]
    MissingCredential(&'static str),

    #[error("Daily API quota exceeded")]
    QuotaExceeded,

    #[error("Invalid ticker symbol: {0}")]
    InvalidSymbol(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl Error {
    /// Storage and terminal IO failures end the session; everything else
    /// aborts only the operation that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_) | Error::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_split() {
        let storage = Error::Storage(rusqlite::Error::InvalidQuery);
        assert!(storage.is_fatal());
        assert!(!Error::QuotaExceeded.is_fatal());
        assert!(!Error::MissingCredential("ALPHAVANTAGE_API_KEY").is_fatal());
        assert!(!Error::Upstream("bad gateway".into()).is_fatal());
    }

    #[test]
    fn test_missing_credential_message() {
        let err = Error::MissingCredential("ALPHAVANTAGE_API_KEY");
        assert_eq!(err.to_string(), "ALPHAVANTAGE_API_KEY environment variable is not set");
    }
}
