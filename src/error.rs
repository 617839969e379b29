//! Error types for grid market data retrieval
//!
//! Failure modes are layered the same way everywhere in the crate:
//! - Parse errors (payload shape drifted, values that do not parse)
//! - API errors (HTTP status, network, client construction)
//! - Local faults (cache file I/O, configuration, impossible local times)
//!
//! Availability gaps (non-200 responses) are normally not errors at all: they
//! become holes in the assembled table, see [`crate::http::FailurePolicy`].

use thiserror::Error;

/// Convenience alias used by every fallible operation in the crate
pub type Result<T> = std::result::Result<T, MarketDataError>;

/// Top-level error type
///
/// Supports automatic conversion from the specific error types via `From`
#[derive(Debug, Error)]
pub enum MarketDataError {
    /// Provider payload could not be parsed
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// HTTP API error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Power plant list file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local time that does not exist or cannot be represented
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// Column length does not match the table index
    #[error("Column '{label}' has {actual} values, index has {expected} rows")]
    ShapeMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// Payload parsing errors
///
/// Raised when a provider response does not have the expected shape. These are
/// fatal for the whole request: schema drift needs a code change, not a retry.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// Numeric field that is neither empty nor a valid number
    ///
    /// Example: "12,5a" in a BMRS `Quantity` column
    #[error("Invalid decimal format: '{0}'")]
    InvalidDecimal(String),

    /// Timestamp that cannot be parsed or converted
    ///
    /// Example: epoch milliseconds outside the representable range
    #[error("Invalid timestamp: '{0}'")]
    InvalidTimestamp(String),

    /// Required CSV column is missing
    ///
    /// Example: missing "Settlement Period" header in a B1620 response
    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    /// CSV format error (malformed row, missing header line)
    #[error("CSV format error: {0}")]
    CsvFormat(String),

    /// JSON body does not match the expected structure
    #[error("JSON format error: {0}")]
    Json(String),

    /// A day index with a slot count that no DST transition can produce
    #[error("Unexpected slot count {actual} for a day with {nominal} nominal slots")]
    UnexpectedSlotCount { actual: usize, nominal: usize },

    /// Settlement period outside the slots of the settlement day
    #[error("Settlement period {period} outside 1..={slots}")]
    PeriodOutOfRange { period: i64, slots: usize },
}

/// HTTP API errors
///
/// Only surfaced when the failure policy is [`crate::http::FailurePolicy::Abort`];
/// under the default policy they are logged and the fetch unit becomes a hole.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP status other than 200
    ///
    /// Common codes:
    /// - 403: Invalid BMRS API key
    /// - 404: No data published for that week/day
    /// - 500: Server error
    #[error("HTTP {status} error for {url}")]
    HttpError { status: u16, url: String },

    /// Network error (connection refused, timeout, DNS failure)
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::CsvFormat(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        ParseError::Json(err.to_string())
    }
}

impl From<csv::Error> for MarketDataError {
    fn from(err: csv::Error) -> Self {
        MarketDataError::Parse(err.into())
    }
}

impl From<serde_json::Error> for MarketDataError {
    fn from(err: serde_json::Error) -> Self {
        MarketDataError::Parse(err.into())
    }
}
