//! Error types for the community portal core.

use thiserror::Error;

/// Result type alias using the portal error.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors that can escape the core.
///
/// Query operations never return these; they degrade to empty results.
/// Only store construction, seeding, configuration and grid building do.
#[derive(Error, Debug)]
pub enum PortalError {
    /// The SQLite engine failed (fatal during initialization)
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A seed fixture could not be parsed
    #[error("Seed fixture error: {0}")]
    Seed(#[from] csv::Error),

    /// Month outside 1-12
    #[error("Invalid month: {0} (expected 1-12)")]
    InvalidMonth(u32),

    /// Year/month combination chrono cannot represent
    #[error("Invalid date: {year}-{month:02}")]
    InvalidDate { year: i32, month: u32 },

    /// Malformed configuration value
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Input validation failures, caught before the store is queried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("national id must contain exactly 13 digits")]
    NationalId,

    #[error("house code must contain only letters and digits")]
    HouseCode,

    #[error("first name must contain only letters")]
    FirstName,

    #[error("last name must contain only letters")]
    LastName,

    #[error("birth date is required")]
    BirthDateMissing,

    #[error("{field} must be a date in YYYY-MM-DD format")]
    MalformedDate { field: &'static str },

    #[error("{field} cannot be in the future")]
    FutureDate { field: &'static str },

    #[error("enter a house code to look up the payment history")]
    HistoryHouseMissing,

    #[error("select a date range to filter the payment history")]
    HistoryRangeMissing,
}
