// Community Portal - Core Library
// Store, calendar grid and payment lookup shared by the CLI, TUI and API server

pub mod calendar;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod lookup;
pub mod seed;
pub mod validation;

// Re-export commonly used types
pub use calendar::{
    build_calendar_grid, calendar_for_month, month_from_selector,
    CalendarGrid, EventSummary, GridCell, GRID_CELLS,
};
pub use clock::{Clock, FixedClock, PortalClock, SystemClock};
pub use config::PortalConfig;
pub use db::{
    CalendarEvent, FeePayment, NewsItem, PaymentRecord, Resident,
    RowCounts, SeedReport, Store, DEFAULT_NEWS_LIMIT,
};
pub use error::{PortalError, Result, ValidationError};
pub use lookup::{check_payment_status, lookup_history, LookupOutcome, PaymentStatus};
pub use seed::Seed;
pub use validation::{HistoryForm, HistoryRange, IdentityForm, ResidentIdentity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
