use crate::clock::Clock;
use crate::error::Result;
use crate::seed::Seed;
use chrono::{Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Default length of the news feed.
pub const DEFAULT_NEWS_LIMIT: usize = 3;

// ============================================================================
// RECORDS
// ============================================================================

/// Community news entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub date: NaiveDate,
    pub body: String,
}

/// Calendar entry, grouped by its `YYYY-MM-DD` date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Registered resident (tenant)
///
/// `national_id` is the 13-digit DPI and is unique. Its format is checked by
/// the caller (see `validation`), not by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub national_id: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
    pub house_code: String,
}

/// Full maintenance-fee payment row, as seeded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeePayment {
    pub house_code: String,
    pub fee_year: i32,
    /// 1-12
    pub fee_month: u32,
    pub payment_date: NaiveDate,
}

/// Payment history line returned by `Store::payment_history`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_date: NaiveDate,
    pub fee_month: u32,
    pub fee_year: i32,
}

/// Rows actually inserted by one `initialize` run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub news: usize,
    pub events: usize,
    pub residents: usize,
    pub payments: usize,
}

impl SeedReport {
    pub fn total(&self) -> usize {
        self.news + self.events + self.residents + self.payments
    }
}

/// Row count per relation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RowCounts {
    pub news: i64,
    pub events: i64,
    pub residents: i64,
    pub payments: i64,
}

// ============================================================================
// STORE
// ============================================================================

/// In-memory relational store for one portal session.
///
/// Built once at startup, seeded, then only read. Pass it by reference to
/// every query and to the calendar builder.
pub struct Store {
    conn: Connection,
    initialized: bool,
}

impl Store {
    /// Construct the in-memory engine. Schema and rows come from `initialize`.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Store {
            conn,
            initialized: false,
        })
    }

    /// Open, load the fixtures for `clock.today()` and seed.
    ///
    /// An `Err` here is fatal for the session: nothing may be queried.
    pub fn bootstrap(clock: &impl Clock) -> Result<Self> {
        let mut store = Store::open_in_memory()?;
        let seed = Seed::fixtures(clock.today())?;
        store.initialize(&seed)?;
        Ok(store)
    }

    /// Create the relations if absent and insert `seed` with an
    /// insert-if-absent policy. Safe to run repeatedly.
    pub fn initialize(&mut self, seed: &Seed) -> Result<SeedReport> {
        setup_schema(&self.conn)?;

        let tx = self.conn.transaction()?;
        let report = insert_seed(&tx, seed)?;
        tx.commit()?;

        self.initialized = true;
        info!(
            news = report.news,
            events = report.events,
            residents = report.residents,
            payments = report.payments,
            "store seeded"
        );

        Ok(report)
    }

    /// Whether `initialize` has completed at least once.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ------------------------------------------------------------------------
    // Queries: failures are logged and degrade to "no results"
    // ------------------------------------------------------------------------

    /// At most `limit` news items, newest first.
    pub fn latest_news(&self, limit: usize) -> Vec<NewsItem> {
        degrade("latest_news", self.query_latest_news(limit))
    }

    /// Events dated inside `month` (1-12) of `year`, oldest first.
    pub fn events_for_month(&self, month: u32, year: i32) -> Vec<CalendarEvent> {
        degrade("events_for_month", self.query_events_for_month(month, year))
    }

    /// Two-phase identity lookup.
    ///
    /// The first query ignores the birth date. Only if it finds nothing is
    /// the birth date added as an exact constraint. A resident whose id,
    /// house and names match is therefore returned even when the birth
    /// date was mistyped.
    pub fn verify_resident(
        &self,
        national_id: &str,
        house_code: &str,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
    ) -> Option<Resident> {
        debug!(national_id, house_code, first_name, last_name, birth_date, "verifying resident");

        degrade(
            "verify_resident",
            self.match_resident(national_id, house_code, first_name, last_name, birth_date),
        )
    }

    /// True iff a payment for exactly (`house_code`, `month`, `year`) exists.
    pub fn payment_exists(&self, house_code: &str, month: u32, year: i32) -> bool {
        degrade(
            "payment_exists",
            self.query_payment_exists(house_code, month, year),
        )
    }

    /// Payments of `house_code` with `start <= payment_date <= end`,
    /// most recent first. Empty when `start > end`.
    pub fn payment_history(
        &self,
        house_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<PaymentRecord> {
        if start > end {
            debug!(%start, %end, "payment history range is inverted");
            return Vec::new();
        }

        degrade(
            "payment_history",
            self.query_payment_history(house_code, start, end),
        )
    }

    /// Row count per relation.
    pub fn row_counts(&self) -> Result<RowCounts> {
        Ok(RowCounts {
            news: count_rows(&self.conn, "news")?,
            events: count_rows(&self.conn, "calendar_events")?,
            residents: count_rows(&self.conn, "residents")?,
            payments: count_rows(&self.conn, "fee_payments")?,
        })
    }

    fn query_latest_news(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let mut stmt = self.conn.prepare(
            "SELECT date, body
             FROM news
             ORDER BY date DESC, id ASC
             LIMIT ?1",
        )?;

        let news = stmt
            .query_map([limit], |row| {
                Ok(NewsItem {
                    date: row.get(0)?,
                    body: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(news)
    }

    fn query_events_for_month(&self, month: u32, year: i32) -> Result<Vec<CalendarEvent>> {
        let Some((first, next)) = month_bounds(month, year) else {
            debug!(month, year, "month outside calendar range");
            return Ok(Vec::new());
        };

        let mut stmt = self.conn.prepare(
            "SELECT date, title, description
             FROM calendar_events
             WHERE date >= ?1 AND date < ?2
             ORDER BY date ASC, id ASC",
        )?;

        let events = stmt
            .query_map(params![first, next], |row| {
                Ok(CalendarEvent {
                    date: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(events)
    }

    fn match_resident(
        &self,
        national_id: &str,
        house_code: &str,
        first_name: &str,
        last_name: &str,
        birth_date: &str,
    ) -> Result<Option<Resident>> {
        let found = self
            .conn
            .query_row(
                "SELECT national_id, first_name, last_name, birth_date, house_code
                 FROM residents
                 WHERE national_id = ?1
                   AND house_code = ?2
                   AND first_name = ?3
                   AND last_name = ?4",
                params![national_id, house_code, first_name, last_name],
                resident_from_row,
            )
            .optional()?;

        if found.is_some() {
            return Ok(found);
        }

        let found = self
            .conn
            .query_row(
                "SELECT national_id, first_name, last_name, birth_date, house_code
                 FROM residents
                 WHERE national_id = ?1
                   AND house_code = ?2
                   AND first_name = ?3
                   AND last_name = ?4
                   AND birth_date = ?5",
                params![national_id, house_code, first_name, last_name, birth_date],
                resident_from_row,
            )
            .optional()?;

        Ok(found)
    }

    fn query_payment_exists(&self, house_code: &str, month: u32, year: i32) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM fee_payments
                WHERE house_code = ?1 AND fee_month = ?2 AND fee_year = ?3
             )",
            params![house_code, month, year],
            |row| row.get(0),
        )?;

        debug!(house_code, month, year, exists, "payment check");
        Ok(exists)
    }

    fn query_payment_history(
        &self,
        house_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PaymentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT payment_date, fee_month, fee_year
             FROM fee_payments
             WHERE house_code = ?1
               AND payment_date BETWEEN ?2 AND ?3
             ORDER BY payment_date DESC",
        )?;

        let history = stmt
            .query_map(params![house_code, start, end], |row| {
                Ok(PaymentRecord {
                    payment_date: row.get(0)?,
                    fee_month: row.get(1)?,
                    fee_year: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(history)
    }
}

fn degrade<T: Default>(operation: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!(operation, error = %e, "query failed, returning no results");
        T::default()
    })
}

fn resident_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Resident> {
    Ok(Resident {
        national_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date: row.get(3)?,
        house_code: row.get(4)?,
    })
}

/// First day of the month and first day of the following month.
fn month_bounds(month: u32, year: i32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((first, next))
}

fn count_rows(conn: &Connection, table: &str) -> Result<i64> {
    let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    Ok(count)
}

// ============================================================================
// SCHEMA & SEED
// ============================================================================

fn setup_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            body TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS calendar_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT ''
        );

        CREATE TABLE IF NOT EXISTS residents (
            national_id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date TEXT NOT NULL,
            house_code TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS fee_payments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            house_code TEXT NOT NULL,
            fee_year INTEGER NOT NULL,
            fee_month INTEGER NOT NULL CHECK (fee_month BETWEEN 1 AND 12),
            payment_date TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_news_date ON news(date);
        CREATE INDEX IF NOT EXISTS idx_events_date ON calendar_events(date);
        CREATE INDEX IF NOT EXISTS idx_payments_house ON fee_payments(house_code, payment_date);",
    )?;

    Ok(())
}

fn insert_seed(tx: &Transaction<'_>, seed: &Seed) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for item in &seed.news {
        report.news += tx.execute(
            "INSERT INTO news (date, body)
             SELECT ?1, ?2
             WHERE NOT EXISTS (SELECT 1 FROM news WHERE date = ?1 AND body = ?2)",
            params![item.date, item.body],
        )?;
    }

    for event in &seed.events {
        report.events += tx.execute(
            "INSERT INTO calendar_events (date, title, description)
             SELECT ?1, ?2, ?3
             WHERE NOT EXISTS (
                SELECT 1 FROM calendar_events
                WHERE date = ?1 AND title = ?2 AND description = ?3
             )",
            params![event.date, event.title, event.description],
        )?;
    }

    for resident in &seed.residents {
        report.residents += tx.execute(
            "INSERT OR IGNORE INTO residents (
                national_id, first_name, last_name, birth_date, house_code
            ) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                resident.national_id,
                resident.first_name,
                resident.last_name,
                resident.birth_date,
                resident.house_code,
            ],
        )?;
    }

    for payment in &seed.payments {
        report.payments += tx.execute(
            "INSERT INTO fee_payments (house_code, fee_year, fee_month, payment_date)
             SELECT ?1, ?2, ?3, ?4
             WHERE NOT EXISTS (
                SELECT 1 FROM fee_payments
                WHERE house_code = ?1 AND fee_year = ?2 AND fee_month = ?3 AND payment_date = ?4
             )",
            params![
                payment.house_code,
                payment.fee_year,
                payment.fee_month,
                payment.payment_date,
            ],
        )?;
    }

    Ok(report)
}
