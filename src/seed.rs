// Seed fixtures - canonical rows loaded into the store at startup
//
// The CSV files under fixtures/ are compiled into the binary, so every
// session starts from exactly the same data. The only moving part is the
// optional "current month" payment row, which is derived from a caller
// supplied date instead of the system clock.

use crate::db::{CalendarEvent, FeePayment, NewsItem, Resident};
use crate::error::Result;
use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;

const NEWS_CSV: &str = include_str!("../fixtures/news.csv");
const EVENTS_CSV: &str = include_str!("../fixtures/events.csv");
const RESIDENTS_CSV: &str = include_str!("../fixtures/residents.csv");
const PAYMENTS_CSV: &str = include_str!("../fixtures/payments.csv");

/// House that receives the current-month demo payment.
pub const DEMO_HOUSE: &str = "A101";

/// Rows to insert during `Store::initialize`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Seed {
    pub news: Vec<NewsItem>,
    pub events: Vec<CalendarEvent>,
    pub residents: Vec<Resident>,
    pub payments: Vec<FeePayment>,
}

impl Seed {
    /// Fixture rows plus a paid fee for `DEMO_HOUSE` in the month of `today`.
    pub fn fixtures(today: NaiveDate) -> Result<Self> {
        let seed = Seed {
            news: parse_fixture(NEWS_CSV)?,
            events: parse_fixture(EVENTS_CSV)?,
            residents: parse_fixture(RESIDENTS_CSV)?,
            payments: parse_fixture(PAYMENTS_CSV)?,
        };

        Ok(seed.with_current_month_payment(DEMO_HOUSE, today))
    }

    /// Append a payment for `house_code` covering the month of `today`,
    /// paid on the first day of that month.
    pub fn with_current_month_payment(mut self, house_code: &str, today: NaiveDate) -> Self {
        let payment_date = today.with_day(1).unwrap_or(today);

        self.payments.push(FeePayment {
            house_code: house_code.to_string(),
            fee_year: today.year(),
            fee_month: today.month(),
            payment_date,
        });

        self
    }

    pub fn total_rows(&self) -> usize {
        self.news.len() + self.events.len() + self.residents.len() + self.payments.len()
    }
}

fn parse_fixture<T: DeserializeOwned>(data: &str) -> Result<Vec<T>> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        rows.push(result?);
    }

    Ok(rows)
}
