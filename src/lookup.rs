// Payment lookup - "is my maintenance fee up to date?"
//
// Composes resident verification with the payment check for the month of
// the supplied date, and the history filter for a validated range.

use crate::db::{PaymentRecord, Resident, Store};
use crate::validation::{HistoryRange, ResidentIdentity};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Fee for the current month is paid
    UpToDate,
    /// No payment recorded for the current month
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::UpToDate => "Cuota de mantenimiento al día",
            PaymentStatus::Pending => "Cuota de mantenimiento pendiente",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The identity fields match no registered resident
    NotRegistered,
    Registered {
        resident: Resident,
        status: PaymentStatus,
    },
}

/// Verify `identity` and report the fee status for the month of `today`.
pub fn check_payment_status(
    store: &Store,
    identity: &ResidentIdentity,
    today: NaiveDate,
) -> LookupOutcome {
    let birth_date = identity.birth_date.format("%Y-%m-%d").to_string();

    let Some(resident) = store.verify_resident(
        &identity.national_id,
        &identity.house_code,
        &identity.first_name,
        &identity.last_name,
        &birth_date,
    ) else {
        info!(house_code = %identity.house_code, "lookup: resident not registered");
        return LookupOutcome::NotRegistered;
    };

    let status = if store.payment_exists(&identity.house_code, today.month(), today.year()) {
        PaymentStatus::UpToDate
    } else {
        PaymentStatus::Pending
    };

    info!(house_code = %identity.house_code, ?status, "lookup: payment status");
    LookupOutcome::Registered { resident, status }
}

pub fn lookup_history(store: &Store, range: &HistoryRange) -> Vec<PaymentRecord> {
    store.payment_history(&range.house_code, range.start, range.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::validation::{HistoryForm, IdentityForm};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn identity(id: &str, house: &str, first: &str, last: &str, birth: &str) -> ResidentIdentity {
        IdentityForm {
            national_id: id.to_string(),
            house_code: house.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            birth_date: birth.to_string(),
        }
        .validate(date(2026, 1, 1))
        .unwrap()
    }

    #[test]
    fn test_up_to_date_resident() {
        let today = date(2025, 8, 20);
        let store = Store::bootstrap(&FixedClock::new(today)).unwrap();

        let outcome = check_payment_status(
            &store,
            &identity("1234567890123", "A101", "Juan", "Pérez", "1999-01-01"),
            today,
        );

        match outcome {
            LookupOutcome::Registered { resident, status } => {
                assert_eq!(resident.first_name, "Juan");
                assert_eq!(status, PaymentStatus::UpToDate);
            }
            other => panic!("expected registered resident, got {:?}", other),
        }
    }

    #[test]
    fn test_pending_resident() {
        let today = date(2025, 8, 20);
        let store = Store::bootstrap(&FixedClock::new(today)).unwrap();

        // C303 paid July only
        let outcome = check_payment_status(
            &store,
            &identity("3456789012345", "C303", "Carlos", "García", "1990-11-30"),
            today,
        );
        assert!(matches!(
            outcome,
            LookupOutcome::Registered {
                status: PaymentStatus::Pending,
                ..
            }
        ));

        // A101 next month
        let outcome = check_payment_status(
            &store,
            &identity("1234567890123", "A101", "Juan", "Pérez", "1980-01-01"),
            date(2025, 9, 2),
        );
        assert!(matches!(
            outcome,
            LookupOutcome::Registered {
                status: PaymentStatus::Pending,
                ..
            }
        ));
    }

    #[test]
    fn test_not_registered() {
        let today = date(2025, 8, 20);
        let store = Store::bootstrap(&FixedClock::new(today)).unwrap();

        let outcome = check_payment_status(
            &store,
            &identity("9999999999999", "A101", "Juan", "Pérez", "1980-01-01"),
            today,
        );
        assert_eq!(outcome, LookupOutcome::NotRegistered);
    }

    #[test]
    fn test_lookup_history() {
        let today = date(2025, 8, 20);
        let store = Store::bootstrap(&FixedClock::new(today)).unwrap();

        let range = HistoryForm {
            house_code: "A101".to_string(),
            start: "2025-07-01".to_string(),
            end: "2025-08-20".to_string(),
        }
        .validate(today)
        .unwrap();

        let history = lookup_history(&store, &range);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].fee_month, 8);
    }

    #[test]
    fn test_outcome_json_shape() {
        let today = date(2025, 8, 20);
        let store = Store::bootstrap(&FixedClock::new(today)).unwrap();

        let outcome = check_payment_status(
            &store,
            &identity("1234567890123", "A101", "Juan", "Pérez", "1980-01-01"),
            today,
        );
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "registered");
        assert_eq!(json["status"], "up_to_date");
        assert_eq!(json["resident"]["birth_date"], "1980-01-01");

        let json = serde_json::to_value(LookupOutcome::NotRegistered).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "not_registered" }));
    }
}
