// Form validation for the payment lookup
//
// Runs before anything reaches the store. The store itself trusts its
// inputs and only compares them for equality.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NATIONAL_ID_LEN: usize = 13;

const ACCENTED_LETTERS: &str = "ÁáÉéÍíÓóÚúÑñ";

/// Raw resident identity fields, as typed by the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IdentityForm {
    pub national_id: String,
    pub house_code: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: String,
}

/// Identity fields that passed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResidentIdentity {
    pub national_id: String,
    pub house_code: String,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl IdentityForm {
    /// Check every field in form order; the first failure is returned.
    /// Surrounding whitespace is trimmed from every field.
    pub fn validate(&self, today: NaiveDate) -> Result<ResidentIdentity, ValidationError> {
        let national_id = self.national_id.trim();
        let house_code = self.house_code.trim();
        let first_name = self.first_name.trim();
        let last_name = self.last_name.trim();

        if !is_national_id(national_id) {
            return Err(ValidationError::NationalId);
        }
        if !is_house_code(house_code) {
            return Err(ValidationError::HouseCode);
        }
        if !is_name(first_name) {
            return Err(ValidationError::FirstName);
        }
        if !is_name(last_name) {
            return Err(ValidationError::LastName);
        }
        if self.birth_date.trim().is_empty() {
            return Err(ValidationError::BirthDateMissing);
        }

        let birth_date = parse_date(&self.birth_date, "birth date")?;
        if birth_date > today {
            return Err(ValidationError::FutureDate { field: "birth date" });
        }

        Ok(ResidentIdentity {
            national_id: national_id.to_string(),
            house_code: house_code.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            birth_date,
        })
    }
}

/// Raw payment history filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryForm {
    pub house_code: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRange {
    pub house_code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryForm {
    /// An inverted range passes; the store answers it with no rows.
    pub fn validate(&self, today: NaiveDate) -> Result<HistoryRange, ValidationError> {
        if self.house_code.trim().is_empty() {
            return Err(ValidationError::HistoryHouseMissing);
        }
        if self.start.trim().is_empty() || self.end.trim().is_empty() {
            return Err(ValidationError::HistoryRangeMissing);
        }

        let start = parse_date(&self.start, "start date")?;
        let end = parse_date(&self.end, "end date")?;
        if end > today {
            return Err(ValidationError::FutureDate { field: "end date" });
        }

        Ok(HistoryRange {
            house_code: self.house_code.trim().to_string(),
            start,
            end,
        })
    }
}

pub fn is_national_id(value: &str) -> bool {
    value.len() == NATIONAL_ID_LEN && value.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_house_code(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

pub fn is_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphabetic() || ACCENTED_LETTERS.contains(c))
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::MalformedDate { field })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 20).unwrap()
    }

    fn juan() -> IdentityForm {
        IdentityForm {
            national_id: "1234567890123".to_string(),
            house_code: "A101".to_string(),
            first_name: "Juan".to_string(),
            last_name: "Pérez".to_string(),
            birth_date: "1980-01-01".to_string(),
        }
    }

    #[test]
    fn test_valid_identity() {
        let identity = juan().validate(today()).unwrap();
        assert_eq!(identity.birth_date, NaiveDate::from_ymd_opt(1980, 1, 1).unwrap());
        assert_eq!(identity.last_name, "Pérez");
    }

    #[test]
    fn test_national_id_rules() {
        assert!(is_national_id("1234567890123"));
        assert!(!is_national_id("123456789012"));
        assert!(!is_national_id("12345678901234"));
        assert!(!is_national_id("12345678901a3"));
        // 13 bytes, but the last character is an Arabic-Indic digit
        assert_eq!("12345678901٣".len(), NATIONAL_ID_LEN);
        assert!(!is_national_id("12345678901٣"));

        let form = IdentityForm {
            national_id: "12345".to_string(),
            ..juan()
        };
        assert_eq!(form.validate(today()), Err(ValidationError::NationalId));
    }

    #[test]
    fn test_house_code_rules() {
        assert!(is_house_code("A101"));
        assert!(!is_house_code(""));
        assert!(!is_house_code("A-101"));
        assert!(!is_house_code("A 101"));
    }

    #[test]
    fn test_name_rules() {
        assert!(is_name("Pérez"));
        assert!(is_name("Muñoz"));
        assert!(!is_name("Juan Carlos"));
        assert!(!is_name("J4n"));
        assert!(!is_name(""));

        let form = IdentityForm {
            last_name: "O'Brien".to_string(),
            ..juan()
        };
        assert_eq!(form.validate(today()), Err(ValidationError::LastName));
    }

    #[test]
    fn test_birth_date_rules() {
        let missing = IdentityForm {
            birth_date: String::new(),
            ..juan()
        };
        assert_eq!(missing.validate(today()), Err(ValidationError::BirthDateMissing));

        let malformed = IdentityForm {
            birth_date: "01/01/1980".to_string(),
            ..juan()
        };
        assert!(matches!(
            malformed.validate(today()),
            Err(ValidationError::MalformedDate { .. })
        ));

        let future = IdentityForm {
            birth_date: "2025-08-21".to_string(),
            ..juan()
        };
        assert!(matches!(
            future.validate(today()),
            Err(ValidationError::FutureDate { .. })
        ));

        let born_today = IdentityForm {
            birth_date: "2025-08-20".to_string(),
            ..juan()
        };
        assert!(born_today.validate(today()).is_ok());
    }

    #[test]
    fn test_first_failure_wins() {
        let form = IdentityForm {
            national_id: "bad".to_string(),
            house_code: "bad code".to_string(),
            ..IdentityForm::default()
        };
        assert_eq!(form.validate(today()), Err(ValidationError::NationalId));
    }

    #[test]
    fn test_surrounding_whitespace_trimmed_in_both_forms() {
        let form = IdentityForm {
            national_id: " 1234567890123".to_string(),
            house_code: "A101 ".to_string(),
            first_name: "Juan\t".to_string(),
            last_name: " Pérez ".to_string(),
            birth_date: " 1980-01-01 ".to_string(),
        };
        let identity = form.validate(today()).unwrap();
        assert_eq!(identity.national_id, "1234567890123");
        assert_eq!(identity.house_code, "A101");
        assert_eq!(identity.first_name, "Juan");
        assert_eq!(identity.last_name, "Pérez");

        let history = HistoryForm {
            house_code: "A101 ".to_string(),
            start: "2025-01-01".to_string(),
            end: "2025-08-20".to_string(),
        };
        assert_eq!(history.validate(today()).unwrap().house_code, identity.house_code);

        // inner whitespace is still rejected
        let inner = IdentityForm {
            house_code: "A 101".to_string(),
            ..juan()
        };
        assert_eq!(inner.validate(today()), Err(ValidationError::HouseCode));
    }

    #[test]
    fn test_history_form() {
        let form = HistoryForm {
            house_code: "A101".to_string(),
            start: "2025-01-01".to_string(),
            end: "2025-08-20".to_string(),
        };
        let range = form.validate(today()).unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());

        let no_house = HistoryForm {
            house_code: " ".to_string(),
            ..form.clone()
        };
        assert_eq!(no_house.validate(today()), Err(ValidationError::HistoryHouseMissing));

        let no_range = HistoryForm {
            end: String::new(),
            ..form.clone()
        };
        assert_eq!(no_range.validate(today()), Err(ValidationError::HistoryRangeMissing));

        let future_end = HistoryForm {
            end: "2025-09-01".to_string(),
            ..form.clone()
        };
        assert!(future_end.validate(today()).is_err());

        let inverted = HistoryForm {
            start: "2025-08-01".to_string(),
            end: "2025-01-01".to_string(),
            ..form
        };
        assert!(inverted.validate(today()).is_ok());
    }
}
