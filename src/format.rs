// Spanish (es-GT) date presentation

use chrono::{Datelike, NaiveDate};

const MONTH_NAMES: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Weekday headers, Sunday first, matching the calendar grid columns.
pub const WEEKDAY_HEADERS: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

/// Lowercase month name for 1-12.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// "15 de agosto de 2025"
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{} de {} de {}",
        date.day(),
        month_name(date.month()).unwrap_or_default(),
        date.year()
    )
}

/// "15/08/2025"
pub fn short_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names() {
        assert_eq!(month_name(1), Some("enero"));
        assert_eq!(month_name(12), Some("diciembre"));
        assert_eq!(month_name(0), None);
        assert_eq!(month_name(13), None);
    }

    #[test]
    fn test_date_formats() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 5).unwrap();
        assert_eq!(long_date(date), "5 de agosto de 2025");
        assert_eq!(short_date(date), "05/08/2025");
    }
}
