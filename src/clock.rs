// Explicit time source for seeding and the current-month payment check.
//
// Nothing in the core reads the system date directly; callers hand in a
// Clock so tests and demos stay deterministic.

use chrono::{Local, NaiveDate};

pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always answers the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl FixedClock {
    pub fn new(date: NaiveDate) -> Self {
        FixedClock(date)
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Clock selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalClock {
    System,
    Fixed(NaiveDate),
}

impl Clock for PortalClock {
    fn today(&self) -> NaiveDate {
        match self {
            PortalClock::System => SystemClock.today(),
            PortalClock::Fixed(date) => *date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 20).unwrap();
        assert_eq!(FixedClock::new(date).today(), date);
        assert_eq!(PortalClock::Fixed(date).today(), date);
    }
}
