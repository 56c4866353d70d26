//! Birthday date normalization.
//!
//! Directory services hand out birthdays in several shapes: with a year,
//! without a year, or incomplete. This module turns a [`RawBirthdayRecord`]
//! into a [`NormalizedBirthday`] whose [`CanonicalDate`] renders either as
//! `YYYY-MM-DD` or, when the year is unknown, as `MM-DD`.
//!
//! Records missing a month, a day or a name are rejected. Rejections are not
//! errors for the sync as a whole: [`normalize_all`] drops them and logs the
//! reason at debug level.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::contact::{Contact, RawBirthdayRecord};

/// Leap year used to validate month/day pairs, so that Feb 29 is accepted
/// whether or not the actual birth year is known.
pub const VALIDATION_LEAP_YEAR: i32 = 1972;

/// Why a raw record did not produce a [`NormalizedBirthday`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("contact has no display name")]
    MissingName,
    #[error("birthday has no month")]
    MissingMonth,
    #[error("birthday has no day")]
    MissingDay,
    #[error("month {month} / day {day} is not a calendar date")]
    InvalidDate { month: u32, day: u32 },
}

/// A validated birthday date, with or without a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalDate {
    year: Option<i32>,
    month: u32,
    day: u32,
}

impl CanonicalDate {
    /// Validates and creates a canonical date.
    ///
    /// The month/day pair is checked against [`VALIDATION_LEAP_YEAR`].
    pub fn new(year: Option<i32>, month: u32, day: u32) -> Result<Self, Rejection> {
        if NaiveDate::from_ymd_opt(VALIDATION_LEAP_YEAR, month, day).is_none() {
            return Err(Rejection::InvalidDate { month, day });
        }
        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    /// Returns true if the birth year is known.
    pub fn has_year(&self) -> bool {
        self.year.is_some()
    }

    /// Returns true for February 29.
    pub fn is_leap_day(&self) -> bool {
        self.month == 2 && self.day == 29
    }

    /// Returns this date with the year filled in by `placeholder` when the
    /// birth year is unknown.
    pub fn with_year_or(&self, placeholder: i32) -> (i32, u32, u32) {
        (self.year.unwrap_or(placeholder), self.month, self.day)
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{:04}-{:02}-{:02}", year, self.month, self.day),
            None => write!(f, "{:02}-{:02}", self.month, self.day),
        }
    }
}

/// A contact's birthday in canonical form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedBirthday {
    pub name: String,
    pub date: CanonicalDate,
}

impl NormalizedBirthday {
    pub fn new(name: impl Into<String>, date: CanonicalDate) -> Self {
        Self {
            name: name.into(),
            date,
        }
    }

    /// The canonical date string, `YYYY-MM-DD` or `MM-DD`.
    pub fn canonical_date(&self) -> String {
        self.date.to_string()
    }
}

/// Normalizes a single raw record.
pub fn normalize(record: &RawBirthdayRecord) -> Result<NormalizedBirthday, Rejection> {
    if record.display_name.trim().is_empty() {
        return Err(Rejection::MissingName);
    }
    let month = record.month.ok_or(Rejection::MissingMonth)?;
    let day = record.day.ok_or(Rejection::MissingDay)?;
    let date = CanonicalDate::new(record.year, month, day)?;

    Ok(NormalizedBirthday::new(&record.display_name, date))
}

/// Normalizes every contact and sorts the result by canonical date string.
///
/// Contacts without a name or birthday entry, and birthdays that fail
/// [`normalize`], are dropped. The ordering is lexicographic on the rendered
/// date, so year-less `MM-DD` entries sort among `YYYY-MM-DD` ones by their
/// leading digits rather than by month. Ties keep directory order.
pub fn normalize_all(contacts: &[Contact]) -> Vec<NormalizedBirthday> {
    let mut birthdays: Vec<NormalizedBirthday> = contacts
        .iter()
        .filter_map(|contact| {
            let Some(record) = contact.to_raw_record() else {
                debug!(names = ?contact.names, "skipping contact without name or birthday");
                return None;
            };
            normalize(&record)
                .map_err(|reason| {
                    debug!(name = %record.display_name, %reason, "skipping incomplete birthday");
                })
                .ok()
        })
        .collect();

    birthdays.sort_by_cached_key(NormalizedBirthday::canonical_date);
    birthdays
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::BirthdayDate;

    fn record(year: Option<i32>, month: Option<u32>, day: Option<u32>) -> RawBirthdayRecord {
        RawBirthdayRecord::new("Someone", year, month, day)
    }

    #[test]
    fn year_less_date_is_five_chars() {
        let b = normalize(&record(None, Some(3), Some(7))).unwrap();
        assert_eq!(b.canonical_date(), "03-07");
        assert_eq!(b.canonical_date().len(), 5);
    }

    #[test]
    fn full_date_uses_actual_year() {
        let b = normalize(&record(Some(1990), Some(12), Some(25))).unwrap();
        assert_eq!(b.canonical_date(), "1990-12-25");
    }

    #[test]
    fn leap_day_without_year_is_accepted() {
        let b = normalize(&record(None, Some(2), Some(29))).unwrap();
        assert_eq!(b.canonical_date(), "02-29");
        assert!(b.date.is_leap_day());
    }

    #[test]
    fn leap_day_in_non_leap_year_is_accepted() {
        let b = normalize(&record(Some(1985), Some(2), Some(29))).unwrap();
        assert_eq!(b.canonical_date(), "1985-02-29");
    }

    #[test]
    fn missing_month_is_rejected() {
        assert_eq!(
            normalize(&record(Some(1990), None, Some(1))),
            Err(Rejection::MissingMonth)
        );
    }

    #[test]
    fn missing_day_is_rejected() {
        assert_eq!(
            normalize(&record(None, Some(4), None)),
            Err(Rejection::MissingDay)
        );
    }

    #[test]
    fn impossible_day_is_rejected() {
        assert_eq!(
            normalize(&record(None, Some(4), Some(31))),
            Err(Rejection::InvalidDate { month: 4, day: 31 })
        );
        assert!(normalize(&record(None, Some(13), Some(1))).is_err());
        assert!(normalize(&record(None, Some(1), Some(0))).is_err());
    }

    #[test]
    fn blank_name_is_rejected() {
        let r = RawBirthdayRecord::new("  ", None, Some(1), Some(1));
        assert_eq!(normalize(&r), Err(Rejection::MissingName));
    }

    #[test]
    fn normalize_all_drops_incomplete_and_sorts() {
        let contacts = vec![
            Contact::new("Alice", BirthdayDate::md(3, 7)),
            Contact::new("Bob", BirthdayDate::ymd(1985, 2, 29)),
            Contact::new(
                "Carol",
                BirthdayDate {
                    year: None,
                    month: None,
                    day: Some(1),
                },
            ),
            Contact::new(
                "Dave",
                BirthdayDate {
                    year: Some(2001),
                    month: None,
                    day: None,
                },
            ),
        ];

        let birthdays = normalize_all(&contacts);
        let rendered: Vec<(String, String)> = birthdays
            .iter()
            .map(|b| (b.name.clone(), b.canonical_date()))
            .collect();

        assert_eq!(
            rendered,
            vec![
                ("Alice".to_string(), "03-07".to_string()),
                ("Bob".to_string(), "1985-02-29".to_string()),
            ]
        );
    }

    #[test]
    fn sort_is_lexicographic_on_rendered_date() {
        let contacts = vec![
            Contact::new("Dec", BirthdayDate::md(12, 1)),
            Contact::new("Year", BirthdayDate::ymd(1990, 1, 1)),
            Contact::new("Jan", BirthdayDate::md(1, 15)),
        ];

        let names: Vec<String> = normalize_all(&contacts)
            .into_iter()
            .map(|b| b.name)
            .collect();
        // "01-15" < "12-01" < "1990-01-01"
        assert_eq!(names, vec!["Jan", "Dec", "Year"]);
    }

    #[test]
    fn equal_dates_keep_directory_order() {
        let contacts = vec![
            Contact::new("Zed", BirthdayDate::md(5, 5)),
            Contact::new("Amy", BirthdayDate::md(5, 5)),
        ];
        let names: Vec<String> = normalize_all(&contacts)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }
}
