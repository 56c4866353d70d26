//! Contact records as delivered by a directory service.
//!
//! A [`Contact`] mirrors the shape of a People directory entry: any number of
//! names and any number of birthday entries, each possibly incomplete. The
//! sync pipeline only ever looks at the first name and the first birthday of
//! a contact; [`Contact::to_raw_record`] performs that selection.

use serde::{Deserialize, Serialize};

/// A partial calendar date as stored by a directory service.
///
/// Every component is optional: directories commonly store birthdays without
/// a year, and malformed entries may lack the month or day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayDate {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl BirthdayDate {
    /// Creates a date with a known year.
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
            day: Some(day),
        }
    }

    /// Creates a date without a year.
    pub fn md(month: u32, day: u32) -> Self {
        Self {
            year: None,
            month: Some(month),
            day: Some(day),
        }
    }
}

/// A contact from the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display names, in directory order.
    pub names: Vec<String>,
    /// Birthday entries, in directory order.
    pub birthdays: Vec<BirthdayDate>,
}

impl Contact {
    /// Creates a contact with one name and one birthday.
    pub fn new(name: impl Into<String>, birthday: BirthdayDate) -> Self {
        Self {
            names: vec![name.into()],
            birthdays: vec![birthday],
        }
    }

    /// Selects the first name and first birthday of this contact.
    ///
    /// Returns `None` when the contact has no name or no birthday entry at
    /// all. Completeness of the date itself is checked later, during
    /// normalization.
    pub fn to_raw_record(&self) -> Option<RawBirthdayRecord> {
        let display_name = self.names.first()?;
        let date = self.birthdays.first()?;

        Some(RawBirthdayRecord {
            display_name: display_name.clone(),
            year: date.year,
            month: date.month,
            day: date.day,
        })
    }
}

/// The birthday-bearing part of a single contact.
///
/// Transient: produced from a directory response and consumed by the
/// normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBirthdayRecord {
    pub display_name: String,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl RawBirthdayRecord {
    pub fn new(
        display_name: impl Into<String>,
        year: Option<i32>,
        month: Option<u32>,
        day: Option<u32>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            year,
            month,
            day,
        }
    }
}
