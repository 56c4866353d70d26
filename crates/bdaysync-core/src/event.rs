//! Recurring birthday events.
//!
//! [`build_event`] turns a [`NormalizedBirthday`] into the [`CalendarEvent`]
//! that gets inserted into the remote calendar:
//!
//! - a single all-day occurrence (start date == end date) repeating yearly
//! - private visibility, transparent (never blocks availability)
//! - a deterministic identifier from [`generate_event_id`]
//!
//! Year-less birthdays are anchored in [`PLACEHOLDER_YEAR`]. The placeholder
//! exists only because calendars require a full start date; it is never
//! presented as a birth year.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::birthday::NormalizedBirthday;
use crate::event_id::generate_event_id;

/// Year used to anchor birthdays whose year is unknown.
pub const PLACEHOLDER_YEAR: i32 = 1970;

/// Errors raised while building an event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventBuildError {
    #[error("birthday {0} cannot be placed on a calendar")]
    DateOutOfRange(String),
}

/// How a birthday event repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceRule {
    /// Every year on the start date's month and day.
    Yearly,
    /// Every year on the last day of February (Feb 29 in leap years,
    /// Feb 28 otherwise).
    YearlyLastDayOfFebruary,
}

impl RecurrenceRule {
    /// Returns the iCalendar RRULE line for this rule.
    pub fn as_rrule(&self) -> &'static str {
        match self {
            Self::Yearly => "RRULE:FREQ=YEARLY",
            Self::YearlyLastDayOfFebruary => "RRULE:FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1",
        }
    }

    /// Returns the date this rule fires on in `year`, for an event anchored
    /// at `start`.
    pub fn occurrence_in(&self, start: NaiveDate, year: i32) -> Option<NaiveDate> {
        match self {
            Self::Yearly => NaiveDate::from_ymd_opt(year, start.month(), start.day()),
            Self::YearlyLastDayOfFebruary => last_day_of_february(year),
        }
    }
}

/// Event visibility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
        }
    }
}

/// Whether the event blocks time on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    #[default]
    Transparent,
}

impl Transparency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
        }
    }
}

/// Calendar event kind annotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    #[default]
    Birthday,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
        }
    }
}

/// A recurring all-day birthday event, ready to be sent to a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Deterministic identifier (idempotency key).
    pub id: String,
    /// Event title, e.g. `"Alice's Birthday"`.
    pub title: String,
    /// First occurrence.
    pub start_date: NaiveDate,
    /// Last day of the first occurrence (inclusive); equal to `start_date`.
    pub end_date: NaiveDate,
    pub recurrence: RecurrenceRule,
    pub visibility: Visibility,
    pub transparency: Transparency,
    pub event_type: EventType,
    /// The `YYYY-MM-DD` string the identifier was derived from.
    pub date_key: String,
}

/// Builds the calendar event for a birthday.
pub fn build_event(birthday: &NormalizedBirthday) -> Result<CalendarEvent, EventBuildError> {
    let (year, month, day) = birthday.date.with_year_or(PLACEHOLDER_YEAR);
    let date_key = format!("{:04}-{:02}-{:02}", year, month, day);

    let recurrence = if birthday.date.is_leap_day() {
        RecurrenceRule::YearlyLastDayOfFebruary
    } else {
        RecurrenceRule::Yearly
    };

    // Feb 29 of a non-leap year starts on that year's last day of February.
    let start_date = NaiveDate::from_ymd_opt(year, month, day)
        .or_else(|| {
            birthday
                .date
                .is_leap_day()
                .then(|| last_day_of_february(year))
                .flatten()
        })
        .ok_or_else(|| EventBuildError::DateOutOfRange(date_key.clone()))?;

    Ok(CalendarEvent {
        id: generate_event_id(&birthday.name, &date_key),
        title: format!("{}'s Birthday", birthday.name),
        start_date,
        end_date: start_date,
        recurrence,
        visibility: Visibility::Private,
        transparency: Transparency::Transparent,
        event_type: EventType::Birthday,
        date_key,
    })
}

fn last_day_of_february(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 3, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::birthday::CanonicalDate;

    fn birthday(name: &str, year: Option<i32>, month: u32, day: u32) -> NormalizedBirthday {
        NormalizedBirthday::new(name, CanonicalDate::new(year, month, day).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn year_less_birthday_uses_placeholder_year() {
        let event = build_event(&birthday("Alice", None, 3, 7)).unwrap();

        assert_eq!(event.date_key, "1970-03-07");
        assert_eq!(event.start_date, date(1970, 3, 7));
        assert_eq!(event.end_date, event.start_date);
        assert_eq!(event.recurrence, RecurrenceRule::Yearly);
        assert_eq!(event.id, generate_event_id("Alice", "1970-03-07"));
    }

    #[test]
    fn known_year_is_kept() {
        let event = build_event(&birthday("Eve", Some(1990), 12, 25)).unwrap();
        assert_eq!(event.date_key, "1990-12-25");
        assert_eq!(event.start_date, date(1990, 12, 25));
        assert_eq!(event.recurrence.as_rrule(), "RRULE:FREQ=YEARLY");
    }

    #[test]
    fn title_is_possessive() {
        let event = build_event(&birthday("Alice", None, 3, 7)).unwrap();
        assert_eq!(event.title, "Alice's Birthday");
    }

    #[test]
    fn event_is_private_transparent_birthday() {
        let event = build_event(&birthday("Alice", None, 3, 7)).unwrap();
        assert_eq!(event.visibility.as_str(), "private");
        assert_eq!(event.transparency.as_str(), "transparent");
        assert_eq!(event.event_type.as_str(), "birthday");
    }

    #[test]
    fn leap_day_uses_last_day_of_february_rule() {
        let event = build_event(&birthday("Bob", Some(1985), 2, 29)).unwrap();

        assert_eq!(
            event.recurrence.as_rrule(),
            "RRULE:FREQ=YEARLY;BYMONTH=2;BYMONTHDAY=-1"
        );
        assert_eq!(event.date_key, "1985-02-29");
        assert_eq!(event.id, generate_event_id("Bob", "1985-02-29"));
        // 1985 is not a leap year
        assert_eq!(event.start_date, date(1985, 2, 28));
    }

    #[test]
    fn leap_day_in_leap_year_starts_on_the_29th() {
        let event = build_event(&birthday("Leo", Some(1988), 2, 29)).unwrap();
        assert_eq!(event.start_date, date(1988, 2, 29));
        assert_eq!(event.recurrence, RecurrenceRule::YearlyLastDayOfFebruary);
    }

    #[test]
    fn year_less_leap_day_is_anchored_in_placeholder_year() {
        let event = build_event(&birthday("Lea", None, 2, 29)).unwrap();
        assert_eq!(event.date_key, "1970-02-29");
        assert_eq!(event.start_date, date(1970, 2, 28));
    }

    #[test]
    fn leap_day_rule_fires_every_year() {
        let event = build_event(&birthday("Bob", Some(1985), 2, 29)).unwrap();
        for year in 2020..2030 {
            let occurrence = event.recurrence.occurrence_in(event.start_date, year);
            let expected = if year % 4 == 0 {
                date(year, 2, 29)
            } else {
                date(year, 2, 28)
            };
            assert_eq!(occurrence, Some(expected), "year {}", year);
        }
    }

    #[test]
    fn yearly_rule_fires_on_same_month_day() {
        let event = build_event(&birthday("Alice", None, 3, 7)).unwrap();
        assert_eq!(
            event.recurrence.occurrence_in(event.start_date, 2031),
            Some(date(2031, 3, 7))
        );
    }

    #[test]
    fn out_of_range_year_is_an_error() {
        let result = build_event(&birthday("Ancient", Some(i32::MAX), 1, 1));
        assert!(matches!(result, Err(EventBuildError::DateOutOfRange(_))));
    }
}
