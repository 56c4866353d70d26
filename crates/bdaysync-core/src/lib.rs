//! Core types: contacts, birthday normalization, event building, sync reports
//!
//! Everything in this crate is pure: no network, no filesystem. The pipeline
//! a sync run pushes every contact through is
//!
//! ```text
//! Contact ──to_raw_record()──▶ RawBirthdayRecord ──normalize()──▶ NormalizedBirthday
//!                                                                        │
//!                                            build_event() ◀─────────────┘
//!                                                  │
//!                                                  ▼
//!                                           CalendarEvent (id = generate_event_id())
//! ```

pub mod birthday;
pub mod contact;
pub mod event;
pub mod event_id;
pub mod report;
pub mod tracing;

pub use birthday::{
    CanonicalDate, NormalizedBirthday, Rejection, VALIDATION_LEAP_YEAR, normalize, normalize_all,
};
pub use contact::{BirthdayDate, Contact, RawBirthdayRecord};
pub use event::{
    CalendarEvent, EventBuildError, EventType, PLACEHOLDER_YEAR, RecurrenceRule, Transparency,
    Visibility, build_event,
};
pub use event_id::{EVENT_ID_LENGTH, generate_event_id, is_valid_event_id};
pub use report::{SyncEntry, SyncOutcome, SyncReport};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
