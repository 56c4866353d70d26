//! Per-entry sync outcomes and the aggregated report.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What happened to a single birthday during a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The event was inserted.
    Created,
    /// An event with the same identifier was already on the calendar.
    AlreadyExists,
    /// The event could not be inserted.
    Failed(String),
}

impl SyncOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// The outcome for one birthday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncEntry {
    pub name: String,
    /// Canonical date, `YYYY-MM-DD` or `MM-DD`.
    pub date: String,
    /// Identifier of the event, when one could be built.
    pub event_id: Option<String>,
    pub outcome: SyncOutcome,
}

impl SyncEntry {
    pub fn new(
        name: impl Into<String>,
        date: impl Into<String>,
        event_id: Option<String>,
        outcome: SyncOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            date: date.into(),
            event_id,
            outcome,
        }
    }
}

impl fmt::Display for SyncEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            SyncOutcome::Created => write!(
                f,
                "Created event for {}'s birthday on {}.",
                self.name, self.date
            ),
            SyncOutcome::AlreadyExists => write!(
                f,
                "Event for {}'s birthday on {} already exists. Skipping.",
                self.name, self.date
            ),
            SyncOutcome::Failed(reason) => write!(
                f,
                "Failed to create event for {}'s birthday on {}: {}",
                self.name, self.date, reason
            ),
        }
    }
}

/// Aggregated result of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    entries: Vec<SyncEntry>,
    /// Number of contacts returned by the directory.
    pub contacts_fetched: usize,
    /// True when the directory had more contacts than were fetched.
    pub truncated: bool,
}

impl SyncReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry; entries keep the order they were processed in.
    pub fn push(&mut self, entry: SyncEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[SyncEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::Created))
    }

    pub fn already_existing(&self) -> usize {
        self.count(|o| matches!(o, SyncOutcome::AlreadyExists))
    }

    pub fn failed(&self) -> usize {
        self.count(SyncOutcome::is_failure)
    }

    /// Returns true if any entry failed.
    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// One-line summary, e.g. `"2 created, 1 already existed, 0 failed"`.
    pub fn summary(&self) -> String {
        format!(
            "{} created, {} already existed, {} failed",
            self.created(),
            self.already_existing(),
            self.failed()
        )
    }

    fn count(&self, pred: impl Fn(&SyncOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.outcome)).count()
    }
}
