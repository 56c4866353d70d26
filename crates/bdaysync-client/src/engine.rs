//! The birthday sync engine.
//!
//! One run: obtain a token, fetch contacts, normalize and sort their
//! birthdays, then insert one event per birthday, strictly in order. Only a
//! credential or directory failure aborts the run; per-entry failures are
//! folded into the [`SyncReport`].

use std::sync::Arc;

use bdaysync_core::{
    Contact, NormalizedBirthday, SyncEntry, SyncOutcome, SyncReport, build_event, normalize_all,
};
use bdaysync_providers::{
    AccessToken, CalendarClient, CreateOutcome, CredentialProvider, DirectoryClient, ProviderError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Contacts requested per directory page.
pub const DEFAULT_PAGE_SIZE: usize = 200;

/// Largest page the People API accepts.
pub const MAX_PAGE_SIZE: usize = 1000;

pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Fatal sync errors. Nothing is written to the calendar after either.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("could not obtain credentials: {0}")]
    Credentials(#[source] ProviderError),

    #[error("could not list contacts: {0}")]
    Directory(#[source] ProviderError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    pub calendar_id: String,
    pub page_size: usize,
    /// Fetch every directory page instead of only the first.
    pub follow_pages: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            follow_pages: false,
        }
    }
}

/// Normalized birthdays from one directory listing.
#[derive(Debug, Clone, Default)]
pub struct BirthdayListing {
    /// Sorted by canonical date string.
    pub birthdays: Vec<NormalizedBirthday>,
    pub contacts_fetched: usize,
    /// True when the directory has contacts that were not fetched.
    pub truncated: bool,
}

pub struct SyncEngine {
    credentials: Arc<dyn CredentialProvider>,
    directory: Arc<dyn DirectoryClient>,
    calendar: Arc<dyn CalendarClient>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        directory: Arc<dyn DirectoryClient>,
        calendar: Arc<dyn CalendarClient>,
        options: SyncOptions,
    ) -> Self {
        Self {
            credentials,
            directory,
            calendar,
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Runs a full sync.
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        self.sync_with_progress(|_| {}).await
    }

    /// Runs a full sync, calling `on_entry` as soon as each entry is decided.
    pub async fn sync_with_progress<F>(&self, mut on_entry: F) -> Result<SyncReport, SyncError>
    where
        F: FnMut(&SyncEntry) + Send,
    {
        let token = self.token().await?;
        let listing = self.fetch_birthdays(&token).await?;

        info!(
            contacts = listing.contacts_fetched,
            birthdays = listing.birthdays.len(),
            calendar = %self.options.calendar_id,
            "syncing birthdays"
        );

        let mut report = SyncReport::new();
        report.contacts_fetched = listing.contacts_fetched;
        report.truncated = listing.truncated;

        for birthday in &listing.birthdays {
            let entry = self.sync_one(&token, birthday).await;
            on_entry(&entry);
            report.push(entry);
        }

        info!(summary = %report.summary(), "sync finished");
        Ok(report)
    }

    /// Fetches and normalizes birthdays without touching the calendar.
    pub async fn list_birthdays(&self) -> Result<BirthdayListing, SyncError> {
        let token = self.token().await?;
        self.fetch_birthdays(&token).await
    }

    async fn token(&self) -> Result<AccessToken, SyncError> {
        self.credentials
            .credentials()
            .await
            .map_err(SyncError::Credentials)
    }

    async fn fetch_birthdays(&self, token: &AccessToken) -> Result<BirthdayListing, SyncError> {
        let (contacts, truncated) = self.fetch_contacts(token).await?;
        let birthdays = normalize_all(&contacts);
        debug!(
            contacts = contacts.len(),
            birthdays = birthdays.len(),
            "normalized birthdays"
        );

        Ok(BirthdayListing {
            birthdays,
            contacts_fetched: contacts.len(),
            truncated,
        })
    }

    /// Returns the fetched contacts and whether more were left behind.
    async fn fetch_contacts(&self, token: &AccessToken) -> Result<(Vec<Contact>, bool), SyncError> {
        let mut contacts = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .directory
                .list_contacts(token, self.options.page_size, page_token.as_deref())
                .await
                .map_err(SyncError::Directory)?;

            let total = page.total_items;
            contacts.extend(page.contacts);

            match page.next_page_token {
                Some(next) if self.options.follow_pages => page_token = Some(next),
                Some(_) => {
                    warn!(
                        fetched = contacts.len(),
                        total = ?total,
                        "directory has more contacts than one page; only the first page is synced"
                    );
                    return Ok((contacts, true));
                }
                None => return Ok((contacts, false)),
            }
        }
    }

    async fn sync_one(&self, token: &AccessToken, birthday: &NormalizedBirthday) -> SyncEntry {
        let date = birthday.canonical_date();

        let event = match build_event(birthday) {
            Ok(event) => event,
            Err(e) => {
                warn!(name = %birthday.name, %date, error = %e, "cannot build event");
                return SyncEntry::new(&birthday.name, date, None, SyncOutcome::Failed(e.to_string()));
            }
        };

        let outcome = match self
            .calendar
            .create_event(token, &self.options.calendar_id, &event)
            .await
        {
            Ok(CreateOutcome::Created { id }) => {
                info!(name = %birthday.name, %date, %id, "created event");
                SyncOutcome::Created
            }
            Ok(CreateOutcome::AlreadyExists) => {
                info!(name = %birthday.name, %date, id = %event.id, "event exists, skipping");
                SyncOutcome::AlreadyExists
            }
            Err(e) => {
                warn!(name = %birthday.name, %date, error = %e, "failed to create event");
                SyncOutcome::Failed(e.to_string())
            }
        };

        SyncEntry::new(&birthday.name, date, Some(event.id), outcome)
    }
}
