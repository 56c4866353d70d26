//! Traits for the external collaborators of a sync run.
//!
//! - [`CredentialProvider`] yields a valid [`AccessToken`] on demand
//! - [`DirectoryClient`] lists contacts, one [`ContactPage`] at a time
//! - [`CalendarClient`] inserts events with caller-chosen identifiers
//!
//! The traits return boxed futures so they stay object-safe and can be held
//! as `Arc<dyn ...>` by the sync engine.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bdaysync_core::{CalendarEvent, Contact};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A bearer token authorizing directory and calendar requests.
///
/// The token value is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token for use in an `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// One page of contacts from a directory.
#[derive(Debug, Clone, Default)]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    /// Token for the next page; `None` on the last page.
    pub next_page_token: Option<String>,
    /// Total number of contacts the directory holds, when reported.
    pub total_items: Option<usize>,
}

impl ContactPage {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            next_page_token: None,
            total_items: None,
        }
    }

    pub fn with_next_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }

    pub fn with_total_items(mut self, total: usize) -> Self {
        self.total_items = Some(total);
        self
    }

    /// Returns true if the directory has contacts beyond this page.
    pub fn has_more(&self) -> bool {
        self.next_page_token.is_some()
    }
}

/// Result of inserting an event with an explicit identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The event was inserted; `id` is the identifier the calendar reports.
    Created { id: String },
    /// An event with this identifier already exists.
    AlreadyExists,
}

/// Supplies authorization for directory and calendar requests.
pub trait CredentialProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Returns a currently valid access token.
    ///
    /// Implementations may refresh or interactively acquire the token.
    ///
    /// # Errors
    ///
    /// Returns an authentication error if no valid token can be obtained.
    fn credentials(&self) -> BoxFuture<'_, ProviderResult<AccessToken>>;
}

/// Lists the user's contacts.
pub trait DirectoryClient: Send + Sync {
    fn name(&self) -> &str;

    /// Fetches one page of at most `page_size` contacts.
    ///
    /// `page_token` is the `next_page_token` of the previous page, or `None`
    /// for the first page.
    fn list_contacts<'a>(
        &'a self,
        token: &'a AccessToken,
        page_size: usize,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<ContactPage>>;
}

/// Inserts events into a calendar.
pub trait CalendarClient: Send + Sync {
    fn name(&self) -> &str;

    /// Inserts `event` using its own identifier.
    ///
    /// An identifier collision is reported as [`CreateOutcome::AlreadyExists`],
    /// never as an error.
    fn create_event<'a>(
        &'a self,
        token: &'a AccessToken,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreateOutcome>>;
}
