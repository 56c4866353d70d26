//! In-process implementations of the provider traits.
//!
//! These back the engine's tests and can stand in for real services when
//! exercising a sync without network access. The in-memory calendar honours
//! the same identifier semantics as a real one: a second insert with the same
//! identifier yields [`CreateOutcome::AlreadyExists`].

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bdaysync_core::{CalendarEvent, Contact};
use tracing::debug;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{
    AccessToken, BoxFuture, CalendarClient, ContactPage, CreateOutcome, CredentialProvider,
    DirectoryClient,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Credentials that always succeed with a fixed token.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    token: AccessToken,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

impl CredentialProvider for StaticCredentials {
    fn name(&self) -> &str {
        "static"
    }

    fn credentials(&self) -> BoxFuture<'_, ProviderResult<AccessToken>> {
        let token = self.token.clone();
        Box::pin(async move { Ok(token) })
    }
}

/// Credentials that always fail.
#[derive(Debug, Clone)]
pub struct FailingCredentials {
    code: ProviderErrorCode,
    message: String,
}

impl FailingCredentials {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl CredentialProvider for FailingCredentials {
    fn name(&self) -> &str {
        "failing"
    }

    fn credentials(&self) -> BoxFuture<'_, ProviderResult<AccessToken>> {
        let error = ProviderError::new(self.code, self.message.clone()).with_provider("failing");
        Box::pin(async move { Err(error) })
    }
}

/// A directory serving a fixed contact list, paginated by offset.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    contacts: Vec<Contact>,
    requests: Mutex<usize>,
}

impl StaticDirectory {
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            requests: Mutex::new(0),
        }
    }

    /// Number of page requests served so far.
    pub fn requests(&self) -> usize {
        *lock(&self.requests)
    }
}

impl DirectoryClient for StaticDirectory {
    fn name(&self) -> &str {
        "static"
    }

    fn list_contacts<'a>(
        &'a self,
        _token: &'a AccessToken,
        page_size: usize,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<ContactPage>> {
        Box::pin(async move {
            *lock(&self.requests) += 1;

            if page_size == 0 {
                return Err(ProviderError::new(
                    ProviderErrorCode::BadRequest,
                    "page size must be positive",
                ));
            }

            let offset = match page_token {
                Some(t) => t.parse::<usize>().map_err(|_| {
                    ProviderError::new(
                        ProviderErrorCode::BadRequest,
                        format!("invalid page token: {}", t),
                    )
                })?,
                None => 0,
            };

            let start = offset.min(self.contacts.len());
            let end = (start + page_size).min(self.contacts.len());
            let mut page = ContactPage::new(self.contacts[start..end].to_vec())
                .with_total_items(self.contacts.len());
            if end < self.contacts.len() {
                page = page.with_next_page_token(end.to_string());
            }
            Ok(page)
        })
    }
}

/// An in-memory calendar keyed by (calendar id, event id).
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    events: Mutex<BTreeMap<(String, String), CalendarEvent>>,
    failures: Mutex<HashMap<String, (ProviderErrorCode, String)>>,
    attempts: Mutex<Vec<String>>,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every insert of `event_id` fail with the given error.
    pub fn fail_event(
        &self,
        event_id: impl Into<String>,
        code: ProviderErrorCode,
        message: impl Into<String>,
    ) {
        lock(&self.failures).insert(event_id.into(), (code, message.into()));
    }

    /// Makes inserts of `event_id` succeed again.
    pub fn clear_failure(&self, event_id: &str) {
        lock(&self.failures).remove(event_id);
    }

    /// Events stored in `calendar_id`, ordered by identifier.
    pub fn events(&self, calendar_id: &str) -> Vec<CalendarEvent> {
        lock(&self.events)
            .iter()
            .filter(|((cal, _), _)| cal == calendar_id)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Identifiers of every insert attempted, in call order.
    pub fn attempts(&self) -> Vec<String> {
        lock(&self.attempts).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }
}

impl CalendarClient for InMemoryCalendar {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_event<'a>(
        &'a self,
        _token: &'a AccessToken,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreateOutcome>> {
        Box::pin(async move {
            lock(&self.attempts).push(event.id.clone());

            if let Some((code, message)) = lock(&self.failures).get(&event.id) {
                return Err(ProviderError::new(*code, message.clone()).with_provider("memory"));
            }

            let key = (calendar_id.to_string(), event.id.clone());
            let mut events = lock(&self.events);
            if events.contains_key(&key) {
                debug!(id = %event.id, "event already present");
                return Ok(CreateOutcome::AlreadyExists);
            }
            events.insert(key, event.clone());
            Ok(CreateOutcome::Created {
                id: event.id.clone(),
            })
        })
    }
}
