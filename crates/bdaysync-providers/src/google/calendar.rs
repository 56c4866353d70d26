//! Google Calendar API client: inserts birthday events with explicit ids.

use bdaysync_core::CalendarEvent;
use chrono::{Days, NaiveDate};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{AccessToken, BoxFuture, CalendarClient, CreateOutcome};

/// Base URL for Google Calendar API v3.
pub const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

const PROVIDER_NAME: &str = "google-calendar";

/// Wire form of an event insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResource {
    pub id: String,
    pub summary: String,
    pub start: EventDate,
    /// Exclusive: the day after the last day of the event.
    pub end: EventDate,
    pub recurrence: Vec<String>,
    pub visibility: String,
    pub transparency: String,
    pub event_type: String,
    pub birthday_properties: BirthdayProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDate {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirthdayProperties {
    #[serde(rename = "type")]
    pub kind: String,
}

impl EventResource {
    pub fn from_event(event: &CalendarEvent) -> ProviderResult<Self> {
        let end = event
            .end_date
            .checked_add_days(Days::new(1))
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderErrorCode::BadRequest,
                    format!("event end date out of range: {}", event.end_date),
                )
            })?;

        Ok(Self {
            id: event.id.clone(),
            summary: event.title.clone(),
            start: EventDate {
                date: event.start_date,
            },
            end: EventDate { date: end },
            recurrence: vec![event.recurrence.as_rrule().to_string()],
            visibility: event.visibility.as_str().to_string(),
            transparency: event.transparency.as_str().to_string(),
            event_type: event.event_type.as_str().to_string(),
            birthday_properties: BirthdayProperties {
                kind: event.event_type.as_str().to_string(),
            },
        })
    }
}

/// The part of the insert response we use.
#[derive(Debug, Deserialize)]
struct InsertedEvent {
    id: String,
}

/// Inserts events through `calendars/{calendarId}/events`.
#[derive(Debug, Clone)]
pub struct GoogleCalendarClient {
    http: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    /// Points the client at another server (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn insert(
        &self,
        token: &AccessToken,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> ProviderResult<CreateOutcome> {
        let body = EventResource::from_event(event)?;
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token.secret())
            .json(&body)
            .send()
            .await
            .map_err(super::request_error)?;

        let status = response.status();
        if status == StatusCode::CONFLICT {
            debug!(id = %event.id, "event id already taken");
            return Ok(CreateOutcome::AlreadyExists);
        }
        if !status.is_success() {
            return Err(super::status_error(response).await);
        }

        let inserted: InsertedEvent = super::read_json(response).await?;
        Ok(CreateOutcome::Created { id: inserted.id })
    }
}

impl CalendarClient for GoogleCalendarClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn create_event<'a>(
        &'a self,
        token: &'a AccessToken,
        calendar_id: &'a str,
        event: &'a CalendarEvent,
    ) -> BoxFuture<'a, ProviderResult<CreateOutcome>> {
        Box::pin(async move {
            self.insert(token, calendar_id, event)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}
