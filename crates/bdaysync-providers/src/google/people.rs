//! Google People API client: the user's connections with names and birthdays.

use bdaysync_core::{BirthdayDate, Contact};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderResult;
use crate::provider::{AccessToken, BoxFuture, ContactPage, DirectoryClient};

/// Base URL for People API v1.
pub const PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";

const PERSON_FIELDS: &str = "names,birthdays";
const PROVIDER_NAME: &str = "google-people";

/// Lists `people/me/connections`.
#[derive(Debug, Clone)]
pub struct PeopleClient {
    http: reqwest::Client,
    base_url: String,
}

impl PeopleClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: PEOPLE_API_BASE.to_string(),
        }
    }

    /// Points the client at another server (a proxy or a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_page(
        &self,
        token: &AccessToken,
        page_size: usize,
        page_token: Option<&str>,
    ) -> ProviderResult<ContactPage> {
        let url = format!("{}/people/me/connections", self.base_url);

        let mut request = self
            .http
            .get(&url)
            .bearer_auth(token.secret())
            .query(&[
                ("personFields", PERSON_FIELDS.to_string()),
                ("pageSize", page_size.to_string()),
            ]);
        if let Some(page_token) = page_token {
            request = request.query(&[("pageToken", page_token)]);
        }

        let response = request.send().await.map_err(super::request_error)?;
        if !response.status().is_success() {
            return Err(super::status_error(response).await);
        }

        let body: ConnectionsResponse = super::read_json(response).await?;
        let page = body.into_page();
        debug!(
            contacts = page.contacts.len(),
            more = page.has_more(),
            "fetched connections page"
        );
        Ok(page)
    }
}

impl DirectoryClient for PeopleClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn list_contacts<'a>(
        &'a self,
        token: &'a AccessToken,
        page_size: usize,
        page_token: Option<&'a str>,
    ) -> BoxFuture<'a, ProviderResult<ContactPage>> {
        Box::pin(async move {
            self.fetch_page(token, page_size, page_token)
                .await
                .map_err(|e| e.with_provider(PROVIDER_NAME))
        })
    }
}

/// Response of `people.connections.list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionsResponse {
    #[serde(default)]
    connections: Vec<ApiPerson>,
    next_page_token: Option<String>,
    total_people: Option<usize>,
    total_items: Option<usize>,
}

impl ConnectionsResponse {
    fn into_page(self) -> ContactPage {
        let total = self.total_people.or(self.total_items);
        let mut page = ContactPage::new(self.connections.into_iter().map(Contact::from).collect());
        if let Some(token) = self.next_page_token.filter(|t| !t.is_empty()) {
            page = page.with_next_page_token(token);
        }
        if let Some(total) = total {
            page = page.with_total_items(total);
        }
        page
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPerson {
    #[serde(default)]
    names: Vec<ApiName>,
    #[serde(default)]
    birthdays: Vec<ApiBirthday>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiName {
    display_name: Option<String>,
}

/// A birthday entry; `text` only entries carry no structured date.
#[derive(Debug, Deserialize)]
struct ApiBirthday {
    date: Option<ApiDate>,
}

/// `google.type.Date`; zero stands for "not set".
#[derive(Debug, Default, Deserialize)]
struct ApiDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

impl From<ApiDate> for BirthdayDate {
    fn from(date: ApiDate) -> Self {
        Self {
            year: date.year.filter(|&y| y != 0),
            month: date.month.filter(|&m| m != 0),
            day: date.day.filter(|&d| d != 0),
        }
    }
}

impl From<ApiPerson> for Contact {
    fn from(person: ApiPerson) -> Self {
        // Entry order is kept: the first name and first birthday are the
        // ones used downstream, even when they are incomplete.
        Self {
            names: person
                .names
                .into_iter()
                .map(|n| n.display_name.unwrap_or_default())
                .collect(),
            birthdays: person
                .birthdays
                .into_iter()
                .map(|b| b.date.unwrap_or_default().into())
                .collect(),
        }
    }
}
