//! External collaborators of a birthday sync, behind traits.
//!
//! - [`CredentialProvider`] yields an [`AccessToken`]
//! - [`DirectoryClient`] lists contacts page by page
//! - [`CalendarClient`] inserts events under caller-chosen identifiers and
//!   reports a taken identifier as [`CreateOutcome::AlreadyExists`]
//!
//! The [`memory`] module implements all three in-process. The [`google`]
//! module (feature `google`, on by default) talks to the People and
//! Calendar APIs.

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod memory;
pub mod provider;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use memory::{FailingCredentials, InMemoryCalendar, StaticCredentials, StaticDirectory};
pub use provider::{
    AccessToken, BoxFuture, CalendarClient, ContactPage, CreateOutcome, CredentialProvider,
    DirectoryClient,
};
