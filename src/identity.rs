//! User-identity lookups against the hosting application's API.
//!
//! The extraction engine only ever asks one question: "what is the display
//! name for this user id?". The [`IdentityLookup`] trait keeps that seam
//! narrow so tests can stub the network; [`HttpIdentityService`] is the real
//! client. Every request carries a bounded timeout so a stalled identity
//! service can never stall extraction.

use serde::Deserialize;
use std::time::Duration;

/// Errors raised by identity lookups.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Transport-level failure (connect, timeout, body decode).
    #[error("Identity request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Identity service returned status {0}")]
    Status(u16),
}

/// Resolves external user identifiers to display names.
pub trait IdentityLookup {
    /// Look up the display name for `user_id`.
    ///
    /// `Ok(None)` means the service answered but knows no such user; callers
    /// treat both that and `Err` as triggers for their local fallback.
    fn display_name(&self, user_id: &str) -> Result<Option<String>, IdentityError>;
}

/// Identity lookup that never finds anyone.
///
/// Used when no service base URL is configured; the resolver then always
/// takes its local-name fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIdentityService;

impl IdentityLookup for NoIdentityService {
    fn display_name(&self, _user_id: &str) -> Result<Option<String>, IdentityError> {
        Ok(None)
    }
}

#[derive(Deserialize)]
struct UserQueryResponse {
    #[serde(default)]
    data: Vec<UserRecord>,
}

#[derive(Deserialize)]
struct UserRecord {
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
}

/// HTTP client for the hosting application's user API.
///
/// Contract: `GET {base_url}/v1/users?user_id={id}` with
/// `Accept: application/json`; success is HTTP 200 with a JSON body carrying
/// a `data` list of `first_name`/`last_name` records.
pub struct HttpIdentityService {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpIdentityService {
    /// Build a client for `base_url` with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IdentityError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

impl IdentityLookup for HttpIdentityService {
    fn display_name(&self, user_id: &str) -> Result<Option<String>, IdentityError> {
        let url = format!("{}/v1/users", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .header(reqwest::header::ACCEPT, "application/json")
            .send()?;

        if !response.status().is_success() {
            return Err(IdentityError::Status(response.status().as_u16()));
        }

        let body: UserQueryResponse = response.json()?;
        Ok(body
            .data
            .first()
            .map(|user| format!("{} {}", user.first_name, user.last_name)))
    }
}
