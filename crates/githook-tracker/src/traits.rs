use async_trait::async_trait;
use githook_core::{Comment, IssueReference, TrackerUser};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("tracker returned {status}: {message}")]
    Api { status: u16, message: String },
}

/// Outcome of fetching a single entity. A missing entity is an answer, not a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Fold a `NotFound` error into the `Lookup::NotFound` outcome.
    pub fn from_result(result: Result<T, TrackerError>) -> Result<Self, TrackerError> {
        match result {
            Ok(value) => Ok(Lookup::Found(value)),
            Err(TrackerError::NotFound(_)) => Ok(Lookup::NotFound),
            Err(e) => Err(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "idReadable")]
    pub id: String,
}

/// Operations the bridge needs from an issue tracker.
///
/// `YouTrackClient` talks to a tracker over REST.
/// `mock::MockTracker` records calls in memory for tests.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Free-text user search. Results may match on any field, not just email.
    async fn find_users(&self, query: &str) -> Result<Vec<TrackerUser>, TrackerError>;

    /// Full profile for a login, including email.
    async fn get_user(&self, login: &str) -> Result<Lookup<TrackerUser>, TrackerError>;

    async fn get_issue(&self, id: &IssueReference) -> Result<Lookup<Issue>, TrackerError>;

    /// Add `comment.text` to `comment.issue`, attributed to `comment.run_as`.
    async fn post_comment(&self, comment: &Comment) -> Result<(), TrackerError>;
}
