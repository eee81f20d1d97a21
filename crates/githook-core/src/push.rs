use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// A push notification as delivered by the source-control host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushEvent {
    pub repository: Repository,
    #[serde(default)]
    pub ref_changes: Vec<RefChange>,
    #[serde(default)]
    pub changesets: Changesets,
}

impl PushEvent {
    /// Name of the branch the push updated, taken from the first ref change.
    pub fn branch(&self) -> Result<&str, CoreError> {
        let change = self
            .ref_changes
            .first()
            .ok_or_else(|| CoreError::InvalidPayload("push has no ref changes".into()))?;
        Ok(change
            .ref_id
            .strip_prefix(BRANCH_REF_PREFIX)
            .unwrap_or(change.ref_id.as_str()))
    }

    /// Commits in the order the host listed them.
    pub fn commits(&self) -> impl Iterator<Item = &Commit> {
        self.changesets.values.iter().map(|c| &c.to_commit)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub slug: String,
    pub project: Project,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefChange {
    pub ref_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Changesets {
    #[serde(default)]
    pub values: Vec<Changeset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changeset {
    pub to_commit: Commit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub author: Author,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub author_timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub email_address: String,
}

/// The host sends epoch milliseconds; RFC 3339 text is accepted as well.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Text(String),
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(ms) => DateTime::from_timestamp_millis(ms)
            .map(|t| t.fixed_offset())
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {ms}"))),
        RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(&text)
            .map_err(|e| D::Error::custom(format!("invalid timestamp {text:?}: {e}"))),
    }
}
