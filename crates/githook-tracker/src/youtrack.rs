use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use githook_core::{Comment, IssueReference, TrackerUser};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::traits::{Issue, IssueTracker, Lookup, TrackerError};

const USER_FIELDS: &str = "login,email";
const ISSUE_FIELDS: &str = "idReadable";
const COMMENT_COMMAND: &str = "comment";

/// Credentials for the tracker REST API.
#[derive(Clone)]
pub enum TrackerAuth {
    /// Permanent token, sent as a bearer token.
    Token(String),
    /// HTTP basic authentication.
    Basic {
        username: String,
        password: Option<String>,
    },
}

impl fmt::Debug for TrackerAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackerAuth::Token(_) => f.write_str("Token(***)"),
            TrackerAuth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
        }
    }
}

/// REST client for a YouTrack instance.
#[derive(Debug, Clone)]
pub struct YouTrackClient {
    base: Url,
    client: Client,
    auth: TrackerAuth,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommandRequest<'a> {
    query: &'a str,
    comment: &'a str,
    issues: [IssueHandle<'a>; 1],
    run_as: &'a str,
}

#[derive(Serialize)]
struct IssueHandle<'a> {
    #[serde(rename = "idReadable")]
    id: &'a str,
}

impl YouTrackClient {
    pub fn new(base_url: &str, auth: TrackerAuth, timeout: Duration) -> Result<Self, TrackerError> {
        let base = Url::parse(base_url)
            .map_err(|e| TrackerError::Transport(format!("invalid tracker URL {base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(TrackerError::Transport(format!(
                "invalid tracker URL {base_url}: not a base URL"
            )));
        }

        let client = Client::builder()
            .user_agent(concat!("githook/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Transport(format!("HTTP client init: {e}")))?;

        Ok(Self { base, client, auth })
    }

    /// `{base}/api/{segments...}`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // cannot-be-a-base URLs are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }

    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("Accept", "application/json");
        match &self.auth {
            TrackerAuth::Token(token) => builder.bearer_auth(token),
            TrackerAuth::Basic { username, password } => {
                builder.basic_auth(username, password.as_ref())
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<T, TrackerError> {
        let builder = self.client.get(url).query(query);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        handle_response(resp).await
    }
}

async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, TrackerError> {
    let status = resp.status();
    if status.is_success() {
        resp.json::<T>()
            .await
            .map_err(|e| TrackerError::Decode(format!("json decode: {e}")))
    } else {
        Err(parse_error_with_status(status, resp).await)
    }
}

async fn parse_error_with_status(status: StatusCode, resp: reqwest::Response) -> TrackerError {
    let body = resp.text().await.unwrap_or_default();
    let msg = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v["error_description"]
                .as_str()
                .or_else(|| v["error"].as_str())
                .map(String::from)
        })
        .unwrap_or(body);

    match status {
        StatusCode::NOT_FOUND => TrackerError::NotFound(msg),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TrackerError::Unauthorized(msg),
        _ => TrackerError::Api {
            status: status.as_u16(),
            message: msg,
        },
    }
}

#[async_trait]
impl IssueTracker for YouTrackClient {
    async fn find_users(&self, query: &str) -> Result<Vec<TrackerUser>, TrackerError> {
        let users: Vec<TrackerUser> = self
            .get_json(
                self.api_url(&["users"]),
                &[("query", query), ("fields", USER_FIELDS)],
            )
            .await?;
        debug!("user search {query:?} returned {} result(s)", users.len());
        Ok(users)
    }

    async fn get_user(&self, login: &str) -> Result<Lookup<TrackerUser>, TrackerError> {
        let result = self
            .get_json(self.api_url(&["users", login]), &[("fields", USER_FIELDS)])
            .await;
        Lookup::from_result(result)
    }

    async fn get_issue(&self, id: &IssueReference) -> Result<Lookup<Issue>, TrackerError> {
        let result = self
            .get_json(
                self.api_url(&["issues", id.as_str()]),
                &[("fields", ISSUE_FIELDS)],
            )
            .await;
        Lookup::from_result(result)
    }

    async fn post_comment(&self, comment: &Comment) -> Result<(), TrackerError> {
        let body = CommandRequest {
            query: COMMENT_COMMAND,
            comment: &comment.text,
            issues: [IssueHandle {
                id: comment.issue.as_str(),
            }],
            run_as: &comment.run_as,
        };
        let builder = self.client.post(self.api_url(&["commands"])).json(&body);
        let resp = self
            .with_auth(builder)
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            debug!("commented on {} as {}", comment.issue, comment.run_as);
            Ok(())
        } else {
            Err(parse_error_with_status(status, resp).await)
        }
    }
}
