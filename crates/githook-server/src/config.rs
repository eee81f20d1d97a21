use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use githook_core::{CoreError, ReferencePattern, DEFAULT_PATTERN};
use githook_tracker::{IssueTracker, Lookup, TrackerAuth, TrackerError, YouTrackClient};
use thiserror::Error;
use tracing::warn;

use crate::processor::{ProcessorSettings, TransportPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid bind address {0:?}")]
    Bind(String),

    #[error(transparent)]
    Pattern(#[from] CoreError),

    #[error("tracker credentials missing: set an API key or a username")]
    MissingCredentials,

    #[error("default user {0:?} does not exist in the tracker")]
    UnknownDefaultUser(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

#[derive(Debug, Parser)]
#[command(name = "githook-server", about = "Posts commit references as issue tracker comments")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "GITHOOK_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port to listen on
    #[arg(long, env = "GITHOOK_PORT", default_value = "5000")]
    pub port: u16,

    /// Base URL of the YouTrack instance
    #[arg(long, env = "YOUTRACK_URL")]
    pub youtrack_url: String,

    #[arg(long, env = "YOUTRACK_USERNAME")]
    pub youtrack_username: Option<String>,

    #[arg(long, env = "YOUTRACK_PASSWORD", hide_env_values = true)]
    pub youtrack_password: Option<String>,

    /// Permanent token; takes precedence over username/password
    #[arg(long, env = "YOUTRACK_APIKEY", hide_env_values = true)]
    pub youtrack_api_key: Option<String>,

    /// Base URL of the source-control host, used to link commits
    #[arg(long, env = "STASH_HOST")]
    pub stash_host: String,

    /// Pattern matching issue references in commit messages.
    /// If it has a capture group, the first group is the issue id.
    #[arg(long, env = "GITHOOK_REGEX", default_value = DEFAULT_PATTERN)]
    pub regex: String,

    /// Tracker login used when the commit author has no account
    #[arg(long, env = "DEFAULT_USER")]
    pub default_user: String,

    /// Behaviour when the tracker fails for reasons other than a missing issue
    #[arg(long, env = "GITHOOK_ON_TRANSPORT_ERROR", value_enum, default_value_t = TransportPolicy::Abort)]
    pub on_transport_error: TransportPolicy,

    /// Timeout for each tracker request (seconds)
    #[arg(long, env = "GITHOOK_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|_| ConfigError::Bind(self.bind.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn processor_settings(&self) -> Result<ProcessorSettings, ConfigError> {
        Ok(ProcessorSettings {
            source_host: self.stash_host.clone(),
            pattern: ReferencePattern::new(&self.regex)?,
            default_user: self.default_user.clone(),
            transport_policy: self.on_transport_error,
        })
    }

    pub fn tracker_auth(&self) -> Result<TrackerAuth, ConfigError> {
        if let Some(key) = self.youtrack_api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(TrackerAuth::Token(key.clone()));
        }
        match self.youtrack_username.as_ref().filter(|u| !u.is_empty()) {
            Some(username) => Ok(TrackerAuth::Basic {
                username: username.clone(),
                password: self.youtrack_password.clone(),
            }),
            None => Err(ConfigError::MissingCredentials),
        }
    }

    pub fn build_tracker(&self) -> Result<YouTrackClient, ConfigError> {
        let client = YouTrackClient::new(
            &self.youtrack_url,
            self.tracker_auth()?,
            Duration::from_secs(self.request_timeout),
        )?;
        Ok(client)
    }
}

/// Confirm the fallback account exists before accepting pushes.
///
/// An unreachable tracker is only logged, so the server can start while it is down.
pub async fn verify_default_user(tracker: &dyn IssueTracker, login: &str) -> Result<(), ConfigError> {
    match tracker.get_user(login).await {
        Ok(Lookup::Found(_)) => Ok(()),
        Ok(Lookup::NotFound) => Err(ConfigError::UnknownDefaultUser(login.to_string())),
        Err(e) => {
            warn!("could not verify default user {login}: {e}");
            Ok(())
        }
    }
}
