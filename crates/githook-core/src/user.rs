use serde::{Deserialize, Serialize};

/// A user account as the issue tracker reports it.
///
/// `email` is absent for accounts that hide it, and in search results
/// that only carry the login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerUser {
    pub login: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl TrackerUser {
    pub fn new(login: impl Into<String>, email: Option<String>) -> Self {
        Self {
            login: login.into(),
            email,
        }
    }

    /// A user known only by login, such as the configured fallback identity.
    pub fn with_login(login: impl Into<String>) -> Self {
        Self::new(login, None)
    }

    /// Exact, case-sensitive comparison against the profile email.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.as_deref() == Some(email)
    }
}
