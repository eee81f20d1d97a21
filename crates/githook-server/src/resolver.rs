use githook_core::TrackerUser;
use githook_tracker::{IssueTracker, Lookup, TrackerError};
use tracing::{debug, warn};

/// Maps a commit author's email to the tracker account comments are posted as.
pub struct UserResolver<'a> {
    tracker: &'a dyn IssueTracker,
    default_user: &'a str,
}

impl<'a> UserResolver<'a> {
    pub fn new(tracker: &'a dyn IssueTracker, default_user: &'a str) -> Self {
        Self {
            tracker,
            default_user,
        }
    }

    /// Always yields a user: the matching account, or the default user.
    ///
    /// Only a failed user search is an error; a candidate whose profile
    /// cannot be fetched is skipped.
    pub async fn resolve(&self, email: &str) -> Result<TrackerUser, TrackerError> {
        match self.find_match(email).await? {
            Some(user) => {
                debug!("resolved {email} to tracker user {}", user.login);
                Ok(user)
            }
            None => {
                warn!(
                    "couldn't find user with email address {email}, using default user {}",
                    self.default_user
                );
                Ok(TrackerUser::with_login(self.default_user))
            }
        }
    }

    async fn find_match(&self, email: &str) -> Result<Option<TrackerUser>, TrackerError> {
        let candidates = self.tracker.find_users(email).await?;

        // The search is free text; a single hit is taken as the author.
        if let [only] = candidates.as_slice() {
            return Ok(Some(only.clone()));
        }

        for candidate in &candidates {
            match self.tracker.get_user(&candidate.login).await {
                Ok(Lookup::Found(profile)) if profile.has_email(email) => return Ok(Some(profile)),
                Ok(Lookup::Found(_)) => {}
                Ok(Lookup::NotFound) => {
                    debug!("skipping candidate {}: profile not found", candidate.login);
                }
                Err(e) => {
                    warn!("skipping candidate {}: {e}", candidate.login);
                }
            }
        }

        Ok(None)
    }
}
