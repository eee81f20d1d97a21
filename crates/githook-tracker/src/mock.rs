use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use githook_core::{Comment, IssueReference, TrackerUser};

use crate::traits::{Issue, IssueTracker, Lookup, TrackerError};

/// A tracker call as seen by [`MockTracker`], in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindUsers(String),
    GetUser(String),
    GetIssue(String),
    PostComment { issue: String, run_as: String },
}

/// An in-memory tracker for testing that records every call
/// and answers from configured users and issues.
#[derive(Debug, Default)]
pub struct MockTracker {
    search_results: HashMap<String, Vec<TrackerUser>>,
    profiles: HashMap<String, TrackerUser>,
    issues: HashSet<String>,
    broken_issues: HashSet<String>,
    broken_profiles: HashSet<String>,
    search_fail: bool,
    calls: Mutex<Vec<Call>>,
    comments: Mutex<Vec<Comment>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `find_users(query)` with `users`, in this order.
    pub fn with_search_result(mut self, query: &str, users: Vec<TrackerUser>) -> Self {
        self.search_results.insert(query.to_string(), users);
        self
    }

    /// Make `user` fetchable by login through `get_user`.
    pub fn with_profile(mut self, user: TrackerUser) -> Self {
        self.profiles.insert(user.login.clone(), user);
        self
    }

    pub fn with_issue(mut self, id: &str) -> Self {
        self.issues.insert(id.to_string());
        self
    }

    /// `get_issue` for this id fails with a transport error.
    pub fn with_broken_issue(mut self, id: &str) -> Self {
        self.broken_issues.insert(id.to_string());
        self
    }

    /// `get_user` for this login fails with an authorization error.
    pub fn with_broken_profile(mut self, login: &str) -> Self {
        self.broken_profiles.insert(login.to_string());
        self
    }

    /// Every `find_users` call fails with a transport error.
    pub fn with_search_fail(mut self) -> Self {
        self.search_fail = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn comments(&self) -> Vec<Comment> {
        lock(&self.comments).clone()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }
}

#[async_trait]
impl IssueTracker for MockTracker {
    async fn find_users(&self, query: &str) -> Result<Vec<TrackerUser>, TrackerError> {
        self.record(Call::FindUsers(query.to_string()));
        if self.search_fail {
            return Err(TrackerError::Transport("mock search failure".into()));
        }
        Ok(self.search_results.get(query).cloned().unwrap_or_default())
    }

    async fn get_user(&self, login: &str) -> Result<Lookup<TrackerUser>, TrackerError> {
        self.record(Call::GetUser(login.to_string()));
        if self.broken_profiles.contains(login) {
            return Err(TrackerError::Unauthorized(format!("mock: profile {login} is hidden")));
        }
        Ok(match self.profiles.get(login) {
            Some(user) => Lookup::Found(user.clone()),
            None => Lookup::NotFound,
        })
    }

    async fn get_issue(&self, id: &IssueReference) -> Result<Lookup<Issue>, TrackerError> {
        self.record(Call::GetIssue(id.to_string()));
        if self.broken_issues.contains(id.as_str()) {
            return Err(TrackerError::Transport(format!("mock failure fetching {id}")));
        }
        if self.issues.contains(id.as_str()) {
            Ok(Lookup::Found(Issue { id: id.to_string() }))
        } else {
            Ok(Lookup::NotFound)
        }
    }

    async fn post_comment(&self, comment: &Comment) -> Result<(), TrackerError> {
        self.record(Call::PostComment {
            issue: comment.issue.to_string(),
            run_as: comment.run_as.clone(),
        });
        if !self.issues.contains(comment.issue.as_str()) {
            return Err(TrackerError::NotFound(comment.issue.to_string()));
        }
        lock(&self.comments).push(comment.clone());
        Ok(())
    }
}
