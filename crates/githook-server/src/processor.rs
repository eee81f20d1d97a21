use std::sync::Arc;

use githook_core::{
    compose, Comment, CommentContext, Commit, CoreError, IssueReference, PushEvent,
    ReferencePattern, RepositoryLinks, TrackerUser,
};
use githook_tracker::{IssueTracker, Lookup, TrackerError};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::resolver::UserResolver;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Payload(#[from] CoreError),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),
}

/// What to do when a tracker call fails for a reason other than "not found".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TransportPolicy {
    /// Stop processing and fail the request.
    #[default]
    Abort,
    /// Record the failure against the reference and move on.
    Continue,
}

#[derive(Debug, Clone)]
pub struct ProcessorSettings {
    /// Base URL of the source-control host, used for commit links.
    pub source_host: String,
    pub pattern: ReferencePattern,
    /// Login used when the author has no matching tracker account.
    pub default_user: String,
    pub transport_policy: TransportPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Posted { run_as: String },
    IssueNotFound,
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceRecord {
    pub commit_id: String,
    pub issue: IssueReference,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-reference results of one push event, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingSummary {
    pub commits: usize,
    pub commits_without_references: usize,
    pub references: Vec<ReferenceRecord>,
}

impl ProcessingSummary {
    pub fn posted(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Posted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::IssueNotFound))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.references.iter().filter(|r| pred(&r.outcome)).count()
    }
}

enum ReferenceOutcome {
    Posted(Comment),
    IssueNotFound,
}

/// Turns push events into tracker comments.
///
/// Commits and their references are handled strictly in order. A missing
/// issue only skips that reference.
#[derive(Clone)]
pub struct EventProcessor {
    tracker: Arc<dyn IssueTracker>,
    settings: Arc<ProcessorSettings>,
}

impl EventProcessor {
    pub fn new(tracker: Arc<dyn IssueTracker>, settings: Arc<ProcessorSettings>) -> Self {
        Self { tracker, settings }
    }

    pub async fn process(&self, event: &PushEvent) -> Result<ProcessingSummary, ProcessError> {
        let branch = event.branch()?;
        let links = RepositoryLinks::new(&self.settings.source_host, &event.repository);
        debug!(
            "received push event in branch {branch} on repository {}",
            event.repository.name
        );

        let mut summary = ProcessingSummary::default();
        for commit in event.commits() {
            self.process_commit(event, commit, branch, &links, &mut summary)
                .await?;
        }

        info!(
            "processed {} commit(s) on {}/{}: {} posted, {} skipped, {} failed",
            summary.commits,
            event.repository.name,
            branch,
            summary.posted(),
            summary.skipped(),
            summary.failed()
        );
        Ok(summary)
    }

    async fn process_commit(
        &self,
        event: &PushEvent,
        commit: &Commit,
        branch: &str,
        links: &RepositoryLinks,
        summary: &mut ProcessingSummary,
    ) -> Result<(), ProcessError> {
        summary.commits += 1;
        let commit_url = links.commit_url(&commit.id);
        debug!(
            "processing commit {} by {} ({}) in {commit_url}",
            commit.id, commit.author.name, commit.author.email_address
        );

        let references = self.settings.pattern.extract(&commit.message);
        if references.is_empty() {
            debug!("didn't find any referenced issues in commit {}", commit.id);
            summary.commits_without_references += 1;
            return Ok(());
        }
        debug!(
            "found {} referenced issue(s) in commit {}",
            references.len(),
            commit.id
        );

        let user = UserResolver::new(self.tracker.as_ref(), &self.settings.default_user)
            .resolve(&commit.author.email_address)
            .await?;

        let ctx = CommentContext {
            commit_id: &commit.id,
            commit_url: &commit_url,
            author_name: &commit.author.name,
            timestamp: commit.author_timestamp,
            branch,
            repo_url: links.homepage(),
            repo_name: &event.repository.name,
            message: &commit.message,
        };

        for reference in references {
            let outcome = match self.post_reference(&reference, &ctx, &user).await {
                Ok(ReferenceOutcome::Posted(comment)) => Outcome::Posted {
                    run_as: comment.run_as,
                },
                Ok(ReferenceOutcome::IssueNotFound) => {
                    warn!("couldn't find issue {reference}");
                    Outcome::IssueNotFound
                }
                Err(e) => match self.settings.transport_policy {
                    TransportPolicy::Abort => {
                        error!("aborting push event at {reference} in commit {}: {e}", commit.id);
                        return Err(e.into());
                    }
                    TransportPolicy::Continue => {
                        error!("failed to comment on {reference} for commit {}: {e}", commit.id);
                        Outcome::Failed {
                            error: e.to_string(),
                        }
                    }
                },
            };
            summary.references.push(ReferenceRecord {
                commit_id: commit.id.clone(),
                issue: reference,
                outcome,
            });
        }

        Ok(())
    }

    async fn post_reference(
        &self,
        reference: &IssueReference,
        ctx: &CommentContext<'_>,
        user: &TrackerUser,
    ) -> Result<ReferenceOutcome, TrackerError> {
        debug!("processing reference to issue {reference}");
        if let Lookup::NotFound = self.tracker.get_issue(reference).await? {
            return Ok(ReferenceOutcome::IssueNotFound);
        }

        let comment = Comment {
            issue: reference.clone(),
            text: compose(ctx),
            run_as: user.login.clone(),
        };
        debug!("comment for {reference}:\n{}", comment.text);

        // the issue can disappear between the lookup and the command
        match self.tracker.post_comment(&comment).await {
            Ok(()) => Ok(ReferenceOutcome::Posted(comment)),
            Err(TrackerError::NotFound(_)) => Ok(ReferenceOutcome::IssueNotFound),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use githook_tracker::mock::{Call, MockTracker};

    use super::*;
    use crate::test_helpers::{push_event, test_settings, AUTHOR_EMAIL};

    fn processor(tracker: Arc<MockTracker>, policy: TransportPolicy) -> EventProcessor {
        let mut settings = test_settings();
        settings.transport_policy = policy;
        EventProcessor::new(tracker, Arc::new(settings))
    }

    fn jane() -> TrackerUser {
        TrackerUser::new("jane", Some(AUTHOR_EMAIL.into()))
    }

    fn posted_issues(tracker: &MockTracker) -> Vec<(String, String)> {
        tracker
            .comments()
            .into_iter()
            .map(|c| (c.issue.to_string(), c.run_as))
            .collect()
    }

    #[tokio::test]
    async fn posts_each_reference_in_order_as_author() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_issue("ABC-123")
                .with_issue("ABC-999"),
        );
        let event = push_event(&["Fixes ABC-123 and related to ABC-999"]);

        let summary = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(summary.posted(), 2);
        assert_eq!(
            posted_issues(&tracker),
            vec![
                ("ABC-123".to_string(), "jane".to_string()),
                ("ABC-999".to_string(), "jane".to_string()),
            ]
        );
        let find_calls = tracker
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::FindUsers(_)))
            .count();
        assert_eq!(find_calls, 1);
    }

    #[tokio::test]
    async fn missing_issue_does_not_block_other_references() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_issue("ABC-123")
                .with_issue("OPS-1"),
        );
        let event = push_event(&["Fixes ABC-999 and ABC-123", "Refs OPS-1"]);

        let summary = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(summary.posted(), 2);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.references[0].issue.as_str(), "ABC-999");
        assert_eq!(summary.references[0].outcome, Outcome::IssueNotFound);
        assert_eq!(
            posted_issues(&tracker),
            vec![
                ("ABC-123".to_string(), "jane".to_string()),
                ("OPS-1".to_string(), "jane".to_string()),
            ]
        );
        assert!(!tracker.calls().contains(&Call::PostComment {
            issue: "ABC-999".into(),
            run_as: "jane".into(),
        }));
    }

    #[tokio::test]
    async fn commit_without_references_makes_no_tracker_calls() {
        let tracker = Arc::new(MockTracker::new());
        let event = push_event(&["fix typo", "bump version"]);

        let summary = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(summary.commits, 2);
        assert_eq!(summary.commits_without_references, 2);
        assert!(summary.references.is_empty());
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_author_posts_as_default_user() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(
                    AUTHOR_EMAIL,
                    vec![TrackerUser::with_login("a"), TrackerUser::with_login("b")],
                )
                .with_profile(TrackerUser::new("a", Some("a@example.com".into())))
                .with_issue("ABC-123"),
        );
        let event = push_event(&["ABC-123"]);

        processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(
            posted_issues(&tracker),
            vec![("ABC-123".to_string(), "githook-bot".to_string())]
        );
    }

    #[tokio::test]
    async fn duplicate_references_are_commented_twice() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_issue("ABC-1"),
        );
        let event = push_event(&["ABC-1: start\n\nstill ABC-1"]);

        let summary = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(summary.posted(), 2);
        let comments = tracker.comments();
        assert_eq!(comments[0], comments[1]);
    }

    #[tokio::test]
    async fn comment_text_links_commit_and_quotes_message() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_issue("ABC-1"),
        );
        let event = push_event(&["Fixes ABC-1"]);

        processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(
            tracker.comments()[0].text,
            "Commit [https://stash.example.com/projects/OPS/repos/backend/commits/c0 c0] \
             on branch main in [https://stash.example.com/projects/OPS/repos/backend Backend] \
             made by Jane Doe on 2015-01-01 12:00:00+00:00\n{quote}Fixes ABC-1{quote}"
        );
    }

    #[tokio::test]
    async fn transport_error_aborts_by_default() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_broken_issue("ABC-1")
                .with_issue("ABC-2"),
        );
        let event = push_event(&["ABC-1 ABC-2"]);

        let err = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap_err();

        assert!(matches!(err, ProcessError::Tracker(TrackerError::Transport(_))));
        assert!(tracker.comments().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_recorded_when_continuing() {
        let tracker = Arc::new(
            MockTracker::new()
                .with_search_result(AUTHOR_EMAIL, vec![jane()])
                .with_broken_issue("ABC-1")
                .with_issue("ABC-2"),
        );
        let event = push_event(&["ABC-1 ABC-2"]);

        let summary = processor(tracker.clone(), TransportPolicy::Continue)
            .process(&event)
            .await
            .unwrap();

        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.posted(), 1);
        assert_eq!(
            posted_issues(&tracker),
            vec![("ABC-2".to_string(), "jane".to_string())]
        );
    }

    #[tokio::test]
    async fn user_resolution_failure_aborts_even_when_continuing() {
        let tracker = Arc::new(MockTracker::new().with_search_fail().with_issue("ABC-1"));
        let event = push_event(&["ABC-1"]);

        let err = processor(tracker.clone(), TransportPolicy::Continue)
            .process(&event)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Tracker(_)));
    }

    #[tokio::test]
    async fn push_without_ref_changes_is_rejected() {
        let tracker = Arc::new(MockTracker::new());
        let mut event = push_event(&["ABC-1"]);
        event.ref_changes.clear();

        let err = processor(tracker.clone(), TransportPolicy::Abort)
            .process(&event)
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Payload(CoreError::InvalidPayload(_))));
        assert!(tracker.calls().is_empty());
    }

    #[test]
    fn summary_serializes_outcomes() {
        let summary = ProcessingSummary {
            commits: 1,
            commits_without_references: 0,
            references: vec![ReferenceRecord {
                commit_id: "c0".into(),
                issue: IssueReference::new("ABC-1"),
                outcome: Outcome::Posted {
                    run_as: "jane".into(),
                },
            }],
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["references"][0]["issue"], "ABC-1");
        assert_eq!(value["references"][0]["outcome"], "posted");
        assert_eq!(value["references"][0]["run_as"], "jane");
    }
}
