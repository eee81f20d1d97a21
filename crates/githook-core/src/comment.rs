use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::reference::IssueReference;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Everything the comment text is built from.
#[derive(Debug, Clone)]
pub struct CommentContext<'a> {
    pub commit_id: &'a str,
    pub commit_url: &'a str,
    pub author_name: &'a str,
    pub timestamp: DateTime<FixedOffset>,
    pub branch: &'a str,
    pub repo_url: &'a str,
    pub repo_name: &'a str,
    pub message: &'a str,
}

/// Render the tracker comment for a commit.
///
/// The first line links the commit and names branch, repository, author and
/// time; the raw message follows inside a `{quote}` block, untouched.
pub fn compose(ctx: &CommentContext<'_>) -> String {
    format!(
        "Commit [{url} {id}] on branch {branch} in [{repo_url} {repo_name}] made by {author} on {date}\n{{quote}}{message}{{quote}}",
        url = ctx.commit_url,
        id = ctx.commit_id,
        branch = ctx.branch,
        repo_url = ctx.repo_url,
        repo_name = ctx.repo_name,
        author = ctx.author_name,
        date = ctx.timestamp.format(TIMESTAMP_FORMAT),
        message = ctx.message,
    )
}

/// A composed comment bound for one issue, posted as `run_as`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub issue: IssueReference,
    pub text: String,
    pub run_as: String,
}
