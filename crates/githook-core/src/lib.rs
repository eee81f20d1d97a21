pub mod comment;
pub mod error;
pub mod links;
pub mod push;
pub mod reference;
pub mod user;

pub use comment::{compose, Comment, CommentContext};
pub use error::CoreError;
pub use links::RepositoryLinks;
pub use push::{Author, Commit, PushEvent, Repository};
pub use reference::{IssueReference, ReferencePattern, DEFAULT_PATTERN};
pub use user::TrackerUser;
