pub mod mock;
mod traits;
mod youtrack;

pub use traits::{Issue, IssueTracker, Lookup, TrackerError};
pub use youtrack::{TrackerAuth, YouTrackClient};
