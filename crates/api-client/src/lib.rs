pub mod client;
pub mod store;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::GitHubContentClient;
pub use store::{ClientError, Committer, ContentStore, RawContent, RepoTarget};
