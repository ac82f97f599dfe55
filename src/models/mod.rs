//! Data model shared by the API client and the browser controller.
//!
//! - `repository`: Repository (owner, name, default branch)
//! - `tree`: TreeEntry and EntryType (only blobs survive a tree fetch)
//! - `commit`: CommitSummary plus relative-time formatting

pub mod commit;
pub mod repository;
pub mod tree;

pub use commit::*;
pub use repository::*;
pub use tree::*;
