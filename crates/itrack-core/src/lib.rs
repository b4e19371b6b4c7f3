//! itrack-core: Core library for the itrack issue tracker
//!
//! Provides the issue model, the JSON file store, and the service that
//! creates issues and moves them between statuses.

pub mod config;
pub mod error;
pub mod id;
pub mod issue;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{Error, StorageCause};
pub use id::generate_id;
pub use issue::{Issue, Status};
pub use service::IssueService;
pub use store::{FileIssueStore, IssueRepository};

/// Result type for itrack operations
pub type Result<T> = std::result::Result<T, Error>;
