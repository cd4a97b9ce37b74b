//! # Role Policy Directory
//!
//! Directory-service clients for role management policy lookups.
//!
//! - [`GraphClient`]: HTTP client for the directory's policy endpoints, with
//!   pagination and a retry loop that honours retry suppression
//! - [`InMemoryDirectory`]: deterministic in-process directory for tests and
//!   local runs
//!
//! Both implement [`rolepolicy_core::DirectoryClient`].

pub mod config;
pub mod graph;
pub mod memory;

pub use config::{DirectoryConfig, RetryPolicy};
pub use graph::GraphClient;
pub use memory::InMemoryDirectory;
