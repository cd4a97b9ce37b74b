//! Shared traits for policy lookups

pub mod directory;
pub mod retry;

// Re-export commonly used traits
pub use directory::DirectoryClient;
pub use retry::{RetryControl, RetrySuppression};
