//! Configuration module for mirrored crawling
//!
//! This module provides the `CrawlConfig` struct, its type-safe builder and
//! the `SitePair` derived from it at startup.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod methods;
pub mod site_pair;
pub mod types;

// Re-exports for public API
pub use builder::{CrawlConfigBuilder, WithStorageDir, WithTestUrl};
pub use site_pair::{Credentials, Site, SitePair};
pub use types::{CrawlConfig, ThrottleConfig};
