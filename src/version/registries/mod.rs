//! Upstream sources for app and chart versions

pub mod chart_index;
pub mod github;

pub use chart_index::ChartIndexRegistry;
pub use github::GitHubReleases;
