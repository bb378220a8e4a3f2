//! Upstream version resolution and comparison
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────┐     ┌────────────────────┐
//! │ GitHubReleases │     │ ChartIndexRegistry │
//! │  (latest tag)  │     │   (stable entry)   │
//! └────────────────┘     └────────────────────┘
//!         │                        │
//!         └───────────┬────────────┘
//!                     ▼
//!              ┌─────────────┐
//!              │   dotted    │
//!              │  (compare)  │
//!              └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`dotted`]: Dotted numeric version comparison and normalization
//! - [`registry`]: Source traits for release tags and chart indexes
//! - [`registries`]: GitHub and Helm chart index implementations
//! - [`error`]: Error type for resolution failures

pub mod dotted;
pub mod error;
pub mod registries;
pub mod registry;
