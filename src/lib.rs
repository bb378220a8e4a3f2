//! Keeps downstream Helm chart references in step with upstream releases.
//!
//! # Modules
//!
//! - [`version`]: Upstream tag and chart index resolution, version comparison
//! - [`reconcile`]: Update decision against the deployed baseline
//! - [`targets`]: Downstream file descriptors per writer
//! - [`remote`]: Remote YAML editing through the GitHub API
//! - [`pipeline`]: One end-to-end run
//! - [`output`]: `KEY=value` step outputs
//! - [`config`]: Run configuration

pub mod config;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod remote;
pub mod targets;
pub mod version;
