//! Remote YAML editing layer
//!
//! # Modules
//!
//! - [`store`]: Trait over the hosting API's file and Git Data operations
//! - [`github`]: GitHub REST implementation of the store
//! - [`template`]: Helm template wrapper handling
//! - [`yaml_edit`]: Checked field navigation in YAML documents
//! - [`editor`]: Direct-commit and pull-request write pipelines
//! - [`error`]: Error type for editing operations

pub mod editor;
pub mod error;
pub mod github;
pub mod store;
pub mod template;
pub mod yaml_edit;
