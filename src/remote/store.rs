//! Remote file-store trait over a Git hosting API

#[cfg(test)]
use mockall::automock;

use std::fmt;

use crate::remote::error::EditError;

/// A repository on the hosting service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A file on a branch of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLocation {
    pub repository: Repository,
    pub path: String,
    pub branch: String,
}

impl fmt::Display for FileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}@{}", self.repository, self.path, self.branch)
    }
}

/// File content together with the blob SHA it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub content: String,
    pub sha: String,
}

/// Identity recorded on direct commits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    pub name: String,
    pub email: String,
}

/// A single-file commit through the contents API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCommit {
    pub message: String,
    pub content: String,
    /// SHA the content was derived from; a stale value must be rejected
    pub sha: String,
    pub committer: Option<Committer>,
}

/// Tip of a branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTip {
    pub commit_sha: String,
    pub tree_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

/// Trait for reading and writing files in a remote Git repository
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait RemoteStore: Send + Sync {
    /// Reads a file and the SHA of its current blob
    async fn get_file(&self, location: &FileLocation) -> Result<RemoteFile, EditError>;

    /// Replaces a file on its branch, failing with `WriteConflict` on a stale SHA
    async fn put_file(&self, location: &FileLocation, commit: &FileCommit)
    -> Result<(), EditError>;

    /// Stores `content` as a blob and returns its SHA
    async fn create_blob(&self, repository: &Repository, content: &str)
    -> Result<String, EditError>;

    async fn branch_tip(&self, repository: &Repository, branch: &str)
    -> Result<BranchTip, EditError>;

    /// Creates a tree on top of `base_tree` that replaces only `path`
    async fn create_tree(
        &self,
        repository: &Repository,
        base_tree: &str,
        path: &str,
        blob_sha: &str,
    ) -> Result<String, EditError>;

    async fn create_commit(
        &self,
        repository: &Repository,
        message: &str,
        tree_sha: &str,
        parent_sha: &str,
    ) -> Result<String, EditError>;

    async fn create_branch(
        &self,
        repository: &Repository,
        branch: &str,
        commit_sha: &str,
    ) -> Result<(), EditError>;

    /// Opens a pull request and returns its web URL
    async fn create_pull_request(
        &self,
        repository: &Repository,
        pull_request: &PullRequest,
    ) -> Result<String, EditError>;
}
