//! Read-modify-write of one remote YAML file
//!
//! Every step runs once, in order. A failure aborts the target and nothing
//! already created (blob, tree, commit, branch) is cleaned up.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::remote::error::EditError;
use crate::remote::store::{Committer, FileCommit, PullRequest, RemoteStore};
use crate::remote::template::TemplateWrapper;
use crate::remote::yaml_edit::edit_document;
use crate::targets::{UpdateTarget, WriteMode};

/// Direct commits are retried this many times in total when the file moves underneath
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// What happened to a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Written straight onto the branch
    Committed,
    /// Pushed to a new branch with a pull request
    PullRequestOpened { branch: String, url: String },
    /// Read and edited, but not written
    DryRun,
}

/// Apply the edits of `target` to `content`, keeping any template wrapper.
pub fn render(target: &UpdateTarget, content: &str) -> Result<String, EditError> {
    if !target.templated {
        return edit_document(content, &target.edits);
    }

    let (wrapper, body) = TemplateWrapper::strip(content)
        .ok_or_else(|| EditError::TemplateNotFound(target.location.to_string()))?;
    let edited = edit_document(body, &target.edits)?;
    // the serializer ends the document with a newline the end marker line already provides
    Ok(wrapper.rewrap(edited.strip_suffix('\n').unwrap_or(&edited)))
}

/// Performs [`UpdateTarget`]s against a [`RemoteStore`]
pub struct RemoteFileEditor {
    store: Arc<dyn RemoteStore>,
    committer: Option<Committer>,
    dry_run: bool,
}

impl RemoteFileEditor {
    pub fn new(store: Arc<dyn RemoteStore>, committer: Option<Committer>) -> Self {
        Self {
            store,
            committer,
            dry_run: false,
        }
    }

    /// Read and edit files but never write them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn apply(&self, target: &UpdateTarget) -> Result<UpdateOutcome, EditError> {
        if self.dry_run {
            let file = self.store.get_file(&target.location).await?;
            let content = render(target, &file.content)?;
            info!(
                file = %target.location,
                "dry run, would write:\n{}", content
            );
            return Ok(UpdateOutcome::DryRun);
        }

        match target.mode {
            WriteMode::DirectCommit => self.commit_directly(target).await,
            WriteMode::PullRequest => self.open_pull_request(target).await,
        }
    }

    /// Contents API write guarded by the SHA read in the same attempt.
    async fn commit_directly(&self, target: &UpdateTarget) -> Result<UpdateOutcome, EditError> {
        let mut attempt = 1;
        loop {
            let file = self.store.get_file(&target.location).await?;
            let commit = FileCommit {
                message: target.commit_message(),
                content: render(target, &file.content)?,
                sha: file.sha,
                committer: self.committer.clone(),
            };

            match self.store.put_file(&target.location, &commit).await {
                Ok(()) => {
                    info!(file = %target.location, version = %target.version, "committed");
                    return Ok(UpdateOutcome::Committed);
                }
                Err(EditError::WriteConflict(path)) if attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(
                        file = %path,
                        attempt,
                        "file changed since it was read, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn open_pull_request(&self, target: &UpdateTarget) -> Result<UpdateOutcome, EditError> {
        let repository = &target.location.repository;
        let file = self.store.get_file(&target.location).await?;
        let content = render(target, &file.content)?;

        let blob_sha = self.store.create_blob(repository, &content).await?;
        debug!(blob_sha = %blob_sha, "created blob");

        let tip = self
            .store
            .branch_tip(repository, &target.location.branch)
            .await?;
        let tree_sha = self
            .store
            .create_tree(repository, &tip.tree_sha, &file.path, &blob_sha)
            .await?;

        let message = target.commit_message();
        let commit_sha = self
            .store
            .create_commit(repository, &message, &tree_sha, &tip.commit_sha)
            .await?;

        let branch = target.branch_name();
        self.store
            .create_branch(repository, &branch, &commit_sha)
            .await?;

        let url = self
            .store
            .create_pull_request(
                repository,
                &PullRequest {
                    title: message.clone(),
                    body: message,
                    head: branch.clone(),
                    base: target.location.branch.clone(),
                },
            )
            .await?;

        info!(file = %target.location, url = %url, "opened pull request");
        Ok(UpdateOutcome::PullRequestOpened { branch, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::store::{
        BranchTip, FileLocation, MockRemoteStore, RemoteFile, Repository,
    };
    use crate::remote::yaml_edit::{FieldEdit, FieldPath};
    use mockall::Sequence;
    use mockall::predicate::{always, eq};

    const ARGO_APP: &str = "{{ if .Values.loki.enabled }}\napiVersion: argoproj.io/v1alpha1\nkind: Application\nspec:\n  source:\n    chart: loki\n    targetRevision: 1.8.0\n{{ end }}\n";

    fn location(repo: &str, path: &str) -> FileLocation {
        FileLocation {
            repository: Repository::new("octo", repo),
            path: path.to_string(),
            branch: "main".to_string(),
        }
    }

    fn version_target() -> UpdateTarget {
        UpdateTarget {
            artifact: "loki".to_string(),
            location: location("docker-loki", "version.yaml"),
            edits: vec![FieldEdit::required(FieldPath::parse("env.version"), "3.0.1")],
            templated: false,
            mode: WriteMode::DirectCommit,
            version: "3.0.1".to_string(),
        }
    }

    fn argo_target() -> UpdateTarget {
        UpdateTarget {
            artifact: "loki".to_string(),
            location: location("homelab", "apps/loki.yaml"),
            edits: vec![FieldEdit::required(
                FieldPath::parse("spec.source.targetRevision"),
                "1.9.0",
            )],
            templated: true,
            mode: WriteMode::PullRequest,
            version: "1.9.0".to_string(),
        }
    }

    fn remote_file(content: &str, sha: &str) -> RemoteFile {
        RemoteFile {
            path: "version.yaml".to_string(),
            content: content.to_string(),
            sha: sha.to_string(),
        }
    }

    #[test]
    fn render_rewraps_templated_content() {
        let rendered = render(&argo_target(), ARGO_APP).unwrap();

        assert!(rendered.starts_with("{{ if .Values.loki.enabled }}\n"));
        assert!(rendered.ends_with("\n{{ end }}\n"));
        assert!(!rendered.contains("\n\n{{ end }}"));
        let (_, body) = TemplateWrapper::strip(&rendered).unwrap();
        let document: serde_yaml::Value = serde_yaml::from_str(body).unwrap();
        assert_eq!(
            document["spec"]["source"]["targetRevision"],
            serde_yaml::Value::from("1.9.0")
        );
        assert_eq!(document["spec"]["source"]["chart"], serde_yaml::Value::from("loki"));
    }

    #[test]
    fn render_fails_when_template_markers_are_missing() {
        let result = render(&argo_target(), "spec:\n  source: {}\n");

        assert!(matches!(result, Err(EditError::TemplateNotFound(_))));
    }

    #[tokio::test]
    async fn apply_direct_commit_puts_content_with_read_sha() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get_file()
            .times(1)
            .returning(|_| Ok(remote_file("env:\n  version: 3.0.0\n", "sha-1")));
        store
            .expect_put_file()
            .withf(|_, commit| {
                commit.sha == "sha-1"
                    && commit.message == "Update version to 3.0.1"
                    && commit.content.contains("version: 3.0.1")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let outcome = editor.apply(&version_target()).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Committed);
    }

    #[tokio::test]
    async fn apply_direct_commit_rereads_after_write_conflict() {
        let mut store = MockRemoteStore::new();
        let mut seq = Sequence::new();
        store
            .expect_get_file()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(remote_file("env:\n  version: 3.0.0\n", "stale")));
        store
            .expect_put_file()
            .withf(|_, commit| commit.sha == "stale")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|location, _| Err(EditError::WriteConflict(location.to_string())));
        store
            .expect_get_file()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(remote_file("env:\n  version: 3.0.0\n  arch: arm64\n", "fresh")));
        store
            .expect_put_file()
            .withf(|_, commit| commit.sha == "fresh" && commit.content.contains("arch: arm64"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let outcome = editor.apply(&version_target()).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::Committed);
    }

    #[tokio::test]
    async fn apply_direct_commit_gives_up_after_max_attempts() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get_file()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(|_| Ok(remote_file("env:\n  version: 3.0.0\n", "sha")));
        store
            .expect_put_file()
            .times(MAX_WRITE_ATTEMPTS)
            .returning(|location, _| Err(EditError::WriteConflict(location.to_string())));

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let result = editor.apply(&version_target()).await;

        assert!(matches!(result, Err(EditError::WriteConflict(_))));
    }

    #[tokio::test]
    async fn apply_direct_commit_reports_missing_parent_field() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get_file()
            .returning(|_| Ok(remote_file("image: loki\n", "sha")));
        store.expect_put_file().never();

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let result = editor.apply(&version_target()).await;

        assert!(matches!(result, Err(EditError::FieldNotFound(path)) if path == "env"));
    }

    #[tokio::test]
    async fn apply_pull_request_runs_git_data_steps_in_order() {
        let mut store = MockRemoteStore::new();
        let mut seq = Sequence::new();
        store
            .expect_get_file()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(RemoteFile {
                    path: "apps/loki.yaml".to_string(),
                    content: ARGO_APP.to_string(),
                    sha: "file-sha".to_string(),
                })
            });
        store
            .expect_create_blob()
            .withf(|_, content| {
                content.starts_with("{{ if .Values.loki.enabled }}")
                    && content.contains("targetRevision: 1.9.0")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("blob-sha".to_string()));
        store
            .expect_branch_tip()
            .with(always(), eq("main"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(BranchTip {
                    commit_sha: "tip-sha".to_string(),
                    tree_sha: "tree-sha".to_string(),
                })
            });
        store
            .expect_create_tree()
            .with(always(), eq("tree-sha"), eq("apps/loki.yaml"), eq("blob-sha"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok("new-tree".to_string()));
        store
            .expect_create_commit()
            .with(
                always(),
                eq("Update loki to version 1.9.0"),
                eq("new-tree"),
                eq("tip-sha"),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _, _| Ok("commit-sha".to_string()));
        store
            .expect_create_branch()
            .with(always(), eq("update-loki-to-1.9.0"), eq("commit-sha"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_create_pull_request()
            .withf(|_, pr| pr.head == "update-loki-to-1.9.0" && pr.base == "main")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("https://github.com/octo/homelab/pull/1".to_string()));

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let outcome = editor.apply(&argo_target()).await.unwrap();

        assert_eq!(
            outcome,
            UpdateOutcome::PullRequestOpened {
                branch: "update-loki-to-1.9.0".to_string(),
                url: "https://github.com/octo/homelab/pull/1".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn apply_pull_request_stops_at_failed_branch_creation() {
        let mut store = MockRemoteStore::new();
        store.expect_get_file().returning(|_| {
            Ok(RemoteFile {
                path: "apps/loki.yaml".to_string(),
                content: ARGO_APP.to_string(),
                sha: "file-sha".to_string(),
            })
        });
        store
            .expect_create_blob()
            .returning(|_, _| Ok("blob-sha".to_string()));
        store.expect_branch_tip().returning(|_, _| {
            Ok(BranchTip {
                commit_sha: "tip-sha".to_string(),
                tree_sha: "tree-sha".to_string(),
            })
        });
        store
            .expect_create_tree()
            .returning(|_, _, _, _| Ok("new-tree".to_string()));
        store
            .expect_create_commit()
            .returning(|_, _, _, _| Ok("commit-sha".to_string()));
        store.expect_create_branch().returning(|_, _, _| {
            Err(EditError::Api {
                step: "branch creation",
                status: reqwest::StatusCode::UNPROCESSABLE_ENTITY,
                message: "Reference already exists".to_string(),
            })
        });
        store.expect_create_pull_request().never();

        let editor = RemoteFileEditor::new(Arc::new(store), None);
        let result = editor.apply(&argo_target()).await;

        assert!(matches!(result, Err(EditError::Api { step: "branch creation", .. })));
    }

    #[tokio::test]
    async fn apply_dry_run_reads_but_never_writes() {
        let mut store = MockRemoteStore::new();
        store
            .expect_get_file()
            .times(1)
            .returning(|_| Ok(remote_file("env:\n  version: 3.0.0\n", "sha")));
        store.expect_put_file().never();

        let editor = RemoteFileEditor::new(Arc::new(store), None).with_dry_run(true);
        let outcome = editor.apply(&version_target()).await.unwrap();

        assert_eq!(outcome, UpdateOutcome::DryRun);
    }
}
