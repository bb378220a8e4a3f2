//! Downstream file targets
//!
//! Each [`Writer`] from the reconciler maps to exactly one file in one
//! repository, together with the fields to set and how to write it back.

use crate::reconcile::Writer;
use crate::remote::store::{FileLocation, Repository};
use crate::remote::yaml_edit::{FieldEdit, FieldPath};

/// Annotation Artifact Hub reads the changelog from
const CHANGES_ANNOTATION: &str = "artifacthub.io/changes";

/// How a changed file reaches its branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Contents API PUT straight onto the branch
    DirectCommit,
    /// New branch plus a pull request into the branch
    PullRequest,
}

/// Where the downstream files live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSettings {
    pub owner: String,
    /// Repository holding the ArgoCD application templates
    pub homelab_repo: String,
    /// Repository holding the values file
    pub values_repo: String,
    /// Repository holding self-maintained charts
    pub helm_charts_repo: String,
    /// Prefix of the self-built image repository, followed by the values chart name
    pub image_repo_prefix: String,
    pub branch: String,
    /// Directory of the ArgoCD application templates
    pub argocd_app_dir: String,
    pub values_file: String,
    /// Key of the chart in the values file and name of its ArgoCD template
    pub values_chart_name: String,
    /// Directory name of the self-maintained chart under `charts/`
    pub chart_name: String,
}

/// One file edit to perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTarget {
    /// Name used in commit messages and the PR branch name
    pub artifact: String,
    pub location: FileLocation,
    pub edits: Vec<FieldEdit>,
    /// The YAML sits inside a `{{ ... }}` / `{{ ... }}` template block
    pub templated: bool,
    pub mode: WriteMode,
    /// Version the target is moved to
    pub version: String,
}

impl UpdateTarget {
    /// Branch for pull-request mode, derived from artifact and version
    pub fn branch_name(&self) -> String {
        format!("update-{}-to-{}", self.artifact, self.version)
    }

    pub fn commit_message(&self) -> String {
        match self.mode {
            WriteMode::DirectCommit => format!("Update version to {}", self.version),
            WriteMode::PullRequest => {
                format!("Update {} to version {}", self.artifact, self.version)
            }
        }
    }
}

impl TargetSettings {
    fn location(&self, repo: &str, path: String) -> FileLocation {
        FileLocation {
            repository: Repository::new(&self.owner, repo),
            path,
            branch: self.branch.clone(),
        }
    }

    /// The ArgoCD target already claims the chart name for its branch when
    /// both files live in the same repository
    fn values_artifact(&self) -> String {
        if self.values_repo == self.homelab_repo {
            format!("{}-values", self.values_chart_name)
        } else {
            self.values_chart_name.clone()
        }
    }

    /// Describe the file edit performed by `writer`.
    pub fn target_for(&self, writer: &Writer) -> UpdateTarget {
        match writer {
            Writer::SelfManagedImage { app_version } => UpdateTarget {
                artifact: self.chart_name.clone(),
                location: self.location(
                    &format!("{}{}", self.image_repo_prefix, self.values_chart_name),
                    "version.yaml".to_string(),
                ),
                edits: vec![FieldEdit::required(
                    FieldPath::parse("env.version"),
                    app_version,
                )],
                templated: false,
                mode: WriteMode::DirectCommit,
                version: app_version.clone(),
            },
            Writer::SelfManagedChart {
                version,
                app_version,
            } => UpdateTarget {
                artifact: self.chart_name.clone(),
                location: self.location(
                    &self.helm_charts_repo,
                    format!("charts/{}/Chart.yaml", self.chart_name),
                ),
                edits: vec![
                    FieldEdit::required(FieldPath::parse("appVersion"), app_version),
                    FieldEdit::required(FieldPath::parse("version"), version),
                    FieldEdit::optional(
                        FieldPath::from_segments(["annotations", CHANGES_ANNOTATION]),
                        changes_annotation(version),
                    ),
                ],
                templated: false,
                mode: WriteMode::PullRequest,
                version: version.clone(),
            },
            Writer::ArgoApplication { version } => UpdateTarget {
                artifact: self.values_chart_name.clone(),
                location: self.location(
                    &self.homelab_repo,
                    format!(
                        "{}/{}.yaml",
                        self.argocd_app_dir.trim_end_matches('/'),
                        self.values_chart_name
                    ),
                ),
                edits: vec![FieldEdit::required(
                    FieldPath::parse("spec.source.targetRevision"),
                    version,
                )],
                templated: true,
                mode: WriteMode::PullRequest,
                version: version.clone(),
            },
            Writer::ValuesFile { version } => UpdateTarget {
                artifact: self.values_artifact(),
                location: self.location(&self.values_repo, self.values_file.clone()),
                edits: vec![FieldEdit::required(
                    FieldPath::from_segments([self.values_chart_name.as_str(), "chartVersion"]),
                    version,
                )],
                templated: false,
                mode: WriteMode::PullRequest,
                version: version.clone(),
            },
        }
    }
}

/// Artifact Hub changelog entry for a chart release
fn changes_annotation(version: &str) -> String {
    format!(
        "- kind: changed\n  description: updated to {}",
        version.replace('-', " ")
    )
}
