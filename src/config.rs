use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{ArgAction, Args, ValueEnum};

use crate::reconcile::{ReconcileSettings, TagDecoration};
use crate::remote::store::{Committer, Repository};
use crate::targets::TargetSettings;
use crate::version::registries::github::DEFAULT_BASE_URL;

/// Chart category used when none is configured
pub const DEFAULT_CHART_TYPE: &str = "optional";

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Command-line flags, each falling back to the GitHub Actions `INPUT_*` variable
#[derive(Debug, Clone, Args)]
pub struct CliArgs {
    /// Owner of the upstream source repository
    #[arg(long, env = "INPUT_GITHUB_USER")]
    pub github_user: String,

    /// Upstream source repository whose releases are tracked
    #[arg(long, env = "INPUT_GITHUB_REPO")]
    pub github_repo: String,

    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    #[arg(long, env = "INPUT_GITHUB_API_URL", default_value = DEFAULT_BASE_URL)]
    pub github_api_url: String,

    /// URL of the upstream chart repository's index.yaml
    #[arg(long, env = "INPUT_CHART_INDEX_URL")]
    pub chart_index_url: String,

    #[arg(long, env = "INPUT_CHART_NAME")]
    pub chart_name: String,

    /// Key of the chart in the values file and name of its ArgoCD template
    #[arg(long, env = "INPUT_VALUES_CHART_NAME")]
    pub values_chart_name: String,

    /// Chart version currently deployed
    #[arg(long, env = "INPUT_CHART_VERSION")]
    pub chart_version: String,

    /// Directory of the self-maintained chart, if it differs from the chart name
    #[arg(long, env = "INPUT_REMOTE_CHART_NAME")]
    pub remote_chart_name: Option<String>,

    /// Chart category, selects the ArgoCD app directory and values file
    #[arg(long, env = "INPUT_CHART_TYPE")]
    pub chart_type: Option<String>,

    /// Substring removed from release tags before comparison
    #[arg(long, env = "INPUT_RELEASE_REMOVE_STRING")]
    pub release_remove_string: Option<String>,

    #[arg(
        long,
        env = "INPUT_SELF_MANAGED_IMAGE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub self_managed_image: bool,

    #[arg(
        long,
        env = "INPUT_SELF_MANAGED_CHART",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub self_managed_chart: bool,

    #[arg(long, env = "INPUT_DOCKERTAGPREFIX")]
    pub docker_tag_prefix: Option<String>,

    #[arg(long, env = "INPUT_DOCKERTAGSUFFIX")]
    pub docker_tag_suffix: Option<String>,

    /// Owner of the repositories that get updated, defaults to the GitHub user
    #[arg(long, env = "INPUT_TARGET_OWNER")]
    pub target_owner: Option<String>,

    #[arg(long, env = "INPUT_TARGET_BRANCH", default_value = "main")]
    pub target_branch: String,

    #[arg(long, env = "INPUT_HOMELAB_REPO", default_value = "homelab")]
    pub homelab_repo: String,

    #[arg(long, env = "INPUT_VALUES_REPO", default_value = "homelab-updater")]
    pub values_repo: String,

    #[arg(long, env = "INPUT_HELM_CHARTS_REPO", default_value = "helm-charts")]
    pub helm_charts_repo: String,

    #[arg(long, env = "INPUT_IMAGE_REPO_PREFIX", default_value = "docker-")]
    pub image_repo_prefix: String,

    /// Defaults to deploy/argocd/bootstrap-<chart type>-apps/templates
    #[arg(long, env = "INPUT_ARGOCD_APP_DIR")]
    pub argocd_app_dir: Option<String>,

    /// Defaults to values-<chart type>.yaml
    #[arg(long, env = "INPUT_VALUES_FILE")]
    pub values_file: Option<String>,

    /// Defaults to the target owner
    #[arg(long, env = "INPUT_COMMITTER_NAME")]
    pub committer_name: Option<String>,

    /// Direct commits use the token's identity when unset
    #[arg(long, env = "INPUT_COMMITTER_EMAIL")]
    pub committer_email: Option<String>,

    /// File that receives KEY=value step outputs
    #[arg(long, env = "INPUT_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Resolve and edit, but write nothing
    #[arg(
        long,
        env = "INPUT_DRY_RUN",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub dry_run: bool,
}

/// Chart lookup settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSettings {
    pub index_url: String,
    pub name: String,
    /// Chart version currently deployed
    pub baseline_version: String,
}

/// Everything one run needs, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdaterConfig {
    pub api_url: String,
    pub token: String,
    /// User name sent with basic-auth release lookups
    pub auth_user: String,
    /// Upstream repository whose releases are tracked
    pub source: Repository,
    pub chart: ChartSettings,
    pub reconcile: ReconcileSettings,
    pub targets: TargetSettings,
    pub committer: Option<Committer>,
    pub output_file: Option<PathBuf>,
    pub dry_run: bool,
}

/// GitHub Actions passes unset inputs as empty strings
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CliArgs {
    pub fn into_config(self) -> UpdaterConfig {
        let chart_type =
            non_empty(self.chart_type).unwrap_or_else(|| DEFAULT_CHART_TYPE.to_string());
        let argocd_app_dir = non_empty(self.argocd_app_dir)
            .unwrap_or_else(|| format!("deploy/argocd/bootstrap-{}-apps/templates", chart_type));
        let values_file =
            non_empty(self.values_file).unwrap_or_else(|| format!("values-{}.yaml", chart_type));
        let target_owner =
            non_empty(self.target_owner).unwrap_or_else(|| self.github_user.clone());
        let committer = non_empty(self.committer_email).map(|email| Committer {
            name: non_empty(self.committer_name).unwrap_or_else(|| target_owner.clone()),
            email,
        });

        UpdaterConfig {
            api_url: self.github_api_url,
            token: self.github_token,
            auth_user: target_owner.clone(),
            source: Repository::new(self.github_user, self.github_repo),
            chart: ChartSettings {
                index_url: self.chart_index_url,
                name: self.chart_name.clone(),
                baseline_version: self.chart_version,
            },
            reconcile: ReconcileSettings {
                decoration: TagDecoration {
                    remove: self.release_remove_string.unwrap_or_default(),
                    prefix: self.docker_tag_prefix.unwrap_or_default(),
                    suffix: self.docker_tag_suffix.unwrap_or_default(),
                },
                self_managed_image: self.self_managed_image,
                self_managed_chart: self.self_managed_chart,
            },
            targets: TargetSettings {
                owner: target_owner,
                homelab_repo: self.homelab_repo,
                values_repo: self.values_repo,
                helm_charts_repo: self.helm_charts_repo,
                image_repo_prefix: self.image_repo_prefix,
                branch: self.target_branch,
                argocd_app_dir,
                values_file,
                values_chart_name: self.values_chart_name,
                chart_name: non_empty(self.remote_chart_name).unwrap_or(self.chart_name),
            },
            committer,
            output_file: self.output_file,
            dry_run: self.dry_run,
        }
    }
}
