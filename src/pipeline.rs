//! One reconciliation run
//!
//! Resolves the upstream app and chart versions, decides against the
//! baseline, and hands every due target to the editor. Target failures are
//! logged and collected; only resolution failures fail the run.

use futures::future::join_all;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::UpdaterConfig;
use crate::output::write_step_outputs;
use crate::reconcile::{Decision, ResolvedVersions, reconcile};
use crate::remote::editor::{RemoteFileEditor, UpdateOutcome};
use crate::remote::error::EditError;
use crate::targets::UpdateTarget;
use crate::version::error::RegistryError;
use crate::version::registry::{ChartSource, ReleaseSource};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to resolve latest chart version: {0}")]
    Chart(#[source] RegistryError),

    #[error("Failed to resolve latest release tag: {0}")]
    Release(#[source] RegistryError),
}

/// Result of one downstream target
#[derive(Debug)]
pub struct TargetReport {
    pub target: UpdateTarget,
    pub result: Result<UpdateOutcome, EditError>,
}

/// Everything a run decided and did
#[derive(Debug)]
pub struct RunReport {
    pub decision: Decision,
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    /// True when a newer chart was found, whether or not every write succeeded
    pub fn update_triggered(&self) -> bool {
        self.decision.chart_update_due
    }

    pub fn failed_targets(&self) -> usize {
        self.targets.iter().filter(|t| t.result.is_err()).count()
    }
}

/// Resolve the latest app tag and stable chart entry concurrently.
///
/// A source repository without releases or tags takes the chart version as its app version.
pub async fn resolve(
    config: &UpdaterConfig,
    releases: &dyn ReleaseSource,
    charts: &dyn ChartSource,
) -> Result<ResolvedVersions, PipelineError> {
    let (tag, chart) = tokio::join!(
        releases.latest_tag(&config.source.owner, &config.source.name),
        charts.latest_stable_version(&config.chart.index_url, &config.chart.name),
    );

    let chart = chart.map_err(PipelineError::Chart)?;
    let app_version = match tag {
        Ok(tag) => tag,
        Err(e) if e.is_not_found() => {
            warn!(
                source = %config.source,
                "no release or tag found, using chart version {} as app version", chart.version
            );
            chart.version.clone()
        }
        Err(e) => return Err(PipelineError::Release(e)),
    };

    Ok(ResolvedVersions { app_version, chart })
}

/// Run every target, logging and collecting each outcome.
pub async fn dispatch(editor: &RemoteFileEditor, targets: Vec<UpdateTarget>) -> Vec<TargetReport> {
    let results = join_all(targets.iter().map(|target| editor.apply(target))).await;

    targets
        .into_iter()
        .zip(results)
        .map(|(target, result)| {
            match &result {
                Ok(outcome) => info!(
                    artifact = %target.artifact,
                    file = %target.location,
                    ?outcome,
                    "target updated"
                ),
                Err(e) => error!(
                    artifact = %target.artifact,
                    file = %target.location,
                    error = %e,
                    "target update failed"
                ),
            }
            TargetReport { target, result }
        })
        .collect()
}

/// Resolve, decide, write step outputs, and update every due target.
pub async fn run(
    config: &UpdaterConfig,
    releases: &dyn ReleaseSource,
    charts: &dyn ChartSource,
    editor: &RemoteFileEditor,
) -> Result<RunReport, PipelineError> {
    let resolved = resolve(config, releases, charts).await?;
    let decision = reconcile(&config.reconcile, &config.chart.baseline_version, &resolved);

    if let Some(path) = &config.output_file
        && let Err(e) = write_step_outputs(path, &decision)
    {
        error!(path = %path.display(), error = %e, "failed to write step outputs");
    }

    if !decision.chart_update_due {
        info!(
            chart = %config.chart.name,
            version = %config.chart.baseline_version,
            "chart is up to date"
        );
        return Ok(RunReport {
            decision,
            targets: Vec::new(),
        });
    }

    info!(
        chart = %config.chart.name,
        from = %config.chart.baseline_version,
        to = %decision.chart_version,
        "new chart version found"
    );

    let targets = decision
        .writers
        .iter()
        .map(|writer| config.targets.target_for(writer))
        .collect();
    let targets = dispatch(editor, targets).await;

    Ok(RunReport { decision, targets })
}
