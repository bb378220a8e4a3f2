//! Update decision from resolved upstream versions
//!
//! The chart comparison decides whether anything happens at all. The app
//! comparison is evaluated on its own and only gates the self-managed image
//! and chart writers, so the two can disagree (a chart bump without an app
//! bump is common).

use std::cmp::Ordering;

use tracing::{info, warn};

use crate::version::dotted::{compare_versions, extract_version};
use crate::version::registry::ChartRelease;

/// Rewrites applied to upstream tags before they are compared or written
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDecoration {
    /// Literal substring removed everywhere from the tag
    pub remove: String,
    pub prefix: String,
    pub suffix: String,
}

impl TagDecoration {
    /// Remove every occurrence of `remove`, then add prefix and suffix.
    ///
    /// Examples (remove = "-alpine", prefix = "v"):
    /// - "1.2.3-alpine" -> "v1.2.3"
    pub fn apply(&self, version: &str) -> String {
        let stripped = if self.remove.is_empty() {
            version.to_string()
        } else {
            version.replace(&self.remove, "")
        };
        format!("{}{}{}", self.prefix, stripped, self.suffix)
    }
}

/// Settings that shape the decision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub decoration: TagDecoration,
    /// Also bump the `version.yaml` of the self-built container image
    pub self_managed_image: bool,
    /// Also bump the self-maintained chart definition
    pub self_managed_chart: bool,
}

/// Versions found upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    /// Latest source repository tag, `v` already stripped
    pub app_version: String,
    /// Latest stable chart entry
    pub chart: ChartRelease,
}

/// A downstream writer to run, with the version it writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Writer {
    /// `env.version` in the image repository's `version.yaml`
    SelfManagedImage { app_version: String },
    /// `version`/`appVersion` in the self-maintained `Chart.yaml`
    SelfManagedChart {
        version: String,
        app_version: String,
    },
    /// `spec.source.targetRevision` in the ArgoCD application template
    ArgoApplication { version: String },
    /// `<chart>.chartVersion` in the values file
    ValuesFile { version: String },
}

/// Outcome of comparing resolved versions against the baseline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub chart_update_due: bool,
    pub app_update_due: bool,
    /// Decorated source repository tag
    pub app_version: String,
    /// Decorated appVersion of the latest stable chart
    pub chart_app_version: String,
    pub chart_version: String,
    pub baseline_chart_version: String,
    pub writers: Vec<Writer>,
}

/// Decide which downstream writers run for `resolved` given the stored baseline.
pub fn reconcile(
    settings: &ReconcileSettings,
    baseline_chart_version: &str,
    resolved: &ResolvedVersions,
) -> Decision {
    let app_version = settings.decoration.apply(&resolved.app_version);
    let chart_app_version = settings.decoration.apply(&resolved.chart.app_version);
    let chart_version = resolved.chart.version.clone();

    let chart_update_due = compare_versions(baseline_chart_version, &chart_version) == Ordering::Less;
    let app_update_due = compare_versions(&chart_app_version, &app_version) == Ordering::Less;

    info!(
        app_version = %app_version,
        chart_app_version = %chart_app_version,
        chart_version = %chart_version,
        baseline_chart_version,
        chart_update_due,
        app_update_due,
        "compared upstream versions"
    );

    let mut writers = Vec::new();
    if chart_update_due {
        if app_update_due {
            if settings.self_managed_image {
                writers.push(Writer::SelfManagedImage {
                    app_version: app_version.clone(),
                });
            }
            if settings.self_managed_chart {
                match extract_version(&app_version) {
                    Some(version) => writers.push(Writer::SelfManagedChart {
                        version,
                        app_version: app_version.clone(),
                    }),
                    None => warn!(
                        app_version = %app_version,
                        "no numeric version in app tag, skipping self-managed chart"
                    ),
                }
            }
        }

        match extract_version(&chart_version) {
            Some(version) => {
                writers.push(Writer::ArgoApplication {
                    version: version.clone(),
                });
                writers.push(Writer::ValuesFile { version });
            }
            None => warn!(
                chart_version = %chart_version,
                "no numeric version in chart version, skipping chart references"
            ),
        }
    }

    Decision {
        chart_update_due,
        app_update_due,
        app_version,
        chart_app_version,
        chart_version,
        baseline_chart_version: baseline_chart_version.to_string(),
        writers,
    }
}
