//! Step outputs for later pipeline steps
//!
//! Lines are appended as `KEY=value`, the format of GitHub's `$GITHUB_OUTPUT` file.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::reconcile::Decision;

/// Output keys and values for `decision`, in write order
pub fn step_outputs(decision: &Decision) -> Vec<(&'static str, String)> {
    vec![
        ("APP_VERSION", decision.app_version.clone()),
        ("CHART_APP_VERSION", decision.chart_app_version.clone()),
        ("CHART_VERSION", decision.chart_version.clone()),
        ("OLD_CHART_VERSION", decision.baseline_chart_version.clone()),
        ("UPDATE_DUE", decision.chart_update_due.to_string()),
    ]
}

/// Append the outputs of `decision` to `path`, creating it if needed.
pub fn write_step_outputs(path: &Path, decision: &Decision) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    for (key, value) in step_outputs(decision) {
        writeln!(file, "{}={}", key, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn decision() -> Decision {
        Decision {
            chart_update_due: true,
            app_update_due: false,
            app_version: "2.9.4".to_string(),
            chart_app_version: "2.9.4".to_string(),
            chart_version: "1.9.0".to_string(),
            baseline_chart_version: "1.8.0".to_string(),
            writers: vec![],
        }
    }

    #[test]
    fn write_step_outputs_appends_key_value_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("outputs");
        std::fs::write(&path, "EXISTING=1\n").unwrap();

        write_step_outputs(&path, &decision()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "EXISTING=1\nAPP_VERSION=2.9.4\nCHART_APP_VERSION=2.9.4\nCHART_VERSION=1.9.0\nOLD_CHART_VERSION=1.8.0\nUPDATE_DUE=true\n"
        );
    }

    #[test]
    fn write_step_outputs_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("new-outputs");

        write_step_outputs(&path, &decision()).unwrap();

        assert!(std::fs::read_to_string(&path).unwrap().starts_with("APP_VERSION="));
    }
}
