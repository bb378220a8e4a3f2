use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use chart_updater::config::{CliArgs, LogFormat};
use chart_updater::pipeline;
use chart_updater::remote::editor::RemoteFileEditor;
use chart_updater::remote::github::GitHubStore;
use chart_updater::version::registries::{ChartIndexRegistry, GitHubReleases};

/// Exit status when a newer chart was found; callers use it as a signal, not a failure
const EXIT_UPDATE_TRIGGERED: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "chart-updater")]
#[command(version, about = "Bump downstream chart references when upstream releases move")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[arg(long, env = "INPUT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Also write logs to this file
    #[arg(long, env = "INPUT_LOG_FILE")]
    log_file: Option<PathBuf>,
}

/// Install the global subscriber; the guard must live until exit to flush the file writer.
fn init_logging(format: LogFormat, log_file: Option<&PathBuf>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = log_file else {
        match format {
            LogFormat::Text => builder.with_writer(std::io::stderr).init(),
            LogFormat::Json => builder.json().with_writer(std::io::stderr).init(),
        }
        return None;
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name().unwrap_or(path.as_os_str());
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));

    match format {
        LogFormat::Text => builder.with_ansi(false).with_writer(writer).init(),
        LogFormat::Json => builder.json().with_writer(writer).init(),
    }
    Some(guard)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_format, cli.log_file.as_ref());
    let config = cli.args.into_config();

    let releases = GitHubReleases::new(&config.api_url, &config.auth_user, &config.token);
    let charts = ChartIndexRegistry::new();
    let store = Arc::new(GitHubStore::new(&config.api_url, &config.token));
    let editor =
        RemoteFileEditor::new(store, config.committer.clone()).with_dry_run(config.dry_run);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(pipeline::run(&config, &releases, &charts, &editor)) {
        Ok(report) if report.update_triggered() => {
            info!(
                targets = report.targets.len(),
                failed = report.failed_targets(),
                "update triggered"
            );
            Ok(ExitCode::from(EXIT_UPDATE_TRIGGERED))
        }
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::from(EXIT_FAILURE))
        }
    }
}
