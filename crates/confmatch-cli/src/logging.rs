use crate::error::{CliError, Result};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

/// Target prefix shared by the library and the binary.
const OWN_TARGET: &str = "confmatch";

const VERBOSITY_LADDER: [LevelFilter; 4] = [
    LevelFilter::WARN,
    LevelFilter::INFO,
    LevelFilter::DEBUG,
    LevelFilter::TRACE,
];

/// Level of confmatch's own events for the given `-v` count.
///
/// `--quiet` wins over any verbosity.
pub fn level_filter(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    let step = usize::from(verbosity).min(VERBOSITY_LADDER.len() - 1);
    VERBOSITY_LADDER[step]
}

/// Console filter. Dependencies never print below warnings.
fn console_targets(own: LevelFilter) -> Targets {
    Targets::new()
        .with_target(OWN_TARGET, own)
        .with_default(own.min(LevelFilter::WARN))
}

/// File filter. The log file keeps at least the info-level run summary.
fn file_targets(own: LevelFilter) -> Targets {
    Targets::new()
        .with_target(OWN_TARGET, own.max(LevelFilter::INFO))
        .with_default(LevelFilter::WARN)
}

fn file_layer<S>(file: File, own: LevelFilter) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_filter(file_targets(own))
}

/// Installs the global subscriber: compact stderr output plus an optional log file.
pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let own = level_filter(verbosity, quiet);

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .with_filter(console_targets(own));

    let file = log_file
        .map(File::create)
        .transpose()
        .map_err(CliError::Io)?
        .map(|file| file_layer(file, own));

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to install logger: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tracing::Level;

    #[test]
    fn quiet_overrides_any_verbosity() {
        assert_eq!(level_filter(0, false), LevelFilter::WARN);
        assert_eq!(level_filter(2, false), LevelFilter::DEBUG);
        assert_eq!(level_filter(u8::MAX, false), LevelFilter::TRACE);
        for verbosity in [0, 1, 3] {
            assert_eq!(level_filter(verbosity, true), LevelFilter::ERROR);
        }
    }

    #[test]
    fn console_keeps_dependencies_at_warnings() {
        let targets = console_targets(level_filter(2, false));
        assert!(targets.would_enable("confmatch::engine::matcher", &Level::DEBUG));
        assert!(!targets.would_enable("confmatch::engine::matcher", &Level::TRACE));
        assert!(targets.would_enable("rayon_core", &Level::WARN));
        assert!(!targets.would_enable("rayon_core", &Level::INFO));

        let quiet = console_targets(level_filter(0, true));
        assert!(!quiet.would_enable("confmatch::workflows::compare", &Level::WARN));
        assert!(!quiet.would_enable("plotters", &Level::WARN));
    }

    #[test]
    fn log_file_keeps_run_summary_when_quiet() {
        let targets = file_targets(level_filter(0, true));
        assert!(targets.would_enable("confmatch::workflows::compare", &Level::INFO));
        assert!(!targets.would_enable("confmatch::engine::matcher", &Level::DEBUG));
        assert!(!targets.would_enable("plotters", &Level::INFO));
    }

    #[test]
    fn log_file_records_fields_and_targets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let layer = file_layer(File::create(&path).unwrap(), LevelFilter::WARN);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(
                target: "confmatch::workflows::compare",
                reports = 4,
                "Reports written."
            );
            tracing::info!(target: "plotters", "axis drawn");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Reports written."));
        assert!(content.contains("reports=4"));
        assert!(content.contains("confmatch::workflows::compare"));
        assert!(!content.contains("axis drawn"));
    }

    #[test]
    fn directory_as_log_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = setup_logging(0, false, Some(dir.path()));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    #[serial]
    fn second_installation_is_rejected() {
        let _ = setup_logging(1, false, None);
        let again = setup_logging(1, false, None);
        assert!(matches!(again, Err(CliError::Other(_))));
    }
}
