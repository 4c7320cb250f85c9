use anyhow::{anyhow, Result};
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

/// Default directives for a verbosity level. `RUST_LOG` overrides all but quiet.
fn default_directives(verbose_level: u8) -> &'static str {
    match verbose_level {
        0 => "info",
        // -v: debug, minus HTTP connection chatter
        1 => "debug,hyper::proto::h1=warn,hyper::client::pool=warn,reqwest::connect=warn",
        _ => "trace",
    }
}

fn build_filter(verbose_level: u8, quiet: bool) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose_level)))
}

fn wants_json() -> bool {
    std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| !io::stdout().is_terminal())
}

/// Daily rotating appender: `cinemablend.log` rotates to `cinemablend.2026-01-17`.
fn file_writer(log_path: &Path) -> Result<BoxMakeWriter> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow!("Log file path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(log_filename);

    Ok(BoxMakeWriter::new(RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix)))
}

/// Install the global subscriber. Logs go to stderr (or `log_file`) so stdout
/// only carries command output.
pub fn init_logging(verbose_level: u8, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = build_filter(verbose_level, quiet);
    let (writer, to_file) = match log_file {
        Some(path) => (file_writer(path)?, true),
        None => (BoxMakeWriter::new(io::stderr), false),
    };

    let layer: Box<dyn Layer<Registry> + Send + Sync> = if wants_json() {
        fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(writer)
            .boxed()
    } else {
        fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_ansi(!to_file && io::stderr().is_terminal())
            .with_writer(writer)
            .boxed()
    };

    Registry::default()
        .with(layer)
        .with(filter)
        .try_init()
        .map_err(|e| anyhow!("Failed to install logger: {}", e))
}
