//! Logging initialization.
//!
//! The interactive UI owns the terminal, so its logs go to a file. The
//! non-interactive export mode logs to stderr.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use anyhow::Result;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

use crate::config::LoggingSettings;

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to `LoggingSettings::file`.
    File,
    /// Write to stderr.
    Stderr,
}

/// Build the filter: `RUST_LOG` wins over the configured level.
fn filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level))
}

/// Initialize the global subscriber.
pub fn init(settings: &LoggingSettings, target: LogTarget) -> Result<()> {
    match target {
        LogTarget::Stderr => install(settings, io::stderr, true),
        LogTarget::File => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&settings.file)?;
            install(settings, Mutex::new(file), false)
        }
    }
}

fn install<W>(settings: &LoggingSettings, writer: W, ansi: bool) -> Result<()>
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::registry()
        .with(fmt_layer(&settings.format, writer, ansi))
        .with(filter(settings))
        .try_init()?;

    Ok(())
}

/// The fmt layer for a `logging.format` value. Unknown values get `pretty`.
fn fmt_layer<W>(format: &str, writer: W, ansi: bool) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    match format {
        "json" => fmt::layer().json().with_writer(writer).boxed(),
        "compact" => fmt::layer()
            .compact()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        "full" => fmt::layer().with_ansi(ansi).with_writer(writer).boxed(),
        _ => fmt::layer()
            .pretty()
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
    }
}
