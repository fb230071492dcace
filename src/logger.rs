//! Tracing subscriber setup driven by the [`Logger`](crate::config::Logger)
//! configuration.

use std::sync::OnceLock;

use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{self, Format, LogLevel, LoggerFileAppender, Rotation};
use crate::{Error, Result};

// Dropping the guard stops the background log writer.
static FILE_WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const LOGGED_CRATES: &[&str] = &["owlgraph"];

/// Installs the global subscriber.
///
/// Nothing is installed when both stdout and file output are disabled.
///
/// # Errors
///
/// When the filter or the file appender cannot be built, or a global
/// subscriber is already installed.
pub fn init(config: &config::Logger) -> Result<()> {
    let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();
    if let Some(appender) = config.file_appender.as_ref().filter(|a| a.enable) {
        layers.push(file_layer(appender)?);
    }
    if config.enable {
        layers.push(init_layer(std::io::stdout, config.format, true));
    }
    if layers.is_empty() {
        return Ok(());
    }

    let env_filter = init_env_filter(config.override_filter.as_deref(), config.level)?;
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(Error::wrap)
}

fn file_layer(appender: &LoggerFileAppender) -> Result<Box<dyn Layer<Registry> + Sync + Send>> {
    let rotation = match appender.rotation {
        Rotation::Minutely => rolling::Rotation::MINUTELY,
        Rotation::Hourly => rolling::Rotation::HOURLY,
        Rotation::Daily => rolling::Rotation::DAILY,
        Rotation::Never => rolling::Rotation::NEVER,
    };
    let dir = appender.dir.as_deref().unwrap_or("./logs");
    let writer = rolling::Builder::default()
        .max_log_files(appender.max_log_files)
        .rotation(rotation)
        .filename_prefix(appender.filename_prefix.clone().unwrap_or_default())
        .filename_suffix(appender.filename_suffix.clone().unwrap_or_default())
        .build(dir)
        .map_err(Error::wrap)?;

    if !appender.non_blocking {
        return Ok(init_layer(writer, appender.format, false));
    }
    let (writer, guard) = tracing_appender::non_blocking(writer);
    FILE_WRITER_GUARD
        .set(guard)
        .map_err(|_| Error::Message("log file writer is already running".to_string()))?;
    Ok(init_layer(writer, appender.format, false))
}

fn init_env_filter(override_filter: Option<&str>, level: LogLevel) -> Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            override_filter.map_or_else(
                || EnvFilter::try_new(default_directives(level)),
                EnvFilter::try_new,
            )
        })
        .map_err(Error::wrap)
}

fn default_directives(level: LogLevel) -> String {
    LOGGED_CRATES
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn init_layer<W2>(
    make_writer: W2,
    format: Format,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Sync + Send>
where
    W2: for<'writer> MakeWriter<'writer> + Sync + Send + 'static,
{
    match format {
        Format::Compact => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .compact()
            .boxed(),
        Format::Pretty => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .pretty()
            .boxed(),
        Format::Json => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .json()
            .boxed(),
    }
}
