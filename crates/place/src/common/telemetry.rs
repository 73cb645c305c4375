#![expect(clippy::print_stderr, reason = "Tracing not initialized yet")]

//! Tracing setup. Logs go to stderr, or to `PLACE_LOG` when set; stdout
//! carries command output only.

use std::io::IsTerminal;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Keeps the non-blocking file writer alive; drop it last.
#[derive(Debug)]
pub struct TelemetryGuard {
    _guard: Option<WorkerGuard>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

struct Sink {
    writer: BoxMakeWriter,
    guard: Option<WorkerGuard>,
    ansi: bool,
}

impl Sink {
    fn stderr() -> Self {
        Self {
            writer: BoxMakeWriter::new(std::io::stderr),
            guard: None,
            ansi: std::io::stderr().is_terminal(),
        }
    }

    fn file(path: PathBuf) -> Self {
        let opened = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path);
        match opened {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                Self {
                    writer: BoxMakeWriter::new(non_blocking),
                    guard: Some(guard),
                    ansi: false,
                }
            }
            Err(err) => {
                eprintln!("Warning: cannot open log file {}: {err}", path.display());
                Self::stderr()
            }
        }
    }
}

pub fn init_tracing(default_level: &str) -> TelemetryGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let sink = match log_file_from_env() {
        Some(path) => Sink::file(path),
        None => Sink::stderr(),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(sink.writer);
    let subscriber: Box<dyn tracing::Subscriber + Send + Sync> = match log_format_from_env() {
        LogFormat::Json => Box::new(builder.with_ansi(false).json().finish()),
        LogFormat::Text => Box::new(
            builder
                .with_ansi(sink.ansi)
                .with_thread_names(true)
                .finish(),
        ),
    };

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        return TelemetryGuard { _guard: None };
    }
    TelemetryGuard { _guard: sink.guard }
}

fn log_file_from_env() -> Option<PathBuf> {
    std::env::var("PLACE_LOG")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn log_format_from_env() -> LogFormat {
    let value = std::env::var("PLACE_LOG_FORMAT").unwrap_or_default();
    if value.trim().eq_ignore_ascii_case("json") {
        LogFormat::Json
    } else {
        LogFormat::Text
    }
}
