//! Logging setup.
//!
//! Installs a global `tracing` subscriber. Without a log path, human-readable
//! records go to stderr. With a log path, the same records are written to
//! that file and, as JSON, to a `.json` sibling for log shipping.
//!
//! Every record carries the application name; JSON records also carry
//! `"logType": "application"`.
//!
//! `RUST_LOG` overrides the configured level when set.

use crate::config::LogConfig;
use crate::error::{AuthError, Result};
use serde_json::{Map, Value};
use std::ffi::OsString;
use std::fmt as stdfmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, Event, Subscriber};
use tracing_subscriber::fmt::format::{Format, Full, Json, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`AuthError::Configuration`] if:
/// - The level is not a valid filter directive
/// - A log file cannot be opened
/// - A global subscriber is already installed
pub fn init_logging(config: &LogConfig) -> Result<()> {
    let filter = build_filter(&config.level, std::env::var("RUST_LOG").ok().as_deref())?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match &config.log_path {
        None => registry
            .with(text_layer(&config.app_name, std::io::stderr, true))
            .try_init(),
        Some(path) => {
            let text = open_log_file(path)?;
            let json = open_log_file(&json_log_path(path))?;
            registry
                .with(text_layer(&config.app_name, Mutex::new(text), false))
                .with(json_layer(&config.app_name, Mutex::new(json)))
                .try_init()
        }
    };
    installed.map_err(|e| AuthError::Configuration(format!("Logging already configured: {e}")))?;

    info!(application = %config.app_name, "Logging configured");
    Ok(())
}

/// Path of the JSON log file that accompanies `path`.
///
/// # Examples
///
/// ```
/// use dmutils_auth::logging::json_log_path;
/// use std::path::Path;
///
/// assert_eq!(json_log_path(Path::new("/var/log/app.log")), Path::new("/var/log/app.log.json"));
/// ```
#[must_use]
pub fn json_log_path(path: &Path) -> PathBuf {
    let mut json: OsString = path.as_os_str().to_owned();
    json.push(".json");
    PathBuf::from(json)
}

fn text_layer<S, W>(app_name: &str, writer: W, ansi: bool) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(ansi)
        .with_writer(writer)
        .event_format(WithApplication::new(app_name, fmt::format()))
}

fn json_layer<S, W>(app_name: &str, writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_writer(writer)
        .event_format(WithApplication::new(app_name, fmt::format().json()))
}

/// Event formatter that stamps the application name on every record.
struct WithApplication<F> {
    inner: F,
    app_name: String,
}

impl<F> WithApplication<F> {
    fn new(app_name: &str, inner: F) -> Self {
        Self {
            inner,
            app_name: app_name.to_string(),
        }
    }
}

impl<S, N, T> FormatEvent<S, N> for WithApplication<Format<Full, T>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'w> FormatFields<'w> + 'static,
    Format<Full, T>: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        write!(writer, "{} ", self.app_name)?;
        self.inner.format_event(ctx, writer, event)
    }
}

impl<S, N, T> FormatEvent<S, N> for WithApplication<Format<Json, T>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'w> FormatFields<'w> + 'static,
    Format<Json, T>: FormatEvent<S, N>,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> stdfmt::Result {
        let mut line = String::new();
        self.inner.format_event(ctx, Writer::new(&mut line), event)?;

        let mut record: Map<String, Value> =
            serde_json::from_str(line.trim_end()).map_err(|_| stdfmt::Error)?;
        record.insert("application".to_string(), Value::from(self.app_name.as_str()));
        record.insert("logType".to_string(), Value::from("application"));

        let stamped = serde_json::to_string(&record).map_err(|_| stdfmt::Error)?;
        writeln!(writer, "{stamped}")
    }
}

fn build_filter(level: &str, env_override: Option<&str>) -> Result<EnvFilter> {
    let directives = env_override.filter(|v| !v.is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives)
        .map_err(|e| AuthError::Configuration(format!("Invalid log level '{directives}': {e}")))
}

fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AuthError::Configuration(format!("Cannot open {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().expect("lock").clone()).expect("utf-8")
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_json_records_carry_application() {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::registry().with(json_layer("buyer-frontend", buffer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user = 42, "first record");
            tracing::warn!("second record");
        });

        let records: Vec<Value> = buffer
            .contents()
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect();
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record["application"], "buyer-frontend");
            assert_eq!(record["logType"], "application");
        }
        assert_eq!(records[0]["fields"]["message"], "first record");
        assert_eq!(records[0]["fields"]["user"], 42);
        assert_eq!(records[1]["level"], "WARN");
    }

    #[test]
    fn test_text_records_carry_application() {
        let buffer = Buffer::default();
        let subscriber =
            tracing_subscriber::registry().with(text_layer("supplier-frontend", buffer.clone(), false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("first record");
            tracing::info!("second record");
        });

        let contents = buffer.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|line| line.starts_with("supplier-frontend ")));
        assert!(lines[1].ends_with("second record"));
    }

    #[test]
    fn test_build_filter_uses_level() {
        let filter = build_filter("debug", None).expect("valid level");

        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn test_build_filter_prefers_env_override() {
        let filter = build_filter("info", Some("dmutils_auth=trace")).expect("valid directive");

        assert_eq!(filter.to_string(), "dmutils_auth=trace");
    }

    #[test]
    fn test_build_filter_ignores_empty_override() {
        let filter = build_filter("warn", Some("")).expect("valid level");

        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_unopenable_log_file() {
        let err = open_log_file(Path::new("/nonexistent-dir/app.log")).unwrap_err();

        assert!(matches!(err, AuthError::Configuration(_)));
    }
}
