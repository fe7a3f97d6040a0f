use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Local, Timelike, Utc};
use color_eyre::Section;
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde_json::json;
use tracing::{Event, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{
        FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter,
        format::{JsonFields, Writer},
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const LOG_FILE_PREFIX: &str = "homework_bot";

/// Span fields copied to the top level of every JSON log line.
const CYCLE_FIELDS: [&str; 2] = ["cycle", "from_date"];

/// Installs the global subscriber: compact stdout plus hourly JSON files in
/// `log_dir`. Keep the returned guard alive or buffered lines are lost.
pub fn init(log_dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let file_appender = LocalTimeFileAppender::new(log_dir, LOG_FILE_PREFIX)
        .wrap_err("Failed to create log file appender")
        .with_suggestion(|| "Make sure LOG_DIR points to a writable directory")?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    build_subscriber(non_blocking, io::stdout)?
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// JSON lines to `file_writer`, compact colored text to `stdout_writer`.
///
/// The JSON layer formats span fields with [`JsonFields`] and no ANSI, so its
/// cached span fields never mix with the colored ones of the stdout layer.
fn build_subscriber<F, O>(
    file_writer: F,
    stdout_writer: O,
) -> Result<impl Subscriber + Send + Sync + 'static>
where
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    O: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = EnvFilter::from_default_env().add_directive(
        "homework_bot=info"
            .parse()
            .wrap_err("Failed to parse log filter directive")?,
    );

    Ok(tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .fmt_fields(JsonFields::new())
                .event_format(JsonLineFormatter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(stdout_writer)
                .with_ansi(true)
                .compact(),
        )
        .with(filter))
}

/// One JSON object per event, with the poll cycle's span fields lifted out.
pub struct JsonLineFormatter;

impl<S, N> FormatEvent<S, N> for JsonLineFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();

        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let mut log_entry = json!({
            "timestamp": Local::now().to_rfc3339(),
            "timestamp_utc": Utc::now().to_rfc3339(),
            "level": metadata.level().to_string(),
            "target": metadata.target(),
            "module": metadata.module_path(),
            "file": metadata.file(),
            "line": metadata.line(),
            "fields": visitor.fields,
        });

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                let Some(fields) = extensions.get::<FormattedFields<N>>() else {
                    continue;
                };
                let Ok(serde_json::Value::Object(span_fields)) =
                    serde_json::from_str::<serde_json::Value>(fields.as_str())
                else {
                    continue;
                };
                for key in CYCLE_FIELDS {
                    if let Some(value) = span_fields.get(key) {
                        log_entry[key] = value.clone();
                    }
                }
            }
        }

        writeln!(writer, "{log_entry}")
    }
}

#[derive(Default)]
struct JsonVisitor {
    fields: serde_json::Map<String, serde_json::Value>,
}

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        self.fields
            .insert(field.name().to_string(), json!(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.fields.insert(field.name().to_string(), json!(value));
    }
}

/// Appends to `<dir>/<prefix>.YYYY-MM-DD-HH.log`, switching files when the
/// local hour changes.
pub struct LocalTimeFileAppender {
    directory: PathBuf,
    file_name_prefix: String,
    current_file: Option<File>,
    current_hour: Option<u32>,
}

impl LocalTimeFileAppender {
    pub fn new(directory: impl AsRef<Path>, file_name_prefix: &str) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory)
            .wrap_err_with(|| format!("Failed to create logs directory {}", directory.display()))?;

        Ok(Self {
            directory,
            file_name_prefix: file_name_prefix.to_string(),
            current_file: None,
            current_hour: None,
        })
    }

    fn current_path(&self) -> PathBuf {
        let file_name = format!(
            "{}.{}.log",
            self.file_name_prefix,
            Local::now().format("%Y-%m-%d-%H")
        );
        self.directory.join(file_name)
    }

    fn ensure_current_file(&mut self) -> Result<&mut File> {
        let hour = Local::now().hour();

        if self.current_hour != Some(hour) || self.current_file.is_none() {
            let path = self.current_path();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .wrap_err_with(|| format!("Failed to open log file: {}", path.display()))?;

            self.current_file = Some(file);
            self.current_hour = Some(hour);
        }

        self.current_file
            .as_mut()
            .ok_or_else(|| eyre!("log file is not open"))
    }
}

impl io::Write for LocalTimeFileAppender {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let file = self.ensure_current_file().map_err(io::Error::other)?;
        file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.current_file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}
