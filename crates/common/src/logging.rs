//! Sets up the `tracing` subscriber stack, optionally exporting spans over OTLP.
use std::env;

use opentelemetry::{trace::TracerProvider, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Environment variable holding the OTLP collector endpoint.
pub const OTLP_URL_ENVVAR: &str = "SMARTNODE_OTLP_URL";

/// Environment variable holding a service label appended to the whoami string.
pub const SVC_LABEL_ENVVAR: &str = "SMARTNODE_SVC_LABEL";

/// Name under which spans are registered with the tracer provider.
const TRACER_NAME: &str = "smartnode";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The OTLP span exporter could not be built.
    #[error("could not build otlp exporter: {0}")]
    Exporter(#[from] opentelemetry::trace::TraceError),

    /// A global subscriber has already been installed.
    #[error("global subscriber already set: {0}")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Configuration for the logger.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Identifies the process in logs and exported traces.
    whoami: String,

    /// Collector endpoint for exported traces.
    otel_url: Option<String>,
}

impl LoggerConfig {
    /// Creates a config with the given whoami string and no exporter.
    pub const fn new(whoami: String) -> Self {
        Self {
            whoami,
            otel_url: None,
        }
    }

    /// Creates a config whose whoami is `base` suffixed with the service label, if set.
    pub fn with_base_name(base: &str) -> Self {
        Self::new(get_whoami_string(base))
    }

    /// Reads the OTLP endpoint from [`OTLP_URL_ENVVAR`] when present.
    pub fn with_env_otlp_url(mut self) -> Self {
        self.otel_url = get_otlp_url_from_env();
        self
    }

    /// Sets the OTLP endpoint.
    pub fn set_otlp_url(&mut self, url: String) {
        self.otel_url = Some(url);
    }

    /// The whoami string.
    pub fn whoami(&self) -> &str {
        &self.whoami
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::with_base_name("(smartnode)")
    }
}

/// Installs the global subscriber.
///
/// Stdout output is filtered with `RUST_LOG`. Setting `LOG_FILE=1` or `LOG_LINE_NUM=1` adds the
/// source location to each event.
pub fn init(config: LoggerConfig) -> Result<(), LoggingError> {
    let filt = tracing_subscriber::EnvFilter::from_default_env();

    let log_file = env::var("LOG_FILE").is_ok_and(|v| v == "1");
    let log_line_num = env::var("LOG_LINE_NUM").is_ok_and(|v| v == "1");

    let stdout_sub = tracing_subscriber::fmt::layer()
        .compact()
        .event_format(
            tracing_subscriber::fmt::format()
                .with_file(log_file)
                .with_line_number(log_line_num),
        )
        .with_filter(filt);

    match &config.otel_url {
        Some(otel_url) => {
            let resource = Resource::builder()
                .with_attribute(KeyValue::new("service.name", config.whoami.clone()))
                .build();

            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(otel_url)
                .build()?;

            let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                .with_resource(resource)
                .with_batch_exporter(exporter)
                .build();

            let otel_sub =
                tracing_opentelemetry::layer().with_tracer(provider.tracer(TRACER_NAME));

            tracing_subscriber::registry()
                .with(stdout_sub)
                .with(otel_sub)
                .try_init()?;
        }
        None => tracing_subscriber::registry().with(stdout_sub).try_init()?,
    }

    info!(whoami = %config.whoami, "logging started");
    Ok(())
}

/// Installs a stdout-only subscriber for tests, ignoring a subscriber installed by an earlier
/// test in the same process.
pub fn init_for_tests() {
    let _ = init(LoggerConfig::new("(smartnode-test)".to_owned()));
}

/// Gets the OTLP URL from [`OTLP_URL_ENVVAR`].
pub fn get_otlp_url_from_env() -> Option<String> {
    env::var(OTLP_URL_ENVVAR).ok()
}

/// Gets the service label from [`SVC_LABEL_ENVVAR`].
pub fn get_service_label_from_env() -> Option<String> {
    env::var(SVC_LABEL_ENVVAR).ok()
}

/// Computes the whoami string, `base%label` when a service label is configured.
pub fn get_whoami_string(base: &str) -> String {
    match get_service_label_from_env() {
        Some(label) => format!("{base}%{label}"),
        None => base.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whoami_without_label_is_base() {
        if get_service_label_from_env().is_none() {
            assert_eq!(get_whoami_string("(watchtower)"), "(watchtower)");
        }
    }

    #[test]
    fn exporter_failures_convert_into_logging_errors() {
        let err: LoggingError =
            opentelemetry::trace::TraceError::Other("collector unreachable".into()).into();
        assert!(matches!(err, LoggingError::Exporter(_)));
        assert!(err.to_string().starts_with("could not build otlp exporter"));
    }

    #[test]
    fn repeated_test_init_does_not_panic() {
        init_for_tests();
        init_for_tests();
    }
}
