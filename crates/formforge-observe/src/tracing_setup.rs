//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use formforge_observe::tracing_setup::{filter_for_verbosity, init_tracing};
//!
//! // Structured logging at the default CLI level
//! init_tracing(filter_for_verbosity(0, false), false).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// Map `-v` count and `--quiet` to a filter directive.
pub fn filter_for_verbosity(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,formforge=debug",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber.
///
/// - Always installs a structured `fmt` layer with span close timing.
/// - When `enable_otel` is true, additionally bridges tracing spans to
///   OpenTelemetry using a stdout exporter.
/// - `RUST_LOG` overrides `default_filter` when set.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set or the
/// filter directive does not parse.
pub fn init_tracing(
    default_filter: &str,
    enable_otel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE);

    let env_filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(default_filter)?,
    };

    if enable_otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("formforge");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
    }

    Ok(())
}

/// Flush pending spans and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_for_verbosity() {
        assert_eq!(filter_for_verbosity(0, true), "error");
        assert_eq!(filter_for_verbosity(0, false), "warn");
        assert_eq!(filter_for_verbosity(1, false), "info,formforge=debug");
        assert_eq!(filter_for_verbosity(3, true), "trace");
    }

    #[test]
    fn test_every_verbosity_filter_parses() {
        for v in 0..3 {
            assert!(EnvFilter::try_new(filter_for_verbosity(v, false)).is_ok());
        }
    }

    #[test]
    fn test_shutdown_without_init_is_noop() {
        shutdown_tracing();
    }
}
