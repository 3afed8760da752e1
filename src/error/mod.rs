//! Error module for the Ext.Direct provider.
//!
//! This module defines the error taxonomy shared by every layer of the crate
//! (decoding, argument conversion, dispatch, encoding, boundary handlers) and
//! the pluggable log sink the dispatcher reports through.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;
use thiserror::Error;
use tracing_error::SpanTrace;

/// Result type alias used throughout the crate.
pub type DirectResult<T> = Result<T, DirectError>;

/// Core error enum for the Ext.Direct provider.
#[derive(Error, Debug)]
pub enum DirectError {
    /// The transaction body was not valid JSON in any accepted shape.
    #[error("cannot parse transaction body: {0}")]
    Parse(#[source] serde_json::Error),

    /// The form-encoded transaction envelope was missing or malformed.
    #[error("cannot decode form transaction: {0}")]
    FormDecode(String),

    /// The request carried an unsupported content type.
    #[error("invalid content type: {0}")]
    ContentType(String),

    /// A wire value could not be converted to a declared parameter type.
    #[error("cannot convert type {source_type} to type {target_type}")]
    TypeConversion {
        /// JSON type of the wire value.
        source_type: String,
        /// Rust type of the declared parameter.
        target_type: String,
    },

    /// A failure occurred while dispatching a specific action method.
    ///
    /// Wraps both returned errors and recovered panics; `panicked`
    /// distinguishes the two.
    #[error("error serving {action}.{method}(): {source}")]
    ActionMethod {
        /// Registered action name.
        action: String,
        /// Wire method name.
        method: String,
        /// True when the method panicked rather than returning an error.
        panicked: bool,
        /// The underlying failure.
        #[source]
        source: Box<DirectError>,
    },

    /// JSON encoding of a response or descriptor failed.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Free-form error, used for user-method failures and registry misses.
    #[error("{0}")]
    Custom(String),
}

impl DirectError {
    /// Wraps an inner failure as an [`DirectError::ActionMethod`] error for a
    /// specific action method.
    pub fn action_method(
        action: impl Into<String>,
        method: impl Into<String>,
        panicked: bool,
        source: DirectError,
    ) -> Self {
        DirectError::ActionMethod {
            action: action.into(),
            method: method.into(),
            panicked,
            source: Box::new(source),
        }
    }
}

/// Severity levels accepted by the log sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Dispatch narration, enabled by the provider's debug toggle.
    Debug,
    /// Profiling and lifecycle messages.
    Info,
    /// Recoverable anomalies.
    Warn,
    /// Failures.
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Pluggable log sink for dispatch diagnostics.
///
/// The dispatcher calls it with either a single error value (logged at error
/// level with a captured span trace) or a `(level, message, fields)` triple.
/// Implementations must be safe to call from concurrently running tasks.
pub trait LogSink: Send + Sync {
    /// Report a failure.
    fn error(&self, error: &DirectError);

    /// Report a leveled message with structured fields.
    fn message(&self, level: LogLevel, message: &str, fields: &[(&'static str, String)]);
}

/// Log sink that forwards to the `tracing` framework.
///
/// Hosts that run a `tracing` subscriber should install this sink to fold
/// dispatch diagnostics into their own telemetry.
#[derive(Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn error(&self, error: &DirectError) {
        tracing::error!(error = %error, span_trace = %SpanTrace::capture(), "direct dispatch failure");
    }

    fn message(&self, level: LogLevel, message: &str, fields: &[(&'static str, String)]) {
        match level {
            LogLevel::Debug => tracing::debug!(fields = ?fields, "{message}"),
            LogLevel::Info => tracing::info!(fields = ?fields, "{message}"),
            LogLevel::Warn => tracing::warn!(fields = ?fields, "{message}"),
            LogLevel::Error => tracing::error!(fields = ?fields, "{message}"),
        }
    }
}

/// Log sink that writes directly to standard error.
///
/// This is the default sink, so a provider logs somewhere useful even in
/// hosts that never configure logging.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn error(&self, error: &DirectError) {
        eprintln!("extdirect error: {error}");
    }

    fn message(&self, level: LogLevel, message: &str, fields: &[(&'static str, String)]) {
        if fields.is_empty() {
            eprintln!("extdirect {level}: {message}");
        } else {
            eprintln!("extdirect {level}: {message} {fields:?}");
        }
    }
}

static DEFAULT_SINK: Lazy<Arc<dyn LogSink>> = Lazy::new(|| Arc::new(StderrLogSink));

/// Returns the process-wide default log sink.
pub fn default_sink() -> Arc<dyn LogSink> {
    Arc::clone(&DEFAULT_SINK)
}
