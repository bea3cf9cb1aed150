//! Error types for the delivery pipeline.
//!
//! All per-payload and per-connection failures are absorbed locally by the
//! component that observed them; the only errors a caller of the public API
//! has to handle are startup failures of a frame source and configuration
//! mistakes. The variants below exist so that the absorbing code can branch
//! on what actually went wrong instead of catching opaque failures.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T, E = LinkError> = std::result::Result<T, E>;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LinkError {
    /// The capture device could not be opened. Fatal at startup.
    #[error("Failed to open frame source: {reason}")]
    SourceOpen {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The capture device faulted while running.
    #[error("Frame source error: {reason}")]
    Source { reason: String },

    /// A frame could not be encoded for one stream. The payload is skipped.
    #[error("Encoding failed for stream '{stream}': {details}")]
    Encode { stream: String, details: String },

    /// A connection could not be opened.
    #[error("Failed to connect to {endpoint}: {reason}")]
    Connect {
        endpoint: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An established connection failed mid send or receive.
    #[error("Transport error: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An operation exceeded its deadline.
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Invalid configuration detected before the pipeline started.
    #[error("Configuration error: {details}")]
    Config { details: String },
}

impl LinkError {
    /// Returns whether this error is expected to clear up on retry.
    ///
    /// Retryable errors are handled by the owning channel's reconnect policy
    /// or by the ingestion loop's next cycle; non-retryable errors terminate
    /// startup.
    pub fn is_retryable(&self) -> bool {
        match self {
            LinkError::Source { .. } => true,
            LinkError::Encode { .. } => true,
            LinkError::Connect { .. } => true,
            LinkError::Transport { .. } => true,
            LinkError::Timeout { .. } => true,
            LinkError::SourceOpen { .. } => false,
            LinkError::Config { .. } => false,
        }
    }

    /// Helper constructor for fatal source open failures.
    pub fn source_open(reason: impl Into<String>) -> Self {
        LinkError::SourceOpen { reason: reason.into(), source: None }
    }

    /// Helper constructor for fatal source open failures with a cause.
    pub fn source_open_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::SourceOpen { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for transient source faults.
    pub fn source_fault(reason: impl Into<String>) -> Self {
        LinkError::Source { reason: reason.into() }
    }

    /// Helper constructor for per-stream encode failures.
    pub fn encode_failed(stream: impl Into<String>, details: impl ToString) -> Self {
        LinkError::Encode { stream: stream.into(), details: details.to_string() }
    }

    /// Helper constructor for connection open failures.
    pub fn connect_failed(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        LinkError::Connect { endpoint: endpoint.into(), reason: reason.into(), source: None }
    }

    /// Helper constructor for connection open failures with a cause.
    pub fn connect_failed_with_source(
        endpoint: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::Connect {
            endpoint: endpoint.into(),
            reason: source.to_string(),
            source: Some(source),
        }
    }

    /// Helper constructor for send/receive failures on a live connection.
    pub fn transport(reason: impl Into<String>) -> Self {
        LinkError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with a cause.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        LinkError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn config(details: impl Into<String>) -> Self {
        LinkError::Config { details: details.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<LinkError>();

        let error = LinkError::connect_failed("ws://example", "refused");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retryable_classification() {
        assert!(LinkError::connect_failed("ws://example", "refused").is_retryable());
        assert!(LinkError::transport("reset").is_retryable());
        assert!(LinkError::encode_failed("A", "bad buffer").is_retryable());
        assert!(LinkError::Timeout { duration: Duration::from_secs(10) }.is_retryable());
        assert!(!LinkError::source_open("no such device").is_retryable());
        assert!(!LinkError::config("empty token").is_retryable());
    }

    #[test]
    fn source_chain_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = LinkError::connect_failed_with_source("ws://example", Box::new(io));
        let source = std::error::Error::source(&err).expect("missing source");
        assert!(source.to_string().contains("refused"));
    }

    #[test]
    fn messages_carry_context() {
        let err = LinkError::encode_failed("B", "buffer size mismatch");
        let msg = err.to_string();
        assert!(msg.contains("B"));
        assert!(msg.contains("buffer size mismatch"));
    }
}
