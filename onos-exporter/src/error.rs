//! Error types for the exporter.

use thiserror::Error;

/// Result type alias using [`ExporterError`].
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Errors raised while collecting and rendering KPIs.
///
/// Everything except [`ExporterError::Decode`] aborts the collector that
/// raised it for the current cycle. Decode errors are contained inside the
/// topology aspect decoder.
#[derive(Error, Debug)]
pub enum ExporterError {
    /// Missing or invalid collector target, detected before any I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Transport or TLS failure while dialing a backend.
    #[error("Connection error: {0}")]
    Connection(String),

    /// An RPC or HTTP call returned a failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A pprof payload could not be parsed or reported on.
    #[error("Profile error: {0}")]
    Profile(String),

    /// A nested aspect payload is malformed.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Label values do not match the declared label schema.
    #[error("Render error: {metric} declares {expected} labels but a row has {actual} values")]
    Render {
        metric: String,
        expected: usize,
        actual: usize,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExporterError {
    /// Create a configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a profile error.
    pub fn profile(msg: impl Into<String>) -> Self {
        Self::Profile(msg.into())
    }
}

impl From<tonic::Status> for ExporterError {
    fn from(status: tonic::Status) -> Self {
        Self::Backend(format!("{:?}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for ExporterError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<reqwest::Error> for ExporterError {
    fn from(err: reqwest::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<prost::DecodeError> for ExporterError {
    fn from(err: prost::DecodeError) -> Self {
        Self::Profile(format!("malformed profile payload: {}", err))
    }
}

impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_backend() {
        let err: ExporterError = tonic::Status::unavailable("topo is down").into();
        assert!(matches!(err, ExporterError::Backend(_)));
        assert!(err.to_string().contains("topo is down"));
    }

    #[test]
    fn test_render_error_message() {
        let err = ExporterError::Render {
            metric: "onos_profile_heap".to_string(),
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "Render error: onos_profile_heap declares 3 labels but a row has 2 values"
        );
    }
}
