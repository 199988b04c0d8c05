//! Error types for the gateway binary.
//!
//! [`GatewayError`] wraps every failure mode during startup and serving
//! so that `main` can propagate with `?`.

/// Top-level error for the gateway binary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: astryx_observer::ServerError,
    },

    /// The snapshot log exists but could not be replayed.
    #[error("replay error: {source}")]
    Replay {
        /// The underlying replay error.
        #[from]
        source: astryx_observer::replay::ReplayError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the subscriber failure.
        message: String,
    },
}
