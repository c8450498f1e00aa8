//! Error types for the dyndns system
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

use crate::traits::IpVersion;

/// Result type alias for dyndns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Why a provider call failed
///
/// Every provider failure is surfaced as [`Error::Provider`]; the kind
/// distinguishes the cause so the reconciler can log it meaningfully.
/// None of these are retried by the provider itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// Credentials were rejected (HTTP 401/403)
    Authentication,
    /// The request never produced a response (connect, timeout, TLS)
    Transport,
    /// The response body could not be decoded
    Decode,
    /// The provider answered with a non-success status
    Api {
        /// HTTP status code
        status: u16,
    },
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::Authentication => f.write_str("authentication"),
            ProviderErrorKind::Transport => f.write_str("transport"),
            ProviderErrorKind::Decode => f.write_str("decode"),
            ProviderErrorKind::Api { status } => write!(f, "api status {}", status),
        }
    }
}

/// Core error type for the dyndns system
#[derive(Error, Debug)]
pub enum Error {
    /// No mirror yielded a usable address for the given family
    #[error("Could not resolve external {version} address: {message}")]
    Resolution {
        /// Address family that failed
        version: IpVersion,
        /// Last failure observed
        message: String,
    },

    /// A provider call failed
    #[error("Provider error ({provider}, {kind}): {message}")]
    Provider {
        /// Provider name
        provider: &'static str,
        /// Failure class
        kind: ProviderErrorKind,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a resolution error for an address family
    pub fn resolution(version: IpVersion, message: impl Into<String>) -> Self {
        Self::Resolution {
            version,
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(
        provider: &'static str,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider,
            kind,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The provider failure class, if this is a provider error
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Error::Provider { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
