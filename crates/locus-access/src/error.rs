//! Location access error types.
//!
//! This module defines the errors that can occur while loading the location
//! directory, talking to the cache store, or starting the subsystem up.
//! Authorization checks never produce errors: a grant that cannot be decoded
//! is treated as "no grants".

use std::fmt;

/// Errors that can occur during location directory and cache operations.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// Required configuration is missing or invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The directory backend could not be reached or answered with a failure.
    #[error("Directory backend unavailable: {backend} - {message}")]
    BackendUnavailable {
        /// The backend name (e.g. "rest", "identity_admin").
        backend: String,
        /// Description of the failure.
        message: String,
    },

    /// A backend record could not be converted into a location.
    #[error("Malformed directory record '{record}': {message}")]
    MalformedRecord {
        /// Identifier of the offending record as reported by the backend.
        record: String,
        /// Description of what failed to parse.
        message: String,
    },

    /// The grant claim is present but cannot be decoded.
    #[error("Malformed grant claim: {message}")]
    MalformedClaim {
        /// Description of the decoding failure.
        message: String,
    },

    /// The cache store failed a read, write or delete.
    #[error("Cache store error: {message}")]
    Cache {
        /// Description of the store error.
        message: String,
    },
}

impl LocationError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `BackendUnavailable` error.
    #[must_use]
    pub fn backend_unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackendUnavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    /// Creates a new `MalformedRecord` error.
    #[must_use]
    pub fn malformed_record(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedRecord {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Creates a new `MalformedClaim` error.
    #[must_use]
    pub fn malformed_claim(message: impl Into<String>) -> Self {
        Self::MalformedClaim {
            message: message.into(),
        }
    }

    /// Creates a new `Cache` error.
    #[must_use]
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Returns `true` if the provider recovers from this error locally.
    ///
    /// Recoverable errors degrade to an empty directory (backend) or to
    /// "no grants" (claim) instead of reaching the caller.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::MalformedClaim { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::BackendUnavailable { .. } => ErrorCategory::Backend,
            Self::MalformedRecord { .. } => ErrorCategory::DataIntegrity,
            Self::MalformedClaim { .. } => ErrorCategory::Token,
            Self::Cache { .. } => ErrorCategory::Infrastructure,
        }
    }
}

impl From<deadpool_redis::PoolError> for LocationError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Self::cache(format!("failed to get Redis connection: {e}"))
    }
}

impl From<redis::RedisError> for LocationError {
    fn from(e: redis::RedisError) -> Self {
        Self::cache(e.to_string())
    }
}

/// Categories of location access errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Startup configuration errors.
    Configuration,
    /// Directory backend availability errors.
    Backend,
    /// Corrupt upstream records.
    DataIntegrity,
    /// Token claim errors.
    Token,
    /// Cache store errors.
    Infrastructure,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Backend => write!(f, "backend"),
            Self::DataIntegrity => write!(f, "data_integrity"),
            Self::Token => write!(f, "token"),
            Self::Infrastructure => write!(f, "infrastructure"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LocationError::configuration("admin_base_url is required");
        assert_eq!(
            err.to_string(),
            "Configuration error: admin_base_url is required"
        );

        let err = LocationError::backend_unavailable("rest", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Directory backend unavailable: rest - HTTP 500"
        );

        let err = LocationError::malformed_record("north-1", "invalid location id");
        assert_eq!(
            err.to_string(),
            "Malformed directory record 'north-1': invalid location id"
        );
    }

    #[test]
    fn test_recoverable() {
        assert!(LocationError::backend_unavailable("rest", "timeout").is_recoverable());
        assert!(LocationError::malformed_claim("bad base64").is_recoverable());
        assert!(!LocationError::malformed_record("x", "y").is_recoverable());
        assert!(!LocationError::cache("connection reset").is_recoverable());
        assert!(!LocationError::configuration("missing").is_recoverable());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            LocationError::configuration("test").category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            LocationError::malformed_record("1", "test").category(),
            ErrorCategory::DataIntegrity
        );
        assert_eq!(
            LocationError::cache("test").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::DataIntegrity.to_string(), "data_integrity");
    }
}
