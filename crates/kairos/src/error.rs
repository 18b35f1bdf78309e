use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ephemeris::Body;

/// Errors raised by an ephemeris backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Unknown body: {name}")]
    UnknownBody { name: String },
    #[error("{what} = {value} is outside the supported range {supported}")]
    OutOfRange {
        what: String,
        value: f64,
        supported: String,
    },
    #[error("Non-finite longitude for {body} at {instant}")]
    NonFinite { body: String, instant: DateTime<Utc> },
    #[error("Failed to calculate position for {body} at {instant}: {message}")]
    CalculationFailed {
        body: String,
        instant: DateTime<Utc>,
        message: String,
    },
    #[error("Ephemeris files not usable at {path}: {message}")]
    EphemerisFiles { path: String, message: String },
}

impl ProviderError {
    pub fn calculation_failed(body: Body, instant: DateTime<Utc>, message: impl Into<String>) -> Self {
        ProviderError::CalculationFailed {
            body: body.as_str().to_string(),
            instant,
            message: message.into(),
        }
    }
}

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The backend failed; the same request may succeed later.
    Retryable,
    /// The request itself is wrong.
    Client,
}

/// Errors surfaced by the engine entry points.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KairosError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Unknown action profile: {name}")]
    ProfileNotFound { name: String },
    #[error("Invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    #[error("Invalid instant {input:?}: {reason}")]
    InvalidInstant { input: String, reason: String },
    #[error("Invalid search request: {reason}")]
    InvalidSearch { reason: String },
    #[error("Invalid action profile {name}: {reason}")]
    InvalidProfile { name: String, reason: String },
}

impl KairosError {
    pub fn class(&self) -> ErrorClass {
        match self {
            KairosError::Provider(_) => ErrorClass::Retryable,
            _ => ErrorClass::Client,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}

pub type Result<T, E = KairosError> = std::result::Result<T, E>;
