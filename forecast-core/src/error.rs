//! Error types for the fetch/normalize pipeline.

use thiserror::Error;

/// A failed forecast request. Terminal for that attempt; nothing retries.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("forecast request failed: {0}")]
    Transport(#[source] TransportCause),
}

/// What went wrong on the wire.
#[derive(Debug, Error)]
pub enum TransportCause {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },

    #[error("provider returned an empty body")]
    EmptyBody,
}

impl From<TransportCause> for FetchError {
    fn from(cause: TransportCause) -> Self {
        Self::Transport(cause)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(TransportCause::Network(err))
    }
}

/// A payload that does not match the forecast schema.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("forecast payload is empty")]
    EmptyPayload,

    #[error("forecast payload is not valid JSON: {0}")]
    Syntax(String),

    #[error("missing or invalid field `{path}`: {reason}")]
    MissingOrInvalidField { path: String, reason: String },
}

impl DecodeError {
    /// Dotted path of the offending field, if the failure is field-level.
    pub fn field_path(&self) -> Option<&str> {
        match self {
            Self::MissingOrInvalidField { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Either half of a refresh failing.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ForecastError {
    /// Short message suitable for showing in place of a forecast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Fetch(FetchError::Transport(TransportCause::Network(_))) => {
                "Could not reach the weather provider. Check your connection.".to_string()
            }
            Self::Fetch(FetchError::Transport(TransportCause::Status { status, .. })) => {
                format!("The weather provider rejected the request ({status}).")
            }
            Self::Fetch(FetchError::Transport(TransportCause::EmptyBody)) => {
                "The weather provider sent an empty response.".to_string()
            }
            Self::Decode(e) => format!("The forecast could not be read: {e}"),
        }
    }
}

/// A coordinate string that is not `<lat>,<lon>`.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid coordinates: {0}")]
pub struct CoordinatesError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_path_only_for_field_errors() {
        let err = DecodeError::MissingOrInvalidField {
            path: "currently.temperature".into(),
            reason: "missing field".into(),
        };
        assert_eq!(err.field_path(), Some("currently.temperature"));
        assert_eq!(DecodeError::EmptyPayload.field_path(), None);
    }

    #[test]
    fn user_messages() {
        let err = ForecastError::from(FetchError::from(TransportCause::Status {
            status: reqwest::StatusCode::FORBIDDEN,
            body: "daily usage limit exceeded".into(),
        }));
        assert!(err.user_message().contains("403"));

        let err = ForecastError::from(FetchError::from(TransportCause::EmptyBody));
        assert!(err.user_message().contains("empty"));

        let err = ForecastError::from(DecodeError::EmptyPayload);
        assert!(err.user_message().contains("could not be read"));
    }
}
