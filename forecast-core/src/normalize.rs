//! Provider JSON -> [`ForecastResponse`].
//!
//! Values pass through exactly as received: no unit conversion, no clamping,
//! no defaults for required fields. A payload either decodes completely or
//! not at all.

use serde_json::error::Category;

use crate::{
    error::DecodeError,
    model::{ForecastResponse, Keyed},
};

/// Decode a raw provider payload.
pub fn parse(raw: &[u8]) -> Result<ForecastResponse, DecodeError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::EmptyPayload);
    }

    let mut de = serde_json::Deserializer::from_slice(raw);
    let Keyed(forecast): Keyed<ForecastResponse> =
        serde_path_to_error::deserialize(&mut de).map_err(classify)?;
    de.end().map_err(|e| DecodeError::Syntax(e.to_string()))?;

    tracing::debug!(
        timezone = %forecast.timezone,
        hourly = forecast.hourly.len(),
        daily = forecast.daily.len(),
        "decoded forecast"
    );

    Ok(forecast)
}

fn classify(err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let path = err.path().to_string();
    let inner = err.into_inner();

    match inner.classify() {
        Category::Io | Category::Syntax | Category::Eof => DecodeError::Syntax(inner.to_string()),
        Category::Data => {
            let reason = strip_position(&inner.to_string());
            let path = match missing_field_name(&reason) {
                // Missing fields are reported against the enclosing object.
                Some(field) if path == "." => field.to_string(),
                Some(field) => format!("{path}.{field}"),
                None => path,
            };
            DecodeError::MissingOrInvalidField { path, reason }
        }
    }
}

/// serde_json phrases these as "missing field `name`".
fn missing_field_name(reason: &str) -> Option<&str> {
    reason
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(field, _)| field)
}

fn strip_position(msg: &str) -> String {
    match msg.rfind(" at line ") {
        Some(idx) => msg[..idx].to_string(),
        None => msg.to_string(),
    }
}
