use std::{fmt, marker::PhantomData, str::FromStr};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{DeserializeOwned, MapAccess, Visitor, value::MapAccessDeserializer},
};

use crate::error::CoordinatesError;

/// A latitude/longitude pair in decimal degrees.
///
/// No range validation is applied; the provider decides what it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Formats as `<lat>,<lon>`, the form used in the request path.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinates {
    type Err = CoordinatesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| CoordinatesError(format!("expected `<lat>,<lon>`, got '{s}'")))?;

        let latitude = lat
            .trim()
            .parse::<f64>()
            .map_err(|e| CoordinatesError(format!("invalid latitude '{}': {e}", lat.trim())))?;
        let longitude = lon
            .trim()
            .parse::<f64>()
            .map_err(|e| CoordinatesError(format!("invalid longitude '{}': {e}", lon.trim())))?;

        Ok(Self { latitude, longitude })
    }
}

/// Point-in-time conditions at the requested location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub time: i64,
    pub summary: String,
    pub icon: String,
    pub precip_intensity: f64,
    pub precip_probability: f64,
    #[serde(default, deserialize_with = "optional", skip_serializing_if = "Option::is_none")]
    pub precip_type: Option<String>,
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub dew_point: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub wind_bearing: u32,
    pub cloud_cover: f64,
    pub uv_index: u32,
    pub visibility: f64,
    pub ozone: f64,
}

/// One hour of the hourly series. Same shape as [`CurrentConditions`].
pub type HourlyEntry = CurrentConditions;

/// One day of the daily series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyEntry {
    pub time: i64,
    pub summary: String,
    pub icon: String,
    pub sunrise_time: i64,
    pub sunset_time: i64,
    pub moon_phase: f64,
    pub precip_intensity: f64,
    pub precip_intensity_max: f64,
    pub precip_probability: f64,
    #[serde(default, deserialize_with = "optional", skip_serializing_if = "Option::is_none")]
    pub precip_type: Option<String>,
    #[serde(default, deserialize_with = "optional", skip_serializing_if = "Option::is_none")]
    pub precip_accumulation: Option<f64>,
    pub temperature_high: f64,
    pub temperature_high_time: i64,
    pub temperature_low: f64,
    pub temperature_low_time: i64,
    pub apparent_temperature_high: f64,
    pub apparent_temperature_high_time: i64,
    pub apparent_temperature_low: f64,
    pub apparent_temperature_low_time: i64,
    pub dew_point: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub wind_gust_time: i64,
    pub wind_bearing: u32,
    pub cloud_cover: f64,
    pub uv_index: u32,
    pub uv_index_time: i64,
    pub visibility: f64,
    pub ozone: f64,
    pub temperature_min: f64,
    pub temperature_min_time: i64,
    pub temperature_max: f64,
    pub temperature_max_time: i64,
    pub apparent_temperature_min: f64,
    pub apparent_temperature_min_time: i64,
    pub apparent_temperature_max: f64,
    pub apparent_temperature_max_time: i64,
}

/// A summarized, chronologically ordered run of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ForecastSeries<T> {
    pub summary: String,
    pub icon: String,
    #[serde(deserialize_with = "objects")]
    pub data: Vec<T>,
}

impl<T> ForecastSeries<T> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }
}

/// A complete forecast for one location, as returned by one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireForecast", into = "WireForecast")]
pub struct ForecastResponse {
    pub coordinates: Coordinates,
    pub timezone: String,
    pub currently: CurrentConditions,
    pub hourly: ForecastSeries<HourlyEntry>,
    pub daily: ForecastSeries<DailyEntry>,
    /// UTC offset of `timezone`, in hours.
    pub offset: f64,
}

impl ForecastResponse {
    /// The location's UTC offset as a chrono offset, if representable.
    pub fn utc_offset(&self) -> Option<FixedOffset> {
        let secs = (self.offset * 3600.0).round();
        if !secs.is_finite() {
            return None;
        }
        FixedOffset::east_opt(secs as i32)
    }
}

/// Convert provider epoch seconds to a UTC datetime.
pub fn timestamp_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

// Provider shape: coordinates are top-level `latitude` / `longitude`.
#[derive(Serialize, Deserialize)]
#[serde(rename = "ForecastResponse")]
struct WireForecast {
    latitude: f64,
    longitude: f64,
    timezone: String,
    #[serde(deserialize_with = "object")]
    currently: CurrentConditions,
    #[serde(deserialize_with = "object")]
    hourly: ForecastSeries<HourlyEntry>,
    #[serde(deserialize_with = "object")]
    daily: ForecastSeries<DailyEntry>,
    offset: f64,
}

impl From<WireForecast> for ForecastResponse {
    fn from(w: WireForecast) -> Self {
        Self {
            coordinates: Coordinates::new(w.latitude, w.longitude),
            timezone: w.timezone,
            currently: w.currently,
            hourly: w.hourly,
            daily: w.daily,
            offset: w.offset,
        }
    }
}

impl From<ForecastResponse> for WireForecast {
    fn from(r: ForecastResponse) -> Self {
        Self {
            latitude: r.coordinates.latitude,
            longitude: r.coordinates.longitude,
            timezone: r.timezone,
            currently: r.currently,
            hourly: r.hourly,
            daily: r.daily,
            offset: r.offset,
        }
    }
}

/// Decodes `T` from a JSON object only.
///
/// Derived struct impls also accept a positional array; provider records are
/// keyed, so an array in a record position is a schema mismatch.
pub(crate) struct Keyed<T>(pub T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Keyed<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for KeyedVisitor<T> {
            type Value = T;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<T, A::Error> {
                T::deserialize(MapAccessDeserializer::new(map))
            }
        }

        deserializer.deserialize_map(KeyedVisitor(PhantomData)).map(Keyed)
    }
}

fn object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Keyed::deserialize(deserializer).map(|Keyed(v)| v)
}

fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let entries: Vec<Keyed<T>> = Vec::deserialize(deserializer)?;
    Ok(entries.into_iter().map(|Keyed(v)| v).collect())
}

/// Optional provider fields: a value of the wrong type (or `null`) reads as absent.
fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }

    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            tracing::debug!("ignoring malformed optional field: {e}");
            Ok(None)
        }
    }
}
