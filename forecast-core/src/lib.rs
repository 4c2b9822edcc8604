//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The typed forecast model (current conditions, hourly and daily series)
//! - The forecast client that fetches raw provider payloads
//! - The normalizer that turns those payloads into the typed model
//! - A session that owns the current forecast across refreshes
//! - Configuration & credentials handling
//!
//! It is used by `forecast-cli`, but can also be reused by other front ends.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod session;

pub use client::{ForecastClient, ForecastSource, RawPayload};
pub use config::{Config, ExcludeOptions};
pub use error::{DecodeError, FetchError, ForecastError, TransportCause};
pub use model::{
    Coordinates, CurrentConditions, DailyEntry, ForecastResponse, ForecastSeries, HourlyEntry,
};
pub use normalize::parse;
pub use session::ForecastSession;
