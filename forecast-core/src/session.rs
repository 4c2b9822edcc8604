//! Owner of the "current forecast" shown to the user.
//!
//! Each successful refresh replaces the forecast wholesale. A failed refresh
//! leaves the previous forecast in place. Refreshes are serialized: a second
//! call waits for the first to finish, so two completions never race.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::{
    client::ForecastSource,
    error::ForecastError,
    model::{Coordinates, ForecastResponse},
    normalize,
};

#[derive(Debug)]
pub struct ForecastSession<S> {
    source: S,
    refresh_gate: Mutex<()>,
    current: RwLock<Option<Arc<ForecastResponse>>>,
}

impl<S: ForecastSource> ForecastSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            refresh_gate: Mutex::new(()),
            current: RwLock::new(None),
        }
    }

    /// The most recent successfully decoded forecast, if any.
    pub fn current(&self) -> Option<Arc<ForecastResponse>> {
        self.current.read().clone()
    }

    /// Fetch and decode a forecast for `coordinates`, then make it current.
    pub async fn refresh(
        &self,
        coordinates: Coordinates,
    ) -> Result<Arc<ForecastResponse>, ForecastError> {
        let _gate = self.refresh_gate.lock().await;

        let raw = self.source.fetch_forecast(coordinates).await?;
        let forecast = normalize::parse(raw.as_bytes()).map_err(|e| {
            tracing::warn!("discarding undecodable forecast: {e}");
            e
        })?;

        let forecast = Arc::new(forecast);
        *self.current.write() = Some(Arc::clone(&forecast));
        tracing::info!(%coordinates, "forecast updated");

        Ok(forecast)
    }
}
