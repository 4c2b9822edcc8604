use std::fmt::Debug;

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::{
    config::{Config, ExcludeOptions},
    error::{FetchError, TransportCause},
    model::Coordinates,
};

pub const DEFAULT_BASE_URL: &str = "https://api.darksky.net";

/// Unparsed response body of a successful forecast request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(Vec<u8>);

impl RawPayload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for RawPayload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// Anything that can produce a raw forecast payload for a location.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch_forecast(&self, coordinates: Coordinates) -> Result<RawPayload, FetchError>;
}

#[derive(Clone)]
pub struct ForecastClient {
    api_key: String,
    base_url: String,
    exclude: ExcludeOptions,
    http: Client,
}

// Keeps the API key out of logs and panics.
impl Debug for ForecastClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastClient")
            .field("base_url", &self.base_url)
            .field("exclude", &self.exclude)
            .finish_non_exhaustive()
    }
}

impl ForecastClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            exclude: ExcludeOptions::default(),
            http: Client::new(),
        }
    }

    /// Build a client from configuration. Fails if no API key is available.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::from_config_with_key(config, config.api_key())
    }

    fn from_config_with_key(config: &Config, api_key: Option<String>) -> anyhow::Result<Self> {
        let api_key = api_key.ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `forecast configure` or set {}.",
                crate::config::API_KEY_ENV
            )
        })?;

        Ok(Self::new(api_key)
            .with_base_url(&config.base_url)
            .with_exclude(config.exclude))
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeOptions) -> Self {
        self.exclude = exclude;
        self
    }

    fn endpoint(&self, coordinates: Coordinates) -> String {
        format!("{}/forecast/{}/{}", self.base_url, self.api_key, coordinates)
    }

    /// Issue one forecast request and return the body unparsed.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, coordinates: Coordinates) -> Result<RawPayload, FetchError> {
        let mut req = self.http.get(self.endpoint(coordinates));
        if let Some(exclude) = self.exclude.query_value() {
            req = req.query(&[("exclude", exclude)]);
        }

        let res = req.send().await.map_err(|e| {
            tracing::warn!("forecast request failed to send: {e}");
            FetchError::from(e.without_url())
        })?;

        let status = res.status();
        let body = res.bytes().await.map_err(|e| {
            tracing::warn!(%status, "failed to read forecast response body: {e}");
            FetchError::from(e.without_url())
        })?;

        if !status.is_success() {
            tracing::warn!(%status, "forecast provider returned an error status");
            return Err(TransportCause::Status {
                status,
                body: truncate_body(&String::from_utf8_lossy(&body)),
            }
            .into());
        }

        let payload = RawPayload(body.to_vec());
        if payload.is_empty() {
            tracing::warn!(%status, "forecast provider returned an empty body");
            return Err(TransportCause::EmptyBody.into());
        }

        tracing::debug!(%status, bytes = payload.len(), "received forecast payload");
        Ok(payload)
    }
}

#[async_trait]
impl ForecastSource for ForecastClient {
    async fn fetch_forecast(&self, coordinates: Coordinates) -> Result<RawPayload, FetchError> {
        ForecastClient::fetch_forecast(self, coordinates).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FIXTURE: &str = include_str!("../tests/fixtures/forecast.json");

    fn sf() -> Coordinates {
        Coordinates::new(37.8267, -122.4233)
    }

    #[test]
    fn endpoint_embeds_key_and_coordinates() {
        let client = ForecastClient::new("KEY".into()).with_base_url("https://example.test/");
        assert_eq!(
            client.endpoint(sf()),
            "https://example.test/forecast/KEY/37.8267,-122.4233"
        );
    }

    #[test]
    fn debug_output_hides_api_key() {
        let client = ForecastClient::new("SECRET".into());
        assert!(!format!("{client:?}").contains("SECRET"));
    }

    #[test]
    fn from_config_errors_when_missing_api_key() {
        let err = ForecastClient::from_config_with_key(&Config::default(), None).unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("No API key configured"));
        assert!(msg.contains("Hint: run `forecast configure`"));
    }

    #[test]
    fn from_config_uses_configured_values() {
        let cfg = Config {
            base_url: "http://localhost:9999/".into(),
            exclude: ExcludeOptions { minutely: false, flags: true },
            ..Config::default()
        };
        let client = ForecastClient::from_config_with_key(&cfg, Some("KEY".into()))
            .expect("key is given");

        assert_eq!(client.api_key, "KEY");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.exclude, cfg.exclude);
    }

    #[test]
    fn raw_payload_reports_size() {
        let payload = RawPayload::from(b"{}".to_vec());
        assert_eq!(payload.len(), 2);
        assert!(!payload.is_empty());
        assert!(RawPayload::from(Vec::new()).is_empty());
    }

    #[test]
    fn truncate_body_limits_length() {
        assert_eq!(truncate_body("short"), "short");
        let long = "x".repeat(500);
        assert_eq!(truncate_body(&long).len(), 203);
    }

    #[tokio::test]
    async fn fetch_returns_raw_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast/KEY/37.8267,-122.4233"))
            .and(query_param("exclude", "minutely,flags"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FIXTURE))
            .expect(1)
            .mount(&server)
            .await;

        let client = ForecastClient::new("KEY".into()).with_base_url(&server.uri());
        let raw = client.fetch_forecast(sf()).await.expect("fetch succeeds");

        assert_eq!(raw.as_bytes(), FIXTURE.as_bytes());
    }

    #[tokio::test]
    async fn fetch_without_exclusions_sends_no_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast/KEY/37.8267,-122.4233"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = ForecastClient::new("KEY".into())
            .with_base_url(&server.uri())
            .with_exclude(ExcludeOptions { minutely: false, flags: false });
        client.fetch_forecast(sf()).await.expect("fetch succeeds");

        let requests = server.received_requests().await.expect("recording enabled");
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.query(), None);
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_string("daily usage limit exceeded"))
            .mount(&server)
            .await;

        let client = ForecastClient::new("KEY".into()).with_base_url(&server.uri());
        let err = client.fetch_forecast(sf()).await.unwrap_err();

        match err {
            FetchError::Transport(TransportCause::Status { status, body }) => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, "daily usage limit exceeded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = ForecastClient::new("KEY".into()).with_base_url(&server.uri());
        let err = client.fetch_forecast(sf()).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(TransportCause::EmptyBody)));
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Nothing listens on the discard port.
        let client = ForecastClient::new("KEY".into()).with_base_url("http://127.0.0.1:9");
        let err = client.fetch_forecast(sf()).await.unwrap_err();

        assert!(matches!(err, FetchError::Transport(TransportCause::Network(_))));
    }
}
