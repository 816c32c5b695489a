//! Typed client for the upstream weather API.

pub mod language;
pub mod models;
pub mod service;

pub use service::{ClientError, OwmClient};

use std::time::Duration;

use reqwest::Client;

use crate::model::{CurrentConditions, ForecastSample, LocationSpec, NamedLocation};

const HTTP_TIMEOUT_SECS: u64 = 30;
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 5;
const HTTP_POOL_IDLE_TIMEOUT_SECS: u64 = 90;

/// The three logical queries the dispatcher issues. Implemented by
/// [`OwmClient`]; mockable at this seam for dispatcher tests.
#[async_trait::async_trait]
pub trait WeatherApi: Send + Sync {
    async fn query_current_weather(
        &self,
        location: &LocationSpec,
    ) -> Result<CurrentConditions, ClientError>;

    async fn query_forecast(
        &self,
        location: &LocationSpec,
    ) -> Result<Vec<ForecastSample>, ClientError>;

    /// Zero matches is `Ok` with an empty list; only transport-level
    /// problems are errors.
    async fn search_city(&self, name: &str) -> Result<Vec<NamedLocation>, ClientError>;
}

/// Create the shared HTTP client with connection pooling.
pub fn create_http_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(HTTP_POOL_IDLE_TIMEOUT_SECS))
        .pool_max_idle_per_host(10)
        .build()
        .expect("Failed to create HTTP client")
}
