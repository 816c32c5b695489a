use std::sync::Arc;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::language::resolve_language;
use super::models::{CurrentWeatherResponse, ForecastResponse, LookupCityResponse};
use super::WeatherApi;
use crate::config::{CredentialStore, ProviderConfig};
use crate::forecast::SAMPLES_PER_DAY;
use crate::model::{CurrentConditions, ForecastSample, LocationSpec, NamedLocation, TemperatureUnit};

const WEATHER_PATH: &str = "/data/2.5/weather";
const FORECAST_PATH: &str = "/data/2.5/forecast";
const CITY_SEARCH_PATH: &str = "/data/2.5/find";

/// OpenWeatherMap allows `like` or `accurate`; use `like` so the picker gets
/// more choices.
const SEARCH_CITY_TYPE: &str = "like";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("a valid API key is required to process the request")]
    InvalidCredential,

    #[error("failed to reach OpenWeatherMap: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("location not found")]
    NotFound,

    #[error("unexpected status: {0}")]
    Status(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Typed queries against the OpenWeatherMap 2.5 API. Owns the locale and
/// unit selection; reads the credential from the store on every call so
/// key edits take effect on the next request.
pub struct OwmClient {
    client: Client,
    credentials: Arc<CredentialStore>,
    base_url: String,
    unit: Option<TemperatureUnit>,
    language: String,
    forecast_days: u32,
}

impl OwmClient {
    pub fn new(client: Client, credentials: Arc<CredentialStore>, config: &ProviderConfig) -> Self {
        let unit = TemperatureUnit::parse(&config.units);
        if unit.is_none() {
            tracing::warn!(units = %config.units, "unrecognized unit preference, omitting units parameter");
        }
        let language = resolve_language(config.language.as_deref());
        tracing::debug!(language = %language, "request language selected");

        Self {
            client,
            credentials,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            unit,
            language,
            forecast_days: config.forecast_days,
        }
    }

    /// The configured unit preference, defaulting to metric when the
    /// preference did not parse.
    pub fn unit(&self) -> TemperatureUnit {
        self.unit.unwrap_or_default()
    }

    fn api_key(&self) -> Result<String, ClientError> {
        match self.credentials.api_key() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ClientError::InvalidCredential),
        }
    }

    fn base_query(&self, api_key: String) -> Vec<(&'static str, String)> {
        let mut query = vec![("mode", "json".to_string())];
        if let Some(unit) = self.unit {
            query.push(("units", unit.as_query_param().to_string()));
        }
        query.push(("lang", self.language.clone()));
        query.push(("appid", api_key));
        query
    }

    fn location_query(location: &LocationSpec) -> Vec<(&'static str, String)> {
        match location {
            LocationSpec::Named(named) => vec![("id", named.city_id.clone())],
            LocationSpec::Geo(geo) => vec![
                ("lat", geo.latitude.to_string()),
                ("lon", geo.longitude.to_string()),
            ],
        }
    }

    fn check_status(status: StatusCode) -> Result<(), ClientError> {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::InvalidCredential);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl WeatherApi for OwmClient {
    async fn query_current_weather(
        &self,
        location: &LocationSpec,
    ) -> Result<CurrentConditions, ClientError> {
        let api_key = self.api_key()?;

        let mut query = Self::location_query(location);
        query.extend(self.base_query(api_key));

        tracing::debug!(location = ?location, "fetching current weather");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, WEATHER_PATH))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received current weather response");
        Self::check_status(status)?;

        let body: CurrentWeatherResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        // OpenWeatherMap might return 404 in the body even if we supplied a
        // valid location or the id that we got by looking up a city
        if body.cod == Some(404) {
            return Err(ClientError::NotFound);
        }

        Ok(body.into())
    }

    async fn query_forecast(
        &self,
        location: &LocationSpec,
    ) -> Result<Vec<ForecastSample>, ClientError> {
        let api_key = self.api_key()?;

        let count = self.forecast_days as usize * SAMPLES_PER_DAY;
        let mut query = Self::location_query(location);
        query.push(("cnt", count.to_string()));
        query.extend(self.base_query(api_key));

        tracing::debug!(location = ?location, samples = count, "fetching forecast");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, FORECAST_PATH))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received forecast response");
        Self::check_status(status)?;

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        Ok(body.list.into_iter().map(ForecastSample::from).collect())
    }

    async fn search_city(&self, name: &str) -> Result<Vec<NamedLocation>, ClientError> {
        let api_key = self.api_key()?;

        let mut query = vec![
            ("q", name.to_string()),
            ("type", SEARCH_CITY_TYPE.to_string()),
        ];
        query.extend(self.base_query(api_key));

        tracing::debug!(name = %name, "looking up city");
        let response = self
            .client
            .get(format!("{}{}", self.base_url, CITY_SEARCH_PATH))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = %status, "received city lookup response");
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClientError::InvalidCredential);
        }
        // an unknown name is a valid lookup with no matches, not a failure
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let body: LookupCityResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Malformed(e.to_string()))?;

        Ok(body.list.into_iter().map(NamedLocation::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoCoordinate;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server: &MockServer) -> ProviderConfig {
        ProviderConfig {
            api_key: Some("test-key".to_string()),
            api_base_url: server.uri(),
            units: "metric".to_string(),
            language: Some("en".to_string()),
            forecast_days: 5,
        }
    }

    fn build_client(config: &ProviderConfig) -> OwmClient {
        let credentials = Arc::new(CredentialStore::new(config.api_key.clone()));
        OwmClient::new(Client::new(), credentials, config)
    }

    fn geo() -> LocationSpec {
        LocationSpec::Geo(GeoCoordinate {
            latitude: 51.51,
            longitude: -0.13,
        })
    }

    const CURRENT_BODY: &str = r#"{
        "cod": 200,
        "name": "London",
        "weather": [{"id": 500, "icon": "10d"}],
        "main": {"temp": 18.2, "temp_min": 12.0, "temp_max": 21.3, "humidity": 63},
        "wind": {"speed": 14.0, "deg": 220}
    }"#;

    #[tokio::test]
    async fn test_current_weather_by_coordinate() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("lat", "51.51"))
            .and(query_param("lon", "-0.13"))
            .and(query_param("units", "metric"))
            .and(query_param("lang", "en"))
            .and(query_param("appid", "test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(CURRENT_BODY, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        let conditions = client.query_current_weather(&geo()).await.unwrap();
        assert_eq!(conditions.city_name.as_deref(), Some("London"));
        assert_eq!(conditions.temperature, Some(18.2));
    }

    #[tokio::test]
    async fn test_current_weather_by_city_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("id", "2643743"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(CURRENT_BODY, "application/json"),
            )
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        let location = LocationSpec::Named(NamedLocation::new("2643743", "London"));
        let conditions = client.query_current_weather(&location).await.unwrap();
        assert_eq!(conditions.condition_id, Some(500));
    }

    #[tokio::test]
    async fn test_missing_key_short_circuits_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.api_key = None;
        let client = build_client(&config);

        assert!(matches!(
            client.query_current_weather(&geo()).await,
            Err(ClientError::InvalidCredential)
        ));
        assert!(matches!(
            client.search_city("London").await,
            Err(ClientError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_is_a_credential_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        assert!(matches!(
            client.query_current_weather(&geo()).await,
            Err(ClientError::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn test_body_level_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(r#"{"cod": "404", "message": "city not found"}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        assert!(matches!(
            client.query_current_weather(&geo()).await,
            Err(ClientError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_unrecognized_units_preference_is_omitted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param_is_missing("units"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(CURRENT_BODY, "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.units = "standard".to_string();
        let client = build_client(&config);
        client.query_current_weather(&geo()).await.unwrap();
    }

    #[tokio::test]
    async fn test_forecast_requests_a_sample_count() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("cnt", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"list": [
                    {"dt": 1718064000, "main": {"temp": 15.0, "temp_min": 11.0, "temp_max": 17.0},
                     "weather": [{"id": 800, "icon": "01d"}]}
                ]}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        let samples = client.query_forecast(&geo()).await.unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].temp_max, Some(17.0));
    }

    #[tokio::test]
    async fn test_city_search_parses_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/find"))
            .and(query_param("q", "London"))
            .and(query_param("type", "like"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"list": [
                    {"id": 2643743, "name": "London", "sys": {"country": "GB"}},
                    {"id": 6058560, "name": "London", "sys": {"country": "CA"}}
                ]}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        let results = client.search_city("London").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].country.as_deref(), Some("GB"));
        assert_eq!(results[1].city_id, "6058560");
    }

    #[tokio::test]
    async fn test_city_search_with_no_matches_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/find"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(r#"{"list": []}"#, "application/json"),
            )
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        assert!(client.search_city("Nowhereville").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_city_search_upstream_404_is_an_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/find"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        assert!(client.search_city("Nowhereville").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_a_status_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/find"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = build_client(&test_config(&server));
        assert!(matches!(
            client.search_city("London").await,
            Err(ClientError::Status(_))
        ));
    }
}
