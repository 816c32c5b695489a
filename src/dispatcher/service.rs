use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::state::{
    is_same_geo_location, is_same_named_location, DispatchPolicy, WeatherDispatchState,
};
use crate::client::{create_http_client, ClientError, OwmClient, WeatherApi};
use crate::config::{CredentialStore, ProviderConfig, VerificationState};
use crate::host::{
    RejectReason, RequestInfo, RequestKind, RequestResult, WeatherProviderService, WeatherRequest,
};
use crate::model::{LocationSpec, NormalizedWeather, TemperatureUnit};
use crate::normalize::build_normalized_weather;

/// The request coalescer and dispatcher. Applies the too-soon/same-location
/// suppression policy, keeps the two in-flight mappings, runs each accepted
/// request on a background task, and reports back through the host
/// callbacks.
pub struct OwmProviderService {
    client: Arc<dyn WeatherApi>,
    credentials: Arc<CredentialStore>,
    unit: TemperatureUnit,
    policy: DispatchPolicy,
    runtime: Handle,
    weather: Arc<Mutex<WeatherDispatchState>>,
    lookups: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl OwmProviderService {
    pub fn new(
        client: Arc<dyn WeatherApi>,
        credentials: Arc<CredentialStore>,
        unit: TemperatureUnit,
        runtime: Handle,
    ) -> Self {
        Self::with_policy(client, credentials, unit, runtime, DispatchPolicy::default())
    }

    pub fn with_policy(
        client: Arc<dyn WeatherApi>,
        credentials: Arc<CredentialStore>,
        unit: TemperatureUnit,
        runtime: Handle,
        policy: DispatchPolicy,
    ) -> Self {
        Self {
            client,
            credentials,
            unit,
            policy,
            runtime,
            weather: Arc::new(Mutex::new(WeatherDispatchState::default())),
            lookups: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Assemble the full provider from one configuration: credential store,
    /// shared HTTP client, API client, dispatcher.
    pub fn from_config(config: &ProviderConfig, runtime: Handle) -> Self {
        let credentials = Arc::new(CredentialStore::new(config.api_key.clone()));
        let client = OwmClient::new(create_http_client(), Arc::clone(&credentials), config);
        let unit = client.unit();
        Self::new(Arc::new(client), credentials, unit, runtime)
    }

    /// The credential store backing this provider, for the host's settings
    /// flow to push key edits into.
    pub fn credentials(&self) -> Arc<CredentialStore> {
        Arc::clone(&self.credentials)
    }

    fn submitted_too_soon(&self, state: &WeatherDispatchState, location: &LocationSpec) -> bool {
        let same_location = match location {
            LocationSpec::Geo(geo) => state
                .last_geo
                .as_ref()
                .is_some_and(|last| is_same_geo_location(geo, last, self.policy.distance_threshold_km)),
            LocationSpec::Named(named) => state
                .last_named
                .as_ref()
                .is_some_and(|last| is_same_named_location(named, last)),
        };
        let too_soon = state
            .last_request
            .is_some_and(|last| Instant::now().duration_since(last) < self.policy.request_threshold);
        same_location && too_soon
    }

    fn spawn_weather_task(
        &self,
        request: Arc<dyn WeatherRequest>,
        location: LocationSpec,
        token: CancellationToken,
    ) {
        let client = Arc::clone(&self.client);
        let credentials = Arc::clone(&self.credentials);
        let weather = Arc::clone(&self.weather);
        let unit = self.unit;

        self.runtime.spawn(async move {
            let request_id = request.info().id;
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(request_id = %request_id, "weather update cancelled");
                }
                snapshot = fetch_weather(client.as_ref(), &credentials, &location, unit) => {
                    match snapshot {
                        Some(snapshot) => {
                            {
                                let mut state = weather.lock();
                                match &location {
                                    LocationSpec::Geo(geo) => state.last_geo = Some(*geo),
                                    LocationSpec::Named(named) => {
                                        state.last_named = Some(named.clone())
                                    }
                                }
                            }
                            credentials.set_verification_state(VerificationState::Verified);
                            request.complete(RequestResult::Weather(snapshot));
                        }
                        None => request.fail(),
                    }
                }
            }
            weather.lock().tasks.remove(&request_id);
        });
    }

    fn spawn_lookup_task(
        &self,
        request: Arc<dyn WeatherRequest>,
        city_name: String,
        token: CancellationToken,
    ) {
        let client = Arc::clone(&self.client);
        let credentials = Arc::clone(&self.credentials);
        let lookups = Arc::clone(&self.lookups);

        self.runtime.spawn(async move {
            let request_id = request.info().id;
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(request_id = %request_id, "city lookup cancelled");
                }
                result = client.search_city(&city_name) => {
                    match result {
                        Ok(locations) => {
                            tracing::debug!(matches = locations.len(), "city lookup finished");
                            credentials.set_verification_state(VerificationState::Verified);
                            request.complete(RequestResult::Locations(locations));
                        }
                        Err(ClientError::InvalidCredential) => {
                            tracing::warn!("provider rejected the configured API key");
                            credentials.set_verification_state(VerificationState::Invalid);
                            request.fail();
                        }
                        Err(err) => {
                            tracing::debug!(error = %err, "city lookup failed");
                            request.fail();
                        }
                    }
                }
            }
            lookups.lock().remove(&request_id);
        });
    }
}

impl WeatherProviderService for OwmProviderService {
    fn on_start(&self) {
        tracing::info!("weather provider started");
    }

    fn on_stop(&self) {
        tracing::info!("weather provider stopping, cancelling in-flight requests");
        self.weather.lock().clear();
        for (_, token) in self.lookups.lock().drain() {
            token.cancel();
        }
    }

    fn on_request_submitted(&self, request: Arc<dyn WeatherRequest>) {
        let info = request.info().clone();
        if self.credentials.api_key().is_none() {
            tracing::warn!(request_id = %info.id, "no API key configured, cannot process request");
            request.fail();
            return;
        }
        tracing::debug!(request_id = %info.id, kind = ?info.kind, "received request");

        match info.kind {
            RequestKind::WeatherByGeo | RequestKind::WeatherByNamedLocation => {
                let Some(location) = info.location else {
                    tracing::warn!(request_id = %info.id, "weather request without a location");
                    request.fail();
                    return;
                };

                // The suppression check and the insert/stamp are one step
                // under the lock; two near-simultaneous submissions cannot
                // both pass it. The host callback runs outside the lock.
                let token = {
                    let mut state = self.weather.lock();
                    if self.submitted_too_soon(&state, &location) {
                        None
                    } else {
                        let token = CancellationToken::new();
                        state.tasks.insert(info.id, token.clone());
                        state.last_request = Some(Instant::now());
                        Some(token)
                    }
                };

                match token {
                    None => {
                        tracing::debug!(request_id = %info.id, "same location requested too soon");
                        request.reject(RejectReason::SubmittedTooSoon);
                    }
                    Some(token) => self.spawn_weather_task(request, location, token),
                }
            }
            RequestKind::CityNameLookup => {
                let Some(city_name) = info.city_name else {
                    tracing::warn!(request_id = %info.id, "lookup request without a city name");
                    request.fail();
                    return;
                };

                let token = CancellationToken::new();
                self.lookups.lock().insert(info.id, token.clone());
                self.spawn_lookup_task(request, city_name, token);
            }
        }
    }

    fn on_request_cancelled(&self, request: &RequestInfo) {
        match request.kind {
            RequestKind::WeatherByGeo | RequestKind::WeatherByNamedLocation => {
                match self.weather.lock().tasks.remove(&request.id) {
                    Some(token) => {
                        tracing::debug!(request_id = %request.id, "cancelling weather update");
                        token.cancel();
                    }
                    None => {
                        tracing::debug!(request_id = %request.id, "no in-flight weather update to cancel");
                    }
                }
            }
            RequestKind::CityNameLookup => match self.lookups.lock().remove(&request.id) {
                Some(token) => {
                    tracing::debug!(request_id = %request.id, "cancelling city lookup");
                    token.cancel();
                }
                None => {
                    tracing::debug!(request_id = %request.id, "no in-flight city lookup to cancel");
                }
            },
        }
    }
}

/// One weather update: current conditions first, then the best-effort
/// forecast, then normalization. Returns `None` when no usable result could
/// be produced; credential verdicts are recorded as a side effect.
async fn fetch_weather(
    client: &dyn WeatherApi,
    credentials: &CredentialStore,
    location: &LocationSpec,
    unit: TemperatureUnit,
) -> Option<NormalizedWeather> {
    let current = match client.query_current_weather(location).await {
        Ok(current) => current,
        Err(ClientError::InvalidCredential) => {
            tracing::warn!("provider rejected the configured API key");
            credentials.set_verification_state(VerificationState::Invalid);
            return None;
        }
        Err(err) => {
            tracing::debug!(error = %err, "current weather query failed");
            return None;
        }
    };

    let samples = match client.query_forecast(location).await {
        Ok(samples) => samples,
        Err(err) => {
            tracing::debug!(error = %err, "forecast query failed, continuing without it");
            Vec::new()
        }
    };

    let preferred_name = match location {
        LocationSpec::Named(named) => Some(named.city.as_str()),
        LocationSpec::Geo(_) => None,
    };
    build_normalized_weather(&current, &samples, unit, preferred_name, Utc::now())
}
