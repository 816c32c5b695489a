//! Embeddable OpenWeatherMap weather provider.
//!
//! Given a coordinate, a named city identifier, or a free-text city name,
//! this crate fetches current conditions and a multi-day forecast from
//! OpenWeatherMap, normalizes them into a unit-agnostic domain model, and
//! reports back through host callbacks. The host drives the
//! [`host::WeatherProviderService`] lifecycle; [`dispatcher::OwmProviderService`]
//! implements it, coalescing near-duplicate requests and running each
//! accepted one on a background task.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod forecast;
pub mod host;
pub mod model;
pub mod normalize;

pub use client::{create_http_client, ClientError, OwmClient, WeatherApi};
pub use config::{CredentialStore, ProviderConfig, VerificationState};
pub use dispatcher::{DispatchPolicy, OwmProviderService};
pub use host::{
    RejectReason, RequestInfo, RequestKind, RequestResult, WeatherProviderService, WeatherRequest,
};
pub use model::{
    DayForecast, GeoCoordinate, LocationSpec, NamedLocation, NormalizedWeather, TemperatureUnit,
    Wind,
};
pub use normalize::WeatherCode;
