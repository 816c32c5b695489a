//! The seam between this provider and the host framework that embeds it.
//!
//! The host owns the provider instance and invokes the
//! [`WeatherProviderService`] lifecycle methods synchronously; the provider
//! answers through the callbacks on each [`WeatherRequest`]. Every request
//! terminates in exactly one of `reject`, `fail`, or `complete`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{LocationSpec, NamedLocation, NormalizedWeather};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    WeatherByGeo,
    WeatherByNamedLocation,
    CityNameLookup,
}

/// What the host is asking for. The id is the opaque handle used to
/// correlate submission, cancellation, and completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub id: Uuid,
    pub kind: RequestKind,
    pub location: Option<LocationSpec>,
    pub city_name: Option<String>,
}

impl RequestInfo {
    pub fn weather_by_geo(location: crate::model::GeoCoordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RequestKind::WeatherByGeo,
            location: Some(LocationSpec::Geo(location)),
            city_name: None,
        }
    }

    pub fn weather_by_named_location(location: NamedLocation) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RequestKind::WeatherByNamedLocation,
            location: Some(LocationSpec::Named(location)),
            city_name: None,
        }
    }

    pub fn city_name_lookup(city_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: RequestKind::CityNameLookup,
            location: None,
            city_name: Some(city_name.into()),
        }
    }
}

/// Policy rejections, delivered through a channel distinct from `fail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    SubmittedTooSoon,
}

/// The result envelope handed back on completion.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestResult {
    Weather(NormalizedWeather),
    Locations(Vec<NamedLocation>),
}

/// A pending unit of work, created by the host at submission time. The host
/// side decides whether a late `complete`/`fail` after its own cancellation
/// is still accepted.
pub trait WeatherRequest: Send + Sync {
    fn info(&self) -> &RequestInfo;

    fn complete(&self, result: RequestResult);

    fn fail(&self);

    fn reject(&self, reason: RejectReason);
}

/// Provider lifecycle, driven synchronously by the host. Submission and
/// cancellation must return promptly; all network work happens on
/// background tasks.
pub trait WeatherProviderService: Send + Sync {
    fn on_start(&self) {}

    fn on_stop(&self) {}

    fn on_request_submitted(&self, request: Arc<dyn WeatherRequest>);

    fn on_request_cancelled(&self, request: &RequestInfo);
}
