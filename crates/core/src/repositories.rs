//! Contracts for the data the nearby stops screen consumes.
//!
//! Implementations live with the host (database, location services,
//! preferences). Every stream is `'static` so pipelines can own it.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use nearby_stops_transit::{
    BoundingBox, DeviceLocation, ServiceName, StaticStopStore, StopDetailsWithServices,
    StopIdentifier, StopName, distance_between,
};

pub trait LocationRepository: Send + Sync {
    /// Whether the device has any location hardware at all. Static.
    fn has_location_feature(&self) -> bool;

    /// Whether the device has a GPS provider. Static.
    fn has_gps_provider(&self) -> bool;

    /// Whether the GPS provider is switched on right now.
    fn is_gps_provider_enabled(&self) -> bool;

    /// Emits whenever location providers are switched on or off.
    fn is_location_enabled(&self) -> BoxStream<'static, bool>;

    /// Emits only when a fix is obtained.
    fn user_location(&self) -> BoxStream<'static, DeviceLocation>;

    /// Distance in metres.
    fn distance_between(&self, a: DeviceLocation, b: DeviceLocation) -> f64 {
        distance_between(a, b)
    }
}

pub trait StopStore: Send + Sync {
    /// Stops inside `bbox`. `None` while nothing is known; `None` and an
    /// empty set of services both mean "no filtering".
    fn stops_in_bounding_box(
        &self,
        bbox: &BoundingBox,
        service_filter: Option<&BTreeSet<ServiceName>>,
    ) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>>;

    fn name_for_stop(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<StopName>>;
}

pub trait ServiceCatalog: Send + Sync {
    fn all_service_names(&self) -> BoxStream<'static, Option<Vec<ServiceName>>>;
}

/// A per-stop boolean relationship such as "is a favourite" or "has an
/// arrival alert". `None` while loading.
pub trait StopStatusRepository: Send + Sync {
    fn status_for(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<bool>>;
}

pub trait PreferenceRepository: Send + Sync {
    fn is_gps_prompt_disabled(&self) -> BoxStream<'static, bool>;
}

#[derive(Clone)]
pub struct StopStatusRepositories {
    pub favourites: Arc<dyn StopStatusRepository>,
    pub arrival_alerts: Arc<dyn StopStatusRepository>,
    pub proximity_alerts: Arc<dyn StopStatusRepository>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureFlags {
    pub has_arrival_alert_feature: bool,
    pub has_proximity_alert_feature: bool,
    pub has_stop_map_feature: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            has_arrival_alert_feature: true,
            has_proximity_alert_feature: true,
            has_stop_map_feature: true,
        }
    }
}

/// Half-spans, in degrees, of the box searched around the device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestStopsConfig {
    pub latitude_span: f64,
    pub longitude_span: f64,
}

impl Default for NearestStopsConfig {
    fn default() -> Self {
        Self {
            latitude_span: 0.008,
            longitude_span: 0.012,
        }
    }
}

impl StopStore for StaticStopStore {
    fn stops_in_bounding_box(
        &self,
        bbox: &BoundingBox,
        service_filter: Option<&BTreeSet<ServiceName>>,
    ) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>> {
        let stops = StaticStopStore::stops_in_bounding_box(self, bbox, service_filter);
        stream::once(future::ready(Some(stops))).boxed()
    }

    fn name_for_stop(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<StopName>> {
        stream::once(future::ready(StaticStopStore::name_for_stop(self, stop))).boxed()
    }
}

impl ServiceCatalog for StaticStopStore {
    fn all_service_names(&self) -> BoxStream<'static, Option<Vec<ServiceName>>> {
        stream::once(future::ready(Some(StaticStopStore::all_service_names(self)))).boxed()
    }
}
