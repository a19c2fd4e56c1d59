//! Foreign traits the host implements, and their adapters onto the core
//! repository contracts.
//!
//! Foreign calls block, so adapters run them on tokio's blocking pool and
//! re-run them whenever the host reports that the underlying data changed.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::stream::{BoxStream, StreamExt};
use nearby_stops_core::repositories::{
    LocationRepository, PreferenceRepository, ServiceCatalog, StopStatusRepository, StopStore,
};
use nearby_stops_core::stream::watch_stream;
use nearby_stops_transit::{
    BoundingBox, DeviceLocation, ServiceName, StopDetailsWithServices, StopIdentifier, StopName,
};
use tokio::sync::watch;
use tracing::warn;

use crate::records::{StatusKind, Stop, StopDisplayName};

#[uniffi::export(with_foreign)]
pub trait StopDatabase: Send + Sync {
    /// `None` while the database is not ready yet.
    fn stops_in_bounding_box(
        &self,
        min_latitude: f64,
        min_longitude: f64,
        max_latitude: f64,
        max_longitude: f64,
        service_filter: Option<Vec<String>>,
    ) -> Option<Vec<Stop>>;

    fn name_for_stop(&self, stop_identifier: String) -> Option<StopDisplayName>;

    fn all_service_names(&self) -> Option<Vec<String>>;
}

#[uniffi::export(with_foreign)]
pub trait StopStatusSource: Send + Sync {
    /// `None` while loading.
    fn status_for(&self, kind: StatusKind, stop_identifier: String) -> Option<bool>;
}

/// Runs `query` on the blocking pool every time `version` changes.
fn requery<T, F>(version: watch::Receiver<u64>, query: F) -> BoxStream<'static, Option<T>>
where
    T: Send + 'static,
    F: Fn() -> Option<T> + Clone + Send + Sync + 'static,
{
    watch_stream(version)
        .then(move |_| {
            let query = query.clone();
            async move {
                tokio::task::spawn_blocking(query)
                    .await
                    .unwrap_or_else(|error| {
                        warn!(%error, "host query failed");
                        None
                    })
            }
        })
        .boxed()
}

pub(crate) struct HostStopStore {
    database: Arc<dyn StopDatabase>,
    version: watch::Receiver<u64>,
}

impl HostStopStore {
    pub(crate) fn new(database: Arc<dyn StopDatabase>, version: watch::Receiver<u64>) -> Self {
        Self { database, version }
    }
}

impl StopStore for HostStopStore {
    fn stops_in_bounding_box(
        &self,
        bbox: &BoundingBox,
        service_filter: Option<&BTreeSet<ServiceName>>,
    ) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>> {
        let database = Arc::clone(&self.database);
        let bbox = *bbox;
        let service_filter: Option<Vec<String>> =
            service_filter.map(|services| services.iter().map(ToString::to_string).collect());

        requery(self.version.clone(), move || {
            let stops = database.stops_in_bounding_box(
                bbox.min_latitude,
                bbox.min_longitude,
                bbox.max_latitude,
                bbox.max_longitude,
                service_filter.clone(),
            )?;
            Some(stops.into_iter().map(StopDetailsWithServices::from).collect())
        })
    }

    fn name_for_stop(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<StopName>> {
        let database = Arc::clone(&self.database);
        let stop = stop.to_string();

        requery(self.version.clone(), move || {
            database.name_for_stop(stop.clone()).map(StopName::from)
        })
    }
}

impl ServiceCatalog for HostStopStore {
    fn all_service_names(&self) -> BoxStream<'static, Option<Vec<ServiceName>>> {
        let database = Arc::clone(&self.database);

        requery(self.version.clone(), move || {
            let services = database.all_service_names()?;
            Some(services.into_iter().map(ServiceName::from).collect())
        })
    }
}

pub(crate) struct HostStatusRepository {
    source: Arc<dyn StopStatusSource>,
    kind: StatusKind,
    version: watch::Receiver<u64>,
}

impl HostStatusRepository {
    pub(crate) fn new(
        source: Arc<dyn StopStatusSource>,
        kind: StatusKind,
        version: watch::Receiver<u64>,
    ) -> Self {
        Self {
            source,
            kind,
            version,
        }
    }
}

impl StopStatusRepository for HostStatusRepository {
    fn status_for(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<bool>> {
        let source = Arc::clone(&self.source);
        let kind = self.kind;
        let stop = stop.to_string();

        requery(self.version.clone(), move || source.status_for(kind, stop.clone()))
    }
}

/// Location signals pushed by the host.
pub(crate) struct HostLocation {
    has_location_feature: bool,
    has_gps_provider: bool,
    gps_provider_enabled: AtomicBool,
    location_enabled: watch::Sender<bool>,
    location: watch::Sender<Option<DeviceLocation>>,
}

impl HostLocation {
    pub(crate) fn new(has_location_feature: bool, has_gps_provider: bool) -> Self {
        Self {
            has_location_feature,
            has_gps_provider,
            gps_provider_enabled: AtomicBool::new(false),
            location_enabled: watch::channel(false).0,
            location: watch::channel(None).0,
        }
    }

    pub(crate) fn set_gps_provider_enabled(&self, enabled: bool) {
        self.gps_provider_enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn set_location_enabled(&self, enabled: bool) {
        self.location_enabled.send_if_modified(|current| {
            let changed = *current != enabled;
            *current = enabled;
            changed
        });
    }

    pub(crate) fn push_fix(&self, location: DeviceLocation) {
        self.location.send_replace(Some(location));
    }
}

impl LocationRepository for HostLocation {
    fn has_location_feature(&self) -> bool {
        self.has_location_feature
    }

    fn has_gps_provider(&self) -> bool {
        self.has_gps_provider
    }

    fn is_gps_provider_enabled(&self) -> bool {
        self.gps_provider_enabled.load(Ordering::Acquire)
    }

    fn is_location_enabled(&self) -> BoxStream<'static, bool> {
        watch_stream(self.location_enabled.subscribe())
    }

    fn user_location(&self) -> BoxStream<'static, DeviceLocation> {
        watch_stream(self.location.subscribe())
            .filter_map(|location| async move { location })
            .boxed()
    }
}

pub(crate) struct HostPreferences {
    gps_prompt_disabled: watch::Sender<bool>,
}

impl HostPreferences {
    pub(crate) fn new() -> Self {
        Self {
            gps_prompt_disabled: watch::channel(false).0,
        }
    }

    pub(crate) fn set_gps_prompt_disabled(&self, disabled: bool) {
        self.gps_prompt_disabled.send_replace(disabled);
    }
}

impl PreferenceRepository for HostPreferences {
    fn is_gps_prompt_disabled(&self) -> BoxStream<'static, bool> {
        watch_stream(self.gps_prompt_disabled.subscribe())
    }
}
