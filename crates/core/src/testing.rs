//! Watch-channel backed fakes for the repository contracts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::future;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use nearby_stops_transit::{
    BoundingBox, DeviceLocation, ServiceName, StopDetailsWithServices, StopIdentifier, StopName,
    StopOrientation,
};
use tokio::sync::watch;

use crate::repositories::{
    LocationRepository, PreferenceRepository, ServiceCatalog, StopStatusRepository, StopStore,
};
use crate::stream::watch_stream;

pub fn stop(id: &str, latitude: f64, longitude: f64) -> StopDetailsWithServices {
    StopDetailsWithServices {
        stop_identifier: StopIdentifier::new(id),
        stop_name: StopName::new(format!("Stop {id}"), None),
        latitude,
        longitude,
        orientation: StopOrientation::North,
        service_listing: Some("1, 2".to_string()),
    }
}

/// Next item matching `predicate`, panicking if none arrives within 5 seconds.
pub async fn next_matching<S, T>(stream: &mut S, predicate: impl Fn(&T) -> bool) -> T
where
    S: Stream<Item = T> + Unpin,
    T: std::fmt::Debug,
{
    let search = async {
        while let Some(item) = stream.next().await {
            if predicate(&item) {
                return item;
            }
        }
        panic!("stream ended before a matching item arrived");
    };

    tokio::time::timeout(Duration::from_secs(5), search)
        .await
        .expect("timed out waiting for a matching item")
}

type DistanceFn = Box<dyn Fn(DeviceLocation, DeviceLocation) -> f64 + Send + Sync>;

pub struct FakeLocationRepository {
    pub has_location_feature: bool,
    pub has_gps_provider: bool,
    pub gps_provider_enabled: AtomicBool,
    pub location_enabled: watch::Sender<bool>,
    pub location: watch::Sender<Option<DeviceLocation>>,
    distance: Option<DistanceFn>,
}

impl FakeLocationRepository {
    pub fn new() -> Self {
        Self {
            has_location_feature: true,
            has_gps_provider: true,
            gps_provider_enabled: AtomicBool::new(false),
            location_enabled: watch::channel(true).0,
            location: watch::channel(None).0,
            distance: None,
        }
    }

    pub fn with_distance(
        mut self,
        distance: impl Fn(DeviceLocation, DeviceLocation) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.distance = Some(Box::new(distance));
        self
    }

    pub fn push_fix(&self, latitude: f64, longitude: f64) {
        self.location
            .send_replace(Some(DeviceLocation::new(latitude, longitude)));
    }
}

impl LocationRepository for FakeLocationRepository {
    fn has_location_feature(&self) -> bool {
        self.has_location_feature
    }

    fn has_gps_provider(&self) -> bool {
        self.has_gps_provider
    }

    fn is_gps_provider_enabled(&self) -> bool {
        self.gps_provider_enabled.load(Ordering::SeqCst)
    }

    fn is_location_enabled(&self) -> BoxStream<'static, bool> {
        watch_stream(self.location_enabled.subscribe())
    }

    fn user_location(&self) -> BoxStream<'static, DeviceLocation> {
        watch_stream(self.location.subscribe())
            .filter_map(future::ready)
            .boxed()
    }

    fn distance_between(&self, a: DeviceLocation, b: DeviceLocation) -> f64 {
        match &self.distance {
            Some(distance) => distance(a, b),
            None => nearby_stops_transit::distance_between(a, b),
        }
    }
}

type StopsResponder = Box<
    dyn Fn(&BoundingBox) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>>
        + Send
        + Sync,
>;

pub struct FakeStopStore {
    pub stops: watch::Sender<Option<Vec<StopDetailsWithServices>>>,
    pub names: watch::Sender<HashMap<StopIdentifier, StopName>>,
    pub queries: Mutex<Vec<(BoundingBox, Option<BTreeSet<ServiceName>>)>>,
    responder: Option<StopsResponder>,
}

impl FakeStopStore {
    pub fn new() -> Self {
        Self {
            stops: watch::channel(None).0,
            names: watch::channel(HashMap::new()).0,
            queries: Mutex::new(Vec::new()),
            responder: None,
        }
    }

    /// Answers bounding-box queries with `responder` instead of `stops`.
    pub fn with_responder(
        mut self,
        responder: impl Fn(&BoundingBox) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn recorded_queries(&self) -> Vec<(BoundingBox, Option<BTreeSet<ServiceName>>)> {
        self.queries.lock().unwrap().clone()
    }
}

impl StopStore for FakeStopStore {
    fn stops_in_bounding_box(
        &self,
        bbox: &BoundingBox,
        service_filter: Option<&BTreeSet<ServiceName>>,
    ) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>> {
        self.queries
            .lock()
            .unwrap()
            .push((*bbox, service_filter.cloned()));

        match &self.responder {
            Some(responder) => responder(bbox),
            None => watch_stream(self.stops.subscribe()),
        }
    }

    fn name_for_stop(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<StopName>> {
        let stop = stop.clone();
        watch_stream(self.names.subscribe())
            .map(move |names| names.get(&stop).cloned())
            .boxed()
    }
}

/// Stops missing from `statuses` are still loading.
pub struct FakeStatusRepository {
    pub statuses: watch::Sender<HashMap<StopIdentifier, bool>>,
}

impl FakeStatusRepository {
    pub fn new() -> Self {
        Self {
            statuses: watch::channel(HashMap::new()).0,
        }
    }

    pub fn set(&self, stop: &str, status: bool) {
        self.statuses.send_modify(|statuses| {
            statuses.insert(StopIdentifier::new(stop), status);
        });
    }
}

impl StopStatusRepository for FakeStatusRepository {
    fn status_for(&self, stop: &StopIdentifier) -> BoxStream<'static, Option<bool>> {
        let stop = stop.clone();
        watch_stream(self.statuses.subscribe())
            .map(move |statuses| statuses.get(&stop).copied())
            .boxed()
    }
}

pub struct FakeServiceCatalog {
    pub services: watch::Sender<Option<Vec<ServiceName>>>,
}

impl FakeServiceCatalog {
    pub fn new() -> Self {
        Self {
            services: watch::channel(None).0,
        }
    }
}

impl ServiceCatalog for FakeServiceCatalog {
    fn all_service_names(&self) -> BoxStream<'static, Option<Vec<ServiceName>>> {
        watch_stream(self.services.subscribe())
    }
}

pub struct FakePreferenceRepository {
    pub gps_prompt_disabled: watch::Sender<bool>,
}

impl FakePreferenceRepository {
    pub fn new() -> Self {
        Self {
            gps_prompt_disabled: watch::channel(false).0,
        }
    }
}

impl PreferenceRepository for FakePreferenceRepository {
    fn is_gps_prompt_disabled(&self) -> BoxStream<'static, bool> {
        watch_stream(self.gps_prompt_disabled.subscribe())
    }
}
