use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use itertools::Itertools;
use nearby_stops_transit::{BoundingBox, DeviceLocation, ServiceName, StopDetailsWithServices};
use tracing::debug;

use crate::nearest_stops::ui_state::UiNearestStop;
use crate::repositories::{LocationRepository, NearestStopsConfig, StopStore};

/// Finds the stops around a device location and ranks them by distance.
#[derive(Clone)]
pub struct NearestStopQueryEngine {
    stops: Arc<dyn StopStore>,
    location: Arc<dyn LocationRepository>,
    config: NearestStopsConfig,
}

impl NearestStopQueryEngine {
    pub fn new(
        stops: Arc<dyn StopStore>,
        location: Arc<dyn LocationRepository>,
        config: NearestStopsConfig,
    ) -> Self {
        Self {
            stops,
            location,
            config,
        }
    }

    pub fn bounding_box(&self, device: DeviceLocation) -> BoundingBox {
        BoundingBox::around(device, self.config.latitude_span, self.config.longitude_span)
    }

    /// Ranked stops for `device`, re-emitted whenever the store's answer changes.
    ///
    /// `None` passes through untouched so callers can tell "unknown" apart from
    /// the ranked list.
    pub fn nearest_stops(
        &self,
        device: DeviceLocation,
        service_filter: Option<BTreeSet<ServiceName>>,
    ) -> BoxStream<'static, Option<Vec<UiNearestStop>>> {
        let bbox = self.bounding_box(device);
        debug!(?device, ?bbox, ?service_filter, "querying nearest stops");

        let location = Arc::clone(&self.location);
        self.stops
            .stops_in_bounding_box(&bbox, service_filter.as_ref())
            .map(move |stops| stops.map(|stops| rank_stops(location.as_ref(), device, stops)))
            .boxed()
    }
}

/// Rounded distance from `device` for each stop, nearest first.
///
/// Stops at equal distance keep the order the store returned them in.
pub fn rank_stops(
    location: &dyn LocationRepository,
    device: DeviceLocation,
    stops: Vec<StopDetailsWithServices>,
) -> Vec<UiNearestStop> {
    stops
        .into_iter()
        .map(|stop| {
            let distance = location.distance_between(stop.location(), device).abs().round() as u32;
            UiNearestStop {
                stop_identifier: stop.stop_identifier,
                stop_name: stop.stop_name,
                services: stop.service_listing,
                distance,
                orientation: stop.orientation,
                is_selected: false,
            }
        })
        .sorted_by_key(|stop| stop.distance)
        .collect()
}
