//! In-memory stop store backed by a bundled stop list.
//!
//! Stores every stop in memory with an R-tree over its coordinates for fast
//! bounding-box queries.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rstar::RTree;

use crate::identifiers::*;
use crate::models::{Result, StopDetailsWithServices, StopName, TransitError};
use crate::spatial::index::StopNode;
use crate::spatial::queries::BoundingBox;

/// In-memory stop store with spatial indexing
///
/// This type is cheap to clone since all data is stored in `Arc`s.
#[derive(Clone)]
pub struct StaticStopStore {
    stops: Vec<Arc<StopDetailsWithServices>>,
    stop_map: HashMap<StopIdentifier, Arc<StopDetailsWithServices>>,
    stop_tree: Arc<RTree<StopNode>>,
}

impl StaticStopStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            stops: Vec::new(),
            stop_map: HashMap::new(),
            stop_tree: Arc::new(RTree::new()),
        }
    }

    /// Build a store from raw stop rows.
    ///
    /// Rows with non-finite or out of range coordinates are rejected. A later
    /// row with the same identifier replaces the earlier one in lookups.
    pub fn from_data(stops: Vec<StopDetailsWithServices>) -> Result<Self> {
        for stop in &stops {
            let valid_latitude = stop.latitude.is_finite() && stop.latitude.abs() <= 90.0;
            let valid_longitude = stop.longitude.is_finite() && stop.longitude.abs() <= 180.0;
            if !valid_latitude || !valid_longitude {
                return Err(TransitError::InvalidCoordinates {
                    stop: stop.stop_identifier.clone(),
                    latitude: stop.latitude,
                    longitude: stop.longitude,
                });
            }
        }

        let stops: Vec<Arc<StopDetailsWithServices>> = stops.into_iter().map(Arc::new).collect();

        let stop_map: HashMap<_, _> = stops
            .iter()
            .map(|s| (s.stop_identifier.clone(), s.clone()))
            .collect();

        let stop_tree = RTree::bulk_load(
            stops
                .iter()
                .enumerate()
                .map(|(ordinal, s)| StopNode::new(ordinal, s.clone()))
                .collect(),
        );

        Ok(Self {
            stops,
            stop_map,
            stop_tree: Arc::new(stop_tree),
        })
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn name_for_stop(&self, id: &StopIdentifier) -> Option<StopName> {
        self.stop_map.get(id).map(|s| s.stop_name.clone())
    }

    /// Every distinct service name calling at any stop, sorted.
    pub fn all_service_names(&self) -> Vec<ServiceName> {
        self.stops
            .iter()
            .flat_map(|s| s.services())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Stops inside `bbox`, in the order they were loaded.
    ///
    /// With a non-empty `service_filter`, only stops served by at least one of
    /// the named services are returned. `None` and an empty set both mean no
    /// filtering.
    pub fn stops_in_bounding_box(
        &self,
        bbox: &BoundingBox,
        service_filter: Option<&BTreeSet<ServiceName>>,
    ) -> Vec<StopDetailsWithServices> {
        let filter = service_filter.filter(|f| !f.is_empty());

        let mut nodes: Vec<&StopNode> = self
            .stop_tree
            .locate_in_envelope(&bbox.envelope())
            .filter(|node| match filter {
                Some(services) => node.stop.services().any(|s| services.contains(&s)),
                None => true,
            })
            .collect();
        nodes.sort_by_key(|node| node.ordinal);

        nodes.into_iter().map(|node| (*node.stop).clone()).collect()
    }
}

impl Default for StaticStopStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeviceLocation, StopOrientation};

    fn stop(id: &str, latitude: f64, longitude: f64, services: &str) -> StopDetailsWithServices {
        StopDetailsWithServices {
            stop_identifier: StopIdentifier::new(id),
            stop_name: StopName::new(format!("Stop {id}"), None),
            latitude,
            longitude,
            orientation: StopOrientation::Unknown,
            service_listing: Some(services.to_string()),
        }
    }

    fn store() -> StaticStopStore {
        StaticStopStore::from_data(vec![
            stop("3", 10.02, 20.52, "1, 44"),
            stop("1", 10.0, 20.5, "44"),
            stop("far", 40.0, -74.0, "1"),
            stop("2", 9.99, 20.49, "X27"),
        ])
        .unwrap()
    }

    #[test]
    fn test_empty_store() {
        let store = StaticStopStore::new();
        assert!(store.is_empty());
        assert!(store.all_service_names().is_empty());
    }

    #[test]
    fn test_store_lookups() {
        let store = store();

        assert_eq!(store.len(), 4);
        assert_eq!(store.name_for_stop(&StopIdentifier::new("missing")), None);
        assert_eq!(
            store.name_for_stop(&StopIdentifier::new("2")),
            Some(StopName::new("Stop 2", None))
        );
        assert_eq!(
            store.all_service_names(),
            vec![ServiceName::new("1"), ServiceName::new("44"), ServiceName::new("X27")]
        );
    }

    #[test]
    fn test_rejects_invalid_coordinates() {
        let result = StaticStopStore::from_data(vec![stop("bad", 91.0, 0.0, "1")]);
        assert!(matches!(result, Err(TransitError::InvalidCoordinates { .. })));
    }

    #[test]
    fn test_bounding_box_keeps_load_order() {
        let store = store();
        let bbox = BoundingBox::around(DeviceLocation::new(10.0, 20.5), 0.1, 0.1);

        let ids: Vec<String> = store
            .stops_in_bounding_box(&bbox, None)
            .into_iter()
            .map(|s| s.stop_identifier.to_string())
            .collect();

        assert_eq!(ids, vec!["3", "1", "2"]);
    }

    #[test]
    fn test_bounding_box_edges_are_inclusive() {
        let store = StaticStopStore::from_data(vec![
            stop("corner", 10.5, 20.75, "1"),
            stop("edge", 9.5, 20.5, "1"),
            stop("outside", 10.5, 20.8, "1"),
        ])
        .unwrap();
        let bbox = BoundingBox::around(DeviceLocation::new(10.0, 20.5), 0.5, 0.25);

        let ids: Vec<String> = store
            .stops_in_bounding_box(&bbox, None)
            .into_iter()
            .map(|s| s.stop_identifier.to_string())
            .collect();
        assert_eq!(ids, vec!["corner", "edge"]);
    }

    #[test]
    fn test_service_filter() {
        let store = store();
        let bbox = BoundingBox::around(DeviceLocation::new(10.0, 20.5), 0.1, 0.1);
        let filter: BTreeSet<ServiceName> = [ServiceName::new("44")].into_iter().collect();

        let ids: Vec<String> = store
            .stops_in_bounding_box(&bbox, Some(&filter))
            .into_iter()
            .map(|s| s.stop_identifier.to_string())
            .collect();
        assert_eq!(ids, vec!["3", "1"]);

        let empty = BTreeSet::new();
        assert_eq!(store.stops_in_bounding_box(&bbox, Some(&empty)).len(), 3);
    }
}
