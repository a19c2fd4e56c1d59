use std::collections::BTreeSet;
use std::sync::Arc;

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use nearby_stops_transit::ServiceName;
use tokio::sync::watch;
use tracing::debug;

use crate::location::{GateResult, PermissionsState, evaluate_gate};
use crate::nearest_stops::query::NearestStopQueryEngine;
use crate::nearest_stops::ui_state::{UiError, UiState};
use crate::repositories::LocationRepository;
use crate::stream::{SwitchMapExt, combine_latest, distinct_until_changed, watch_stream};

fn just(state: UiState) -> BoxStream<'static, UiState> {
    stream::once(future::ready(state)).boxed()
}

/// Derives the screen's [`UiState`] from permissions, location and filter.
///
/// Each level (permissions, then location enabled, then location and
/// filter) restarts everything below it when it changes, so only one stop
/// query is ever live.
#[derive(Clone)]
pub struct UiStateRetriever {
    location: Arc<dyn LocationRepository>,
    query_engine: NearestStopQueryEngine,
    permissions: watch::Receiver<Option<PermissionsState>>,
    service_filter: watch::Receiver<Option<BTreeSet<ServiceName>>>,
}

impl UiStateRetriever {
    pub fn new(
        location: Arc<dyn LocationRepository>,
        query_engine: NearestStopQueryEngine,
        permissions: watch::Receiver<Option<PermissionsState>>,
        service_filter: watch::Receiver<Option<BTreeSet<ServiceName>>>,
    ) -> Self {
        Self {
            location,
            query_engine,
            permissions,
            service_filter,
        }
    }

    pub fn ui_state_stream(&self) -> BoxStream<'static, UiState> {
        if !self.location.has_location_feature() {
            debug!("device has no location feature");
            return just(UiState::Error(UiError::NoLocationFeature));
        }

        let this = self.clone();
        // Nothing is emitted until the host has reported permissions.
        let permissions = watch_stream(self.permissions.clone()).filter_map(future::ready);
        let states = permissions.switch_map(move |permissions| {
            match evaluate_gate(true, &permissions) {
                GateResult::Proceed => this.location_enabled_branch(),
                GateResult::InsufficientPermissions => {
                    just(UiState::Error(UiError::InsufficientLocationPermissions))
                }
                GateResult::NoFeature => just(UiState::Error(UiError::NoLocationFeature)),
            }
        });

        distinct_until_changed(states)
            .inspect(|state| debug!(state = state_name(state), "ui state"))
            .boxed()
    }

    fn location_enabled_branch(&self) -> BoxStream<'static, UiState> {
        let this = self.clone();
        self.location
            .is_location_enabled()
            .switch_map(move |enabled| {
                if enabled {
                    this.location_value_branch()
                } else {
                    just(UiState::Error(UiError::LocationOff))
                }
            })
            .boxed()
    }

    fn location_value_branch(&self) -> BoxStream<'static, UiState> {
        let query_engine = self.query_engine.clone();
        let queries = combine_latest(
            self.location.user_location(),
            watch_stream(self.service_filter.clone()),
        )
        .switch_map(move |(device, service_filter)| {
            query_engine
                .nearest_stops(device, service_filter)
                .map(UiState::from_query_result)
        });

        just(UiState::Error(UiError::LocationUnknown))
            .chain(queries)
            .boxed()
    }
}

fn state_name(state: &UiState) -> &'static str {
    match state {
        UiState::InProgress => "InProgress",
        UiState::Success(_) => "Success",
        UiState::Error(error) => error.into(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::location::PermissionState::*;
    use crate::repositories::NearestStopsConfig;
    use crate::testing::{FakeLocationRepository, FakeStopStore, next_matching, stop};
    use nearby_stops_transit::StopDetailsWithServices;

    struct Harness {
        location: Arc<FakeLocationRepository>,
        store: Arc<FakeStopStore>,
        permissions: watch::Sender<Option<PermissionsState>>,
        service_filter: watch::Sender<Option<BTreeSet<ServiceName>>>,
        retriever: UiStateRetriever,
    }

    fn harness(location: FakeLocationRepository, store: FakeStopStore) -> Harness {
        let location = Arc::new(location);
        let store = Arc::new(store);
        let (permissions, permissions_rx) =
            watch::channel(Some(PermissionsState::new(Granted, Granted)));
        let (service_filter, service_filter_rx) = watch::channel(None);
        let query_engine = NearestStopQueryEngine::new(
            store.clone(),
            location.clone(),
            NearestStopsConfig {
                latitude_span: 1.1,
                longitude_span: 2.2,
            },
        );
        let retriever =
            UiStateRetriever::new(location.clone(), query_engine, permissions_rx, service_filter_rx);

        Harness {
            location,
            store,
            permissions,
            service_filter,
            retriever,
        }
    }

    fn ids(state: &UiState) -> Vec<String> {
        match state {
            UiState::Success(stops) => stops.iter().map(|s| s.stop_identifier.to_string()).collect(),
            _ => vec![],
        }
    }

    async fn quiet(states: &mut BoxStream<'static, UiState>) -> bool {
        tokio::time::timeout(Duration::from_millis(50), states.next())
            .await
            .is_err()
    }

    #[tokio::test]
    async fn test_no_location_feature() {
        let mut location = FakeLocationRepository::new();
        location.has_location_feature = false;
        let h = harness(location, FakeStopStore::new());

        let states: Vec<UiState> = h.retriever.ui_state_stream().collect().await;
        assert_eq!(states, vec![UiState::Error(UiError::NoLocationFeature)]);
    }

    #[tokio::test]
    async fn test_no_location_feature_ignores_permissions() {
        let mut location = FakeLocationRepository::new();
        location.has_location_feature = false;
        let h = harness(location, FakeStopStore::new());

        for permissions in [
            PermissionsState::new(Granted, Granted),
            PermissionsState::new(Ungranted, Ungranted),
            PermissionsState::new(Denied, Denied),
        ] {
            h.permissions.send_replace(Some(permissions));
            let mut states = h.retriever.ui_state_stream();
            assert_eq!(
                states.next().await,
                Some(UiState::Error(UiError::NoLocationFeature))
            );
            assert_eq!(states.next().await, None);
        }
    }

    #[tokio::test]
    async fn test_waits_for_first_permissions_result() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.permissions.send_replace(None);

        let mut states = h.retriever.ui_state_stream();
        assert!(quiet(&mut states).await);

        h.permissions
            .send_replace(Some(PermissionsState::new(Ungranted, Ungranted)));
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::InsufficientLocationPermissions))
        );
    }

    #[tokio::test]
    async fn test_permission_grant_moves_on_to_location() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.permissions.send_replace(Some(PermissionsState::new(Ungranted, Ungranted)));
        h.location.location_enabled.send_replace(false);

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::InsufficientLocationPermissions))
        );

        h.permissions.send_replace(Some(PermissionsState::new(Ungranted, Granted)));
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationOff))
        );
    }

    #[tokio::test]
    async fn test_denied_permissions_are_insufficient() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.permissions.send_replace(Some(PermissionsState::new(Denied, Ungranted)));

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::InsufficientLocationPermissions))
        );
    }

    #[tokio::test]
    async fn test_location_off_then_on_without_fix() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.location.location_enabled.send_replace(false);

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationOff))
        );

        h.location.location_enabled.send_replace(true);
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationUnknown))
        );
        assert!(quiet(&mut states).await);
    }

    #[tokio::test]
    async fn test_success_sorted_by_distance() {
        let location = FakeLocationRepository::new()
            .with_distance(|stop, device| stop.latitude - device.latitude);
        let h = harness(location, FakeStopStore::new());
        h.store.stops.send_replace(Some(vec![
            stop("3", 13.0, 20.5),
            stop("1", 11.0, 20.5),
            stop("2", 12.0, 20.5),
        ]));

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationUnknown))
        );

        h.location.push_fix(10.0, 20.5);
        let state = states.next().await.unwrap();
        assert_eq!(ids(&state), vec!["1", "2", "3"]);
        match state {
            UiState::Success(stops) => {
                assert_eq!(stops.iter().map(|s| s.distance).collect::<Vec<_>>(), vec![1, 2, 3])
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_or_empty_results_are_no_nearest_stops() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.location.push_fix(10.0, 20.5);

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationUnknown))
        );
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::NoNearestStops))
        );

        h.store.stops.send_replace(Some(vec![stop("1", 10.0, 20.5)]));
        assert!(matches!(states.next().await, Some(UiState::Success(_))));

        h.store.stops.send_replace(Some(vec![]));
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::NoNearestStops))
        );
    }

    #[tokio::test]
    async fn test_filter_change_requeries() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.store.stops.send_replace(Some(vec![stop("1", 10.0, 20.5)]));
        h.location.push_fix(10.0, 20.5);

        let mut states = h.retriever.ui_state_stream();
        next_matching(&mut states, |s| matches!(s, UiState::Success(_))).await;

        let filter: BTreeSet<ServiceName> = [ServiceName::new("1")].into_iter().collect();
        h.service_filter.send_replace(Some(filter.clone()));
        h.store.stops.send_replace(Some(vec![stop("2", 10.0, 20.5)]));
        let state = next_matching(&mut states, |s| ids(s) == vec!["2"]).await;
        assert!(matches!(state, UiState::Success(_)));

        let filters: Vec<_> = h
            .store
            .recorded_queries()
            .into_iter()
            .map(|(_, f)| f)
            .collect();
        assert_eq!(filters.first(), Some(&None));
        assert_eq!(filters.last(), Some(&Some(filter)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_fix_supersedes_in_flight_query() {
        fn delayed(id: &'static str, millis: u64) -> BoxStream<'static, Option<Vec<StopDetailsWithServices>>> {
            stream::once(async move {
                tokio::time::sleep(Duration::from_millis(millis)).await;
                Some(vec![stop(id, 0.0, 0.0)])
            })
            .boxed()
        }

        let store = FakeStopStore::new().with_responder(|bbox| {
            if bbox.min_latitude < 10.0 {
                delayed("from-first-fix", 100)
            } else {
                delayed("from-second-fix", 10)
            }
        });
        let h = harness(FakeLocationRepository::new(), store);

        let mut states = h.retriever.ui_state_stream();
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::LocationUnknown))
        );

        h.location.push_fix(10.0, 20.5);
        // First query is now in flight.
        assert!(quiet(&mut states).await);

        h.location.push_fix(40.0, -74.0);
        let state = states.next().await.unwrap();
        assert_eq!(ids(&state), vec!["from-second-fix"]);

        assert!(
            tokio::time::timeout(Duration::from_secs(1), states.next())
                .await
                .is_err()
        );
        assert_eq!(h.store.recorded_queries().len(), 2);
    }

    #[tokio::test]
    async fn test_losing_permission_cancels_query() {
        let h = harness(FakeLocationRepository::new(), FakeStopStore::new());
        h.store.stops.send_replace(Some(vec![stop("1", 10.0, 20.5)]));
        h.location.push_fix(10.0, 20.5);

        let mut states = h.retriever.ui_state_stream();
        next_matching(&mut states, |s| matches!(s, UiState::Success(_))).await;

        h.permissions.send_replace(Some(PermissionsState::new(Denied, Denied)));
        assert_eq!(
            states.next().await,
            Some(UiState::Error(UiError::InsufficientLocationPermissions))
        );

        // Store updates no longer reach the screen.
        h.store.stops.send_replace(Some(vec![stop("2", 10.0, 20.5)]));
        assert!(quiet(&mut states).await);
    }
}
