use std::sync::Arc;

use futures_util::future;
use futures_util::stream::{self, BoxStream, StreamExt};
use nearby_stops_transit::{StopIdentifier, StopName};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::debug;

use crate::nearest_stops::events::{EventSender, NearestStopsEvent};
use crate::repositories::{FeatureFlags, StopStatusRepository, StopStatusRepositories, StopStore};
use crate::saved_state::SavedState;
use crate::stream::{SwitchMapExt, combine_latest, distinct_until_changed, watch_stream};
use crate::tasks::BackgroundTasks;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiSelectedStopName {
    /// The name has been requested but not answered yet.
    Pending { stop_identifier: StopIdentifier },
    Resolved {
        stop_identifier: StopIdentifier,
        stop_name: Option<StopName>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiFavouriteDropdownItem {
    pub is_favourite: bool,
    pub is_enabled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiArrivalAlertDropdownItem {
    pub has_arrival_alert: bool,
    pub is_enabled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UiProximityAlertDropdownItem {
    pub has_proximity_alert: bool,
    pub is_enabled: bool,
}

/// The latest status a tracker has seen, tagged with the stop it belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct TrackedStatus {
    stop: Option<StopIdentifier>,
    status: Option<bool>,
}

impl TrackedStatus {
    fn for_stop(&self, stop: &StopIdentifier) -> Option<bool> {
        if self.stop.as_ref() == Some(stop) {
            self.status
        } else {
            None
        }
    }
}

/// Follows `repository` for whichever stop is selected.
fn spawn_tracker(
    runtime: &Handle,
    tasks: &mut BackgroundTasks,
    repository: Arc<dyn StopStatusRepository>,
    selection: watch::Receiver<Option<StopIdentifier>>,
) -> watch::Receiver<TrackedStatus> {
    let (tx, rx) = watch::channel(TrackedStatus::default());

    let mut statuses = watch_stream(selection)
        .switch_map(move |selected| match selected {
            Some(stop) => {
                let loading = TrackedStatus {
                    stop: Some(stop.clone()),
                    status: None,
                };
                let updates = repository.status_for(&stop).map(move |status| TrackedStatus {
                    stop: Some(stop.clone()),
                    status,
                });
                stream::once(future::ready(loading)).chain(updates).boxed()
            }
            None => stream::once(future::ready(TrackedStatus::default())).boxed(),
        })
        .boxed();

    tasks.push(runtime.spawn(async move {
        while let Some(status) = statuses.next().await {
            tx.send_replace(status);
        }
    }));

    rx
}

fn just<T: Send + 'static>(value: T) -> BoxStream<'static, T> {
    stream::once(future::ready(value)).boxed()
}

/// Tracks the single selected stop and everything the context menu shows
/// for it.
pub struct SelectionController {
    saved_state: SavedState,
    stops: Arc<dyn StopStore>,
    feature_flags: FeatureFlags,
    events: EventSender,
    favourite: watch::Receiver<TrackedStatus>,
    arrival_alert: watch::Receiver<TrackedStatus>,
    proximity_alert: watch::Receiver<TrackedStatus>,
    _tasks: BackgroundTasks,
}

impl SelectionController {
    pub fn new(
        runtime: &Handle,
        saved_state: SavedState,
        stops: Arc<dyn StopStore>,
        statuses: StopStatusRepositories,
        feature_flags: FeatureFlags,
        events: EventSender,
    ) -> Self {
        let mut tasks = BackgroundTasks::default();

        let favourite = spawn_tracker(
            runtime,
            &mut tasks,
            statuses.favourites,
            saved_state.watch_selected_stop(),
        );

        // Disabled features never load a status.
        let arrival_alert = if feature_flags.has_arrival_alert_feature {
            spawn_tracker(
                runtime,
                &mut tasks,
                statuses.arrival_alerts,
                saved_state.watch_selected_stop(),
            )
        } else {
            watch::channel(TrackedStatus::default()).1
        };
        let proximity_alert = if feature_flags.has_proximity_alert_feature {
            spawn_tracker(
                runtime,
                &mut tasks,
                statuses.proximity_alerts,
                saved_state.watch_selected_stop(),
            )
        } else {
            watch::channel(TrackedStatus::default()).1
        };

        Self {
            saved_state,
            stops,
            feature_flags,
            events,
            favourite,
            arrival_alert,
            proximity_alert,
            _tasks: tasks,
        }
    }

    pub fn selected_stop(&self) -> Option<StopIdentifier> {
        self.saved_state.selected_stop()
    }

    pub fn watch_selected_stop(&self) -> watch::Receiver<Option<StopIdentifier>> {
        self.saved_state.watch_selected_stop()
    }

    /// Selects `stop`, replacing any current selection. An empty identifier
    /// is not handled.
    pub fn select(&self, stop: &StopIdentifier) -> bool {
        if stop.is_empty() {
            return false;
        }

        debug!(%stop, "selecting stop");
        self.saved_state.set_selected_stop(Some(stop.clone()));
        true
    }

    /// Opens the stop, unless the selection mode is active.
    pub fn click(&self, stop: &StopIdentifier) {
        match self.saved_state.selected_stop() {
            None => self.events.send(NearestStopsEvent::ShowStopData(stop.clone())),
            Some(selected) => debug!(%stop, %selected, "click suppressed while a stop is selected"),
        }
    }

    pub fn unselect(&self) {
        self.saved_state.set_selected_stop(None);
    }

    pub fn is_context_menu_visible(&self) -> BoxStream<'static, bool> {
        distinct_until_changed(
            watch_stream(self.saved_state.watch_selected_stop()).map(|selected| selected.is_some()),
        )
        .boxed()
    }

    pub fn is_stop_map_item_shown(&self) -> BoxStream<'static, bool> {
        if !self.feature_flags.has_stop_map_feature {
            return just(false);
        }
        self.is_context_menu_visible()
    }

    /// Emits [`UiSelectedStopName::Pending`] as soon as a stop is selected,
    /// then the name as the store reports it.
    pub fn selected_stop_name(&self) -> BoxStream<'static, Option<UiSelectedStopName>> {
        let stops = self.stops.clone();
        watch_stream(self.saved_state.watch_selected_stop())
            .switch_map(move |selected| match selected {
                None => just(None),
                Some(stop) => {
                    let pending = UiSelectedStopName::Pending {
                        stop_identifier: stop.clone(),
                    };
                    let resolved = stops.name_for_stop(&stop).map(move |stop_name| {
                        Some(UiSelectedStopName::Resolved {
                            stop_identifier: stop.clone(),
                            stop_name,
                        })
                    });
                    stream::once(future::ready(Some(pending))).chain(resolved).boxed()
                }
            })
            .boxed()
    }

    pub fn favourite_item(&self) -> BoxStream<'static, Option<UiFavouriteDropdownItem>> {
        self.dropdown_item(&self.favourite, true, |is_favourite, is_enabled| {
            UiFavouriteDropdownItem {
                is_favourite,
                is_enabled,
            }
        })
    }

    pub fn arrival_alert_item(&self) -> BoxStream<'static, Option<UiArrivalAlertDropdownItem>> {
        self.dropdown_item(
            &self.arrival_alert,
            self.feature_flags.has_arrival_alert_feature,
            |has_arrival_alert, is_enabled| UiArrivalAlertDropdownItem {
                has_arrival_alert,
                is_enabled,
            },
        )
    }

    pub fn proximity_alert_item(&self) -> BoxStream<'static, Option<UiProximityAlertDropdownItem>> {
        self.dropdown_item(
            &self.proximity_alert,
            self.feature_flags.has_proximity_alert_feature,
            |has_proximity_alert, is_enabled| UiProximityAlertDropdownItem {
                has_proximity_alert,
                is_enabled,
            },
        )
    }

    /// `None` hides the item. While the status is loading the item is shown
    /// disabled with its state set to `false`.
    fn dropdown_item<T>(
        &self,
        tracker: &watch::Receiver<TrackedStatus>,
        shown: bool,
        make: fn(bool, bool) -> T,
    ) -> BoxStream<'static, Option<T>>
    where
        T: Clone + PartialEq + Send + 'static,
    {
        if !shown {
            return just(None);
        }

        let items = combine_latest(
            watch_stream(self.saved_state.watch_selected_stop()),
            watch_stream(tracker.clone()),
        )
        .map(move |(selected, tracked)| {
            let status = tracked.for_stop(&selected?);
            Some(make(status.unwrap_or(false), status.is_some()))
        });

        distinct_until_changed(items).boxed()
    }

    pub fn on_favourite_menu_clicked(&self) -> bool {
        self.toggle(
            &self.favourite,
            NearestStopsEvent::ShowAddFavouriteStop,
            NearestStopsEvent::ShowRemoveFavouriteStop,
        )
    }

    pub fn on_arrival_alert_menu_clicked(&self) -> bool {
        self.toggle(
            &self.arrival_alert,
            NearestStopsEvent::ShowAddArrivalAlert,
            NearestStopsEvent::ShowRemoveArrivalAlert,
        )
    }

    pub fn on_proximity_alert_menu_clicked(&self) -> bool {
        self.toggle(
            &self.proximity_alert,
            NearestStopsEvent::ShowAddProximityAlert,
            NearestStopsEvent::ShowRemoveProximityAlert,
        )
    }

    pub fn on_show_on_map_clicked(&self) -> bool {
        if !self.feature_flags.has_stop_map_feature {
            return false;
        }
        let Some(selected) = self.saved_state.selected_stop() else {
            return false;
        };

        self.events.send(NearestStopsEvent::ShowStopMap(selected));
        self.unselect();
        true
    }

    fn toggle(
        &self,
        tracker: &watch::Receiver<TrackedStatus>,
        add: fn(StopIdentifier) -> NearestStopsEvent,
        remove: fn(StopIdentifier) -> NearestStopsEvent,
    ) -> bool {
        let Some(selected) = self.saved_state.selected_stop() else {
            return false;
        };

        let status = tracker.borrow().for_stop(&selected);
        match status {
            Some(true) => self.events.send(remove(selected)),
            Some(false) => self.events.send(add(selected)),
            None => debug!(stop = %selected, "status not loaded yet, ignoring menu click"),
        }

        self.unselect();
        true
    }
}
