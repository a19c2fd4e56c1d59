use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use futures_util::future;
use futures_util::stream::{BoxStream, StreamExt};
use nearby_stops_transit::{ServiceName, StopIdentifier};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::error::Result;
use crate::location::PermissionsState;
use crate::nearest_stops::events::{EventReceiver, EventSender, NearestStopsEvent, event_channel};
use crate::nearest_stops::gps_prompt::GpsPromptDecider;
use crate::nearest_stops::query::NearestStopQueryEngine;
use crate::nearest_stops::retriever::UiStateRetriever;
use crate::nearest_stops::selection::{
    SelectionController, UiArrivalAlertDropdownItem, UiFavouriteDropdownItem,
    UiProximityAlertDropdownItem, UiSelectedStopName,
};
use crate::nearest_stops::ui_state::{UiError, UiNearestStop, UiState};
use crate::repositories::{
    FeatureFlags, LocationRepository, NearestStopsConfig, PreferenceRepository, ServiceCatalog,
    StopStatusRepositories, StopStore,
};
use crate::saved_state::SavedState;
use crate::stream::{combine_latest, distinct_until_changed, watch_stream};
use crate::tasks::BackgroundTasks;

/// Everything the screen reads from the outside world.
#[derive(Clone)]
pub struct NearestStopsDependencies {
    pub location: Arc<dyn LocationRepository>,
    pub stops: Arc<dyn StopStore>,
    pub services: Arc<dyn ServiceCatalog>,
    pub statuses: StopStatusRepositories,
    pub preferences: Arc<dyn PreferenceRepository>,
    pub feature_flags: FeatureFlags,
    pub config: NearestStopsConfig,
}

/// State and intents of the nearby stops screen.
///
/// Pipelines run on the tokio runtime that was current at construction and
/// stop when the view model is dropped.
pub struct NearestStopsViewModel {
    services: Arc<dyn ServiceCatalog>,
    saved_state: SavedState,
    /// `None` until the host reports its first permissions result.
    permissions: watch::Sender<Option<PermissionsState>>,
    ui_state: watch::Receiver<UiState>,
    selection: SelectionController,
    events: EventSender,
    event_receiver: Mutex<Option<EventReceiver>>,
    _tasks: BackgroundTasks,
}

impl NearestStopsViewModel {
    pub fn new(deps: NearestStopsDependencies, saved_state: SavedState) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let (events, event_receiver) = event_channel();
        let (permissions, _) = watch::channel(None);
        let mut tasks = BackgroundTasks::default();

        let query_engine =
            NearestStopQueryEngine::new(deps.stops.clone(), deps.location.clone(), deps.config);
        let retriever = UiStateRetriever::new(
            deps.location.clone(),
            query_engine,
            permissions.subscribe(),
            saved_state.watch_selected_services(),
        );

        let (ui_state_tx, ui_state) = watch::channel(UiState::InProgress);
        let mut states = retriever.ui_state_stream();
        tasks.push(runtime.spawn(async move {
            while let Some(state) = states.next().await {
                ui_state_tx.send_replace(state);
            }
            // Keep the last state observable.
            ui_state_tx.closed().await;
        }));

        tasks.push(runtime.spawn(request_permissions_effect(
            deps.location.has_location_feature(),
            reported_permissions(&permissions),
            saved_state.clone(),
            events.clone(),
        )));

        let decider = GpsPromptDecider::new(deps.location.clone(), saved_state.clone(), events.clone());
        let gps_inputs = combine_latest(
            reported_permissions(&permissions),
            deps.preferences.is_gps_prompt_disabled(),
        );
        tasks.push(runtime.spawn(gps_inputs.for_each(move |(permissions, disabled)| {
            decider.evaluate(permissions, disabled);
            future::ready(())
        })));

        let selection = SelectionController::new(
            &runtime,
            saved_state.clone(),
            deps.stops,
            deps.statuses,
            deps.feature_flags,
            events.clone(),
        );

        info!(flags = ?deps.feature_flags, config = ?deps.config, "nearest stops view model started");

        Ok(Self {
            services: deps.services,
            saved_state,
            permissions,
            ui_state,
            selection,
            events,
            event_receiver: Mutex::new(Some(event_receiver)),
            _tasks: tasks,
        })
    }

    pub fn saved_state(&self) -> &SavedState {
        &self.saved_state
    }

    /// The single consumer of one-shot events. `None` once taken.
    pub fn take_events(&self) -> Option<EventReceiver> {
        self.event_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    // ---- State ----

    pub fn current_ui_state(&self) -> UiState {
        self.ui_state.borrow().clone()
    }

    pub fn ui_state(&self) -> BoxStream<'static, UiState> {
        watch_stream(self.ui_state.clone())
    }

    /// The ranked stops with the selection applied, `None` outside of
    /// [`UiState::Success`].
    pub fn nearest_stops(&self) -> BoxStream<'static, Option<Vec<UiNearestStop>>> {
        let stops = combine_latest(
            watch_stream(self.ui_state.clone()),
            watch_stream(self.selection.watch_selected_stop()),
        )
        .map(|(state, selected)| match state {
            UiState::Success(stops) => Some(
                stops
                    .into_iter()
                    .map(|stop| UiNearestStop {
                        is_selected: selected.as_ref() == Some(&stop.stop_identifier),
                        ..stop
                    })
                    .collect(),
            ),
            _ => None,
        });

        distinct_until_changed(stops).boxed()
    }

    /// The filter can be used once there are services to choose from.
    pub fn is_filter_enabled(&self) -> BoxStream<'static, bool> {
        let enabled = self
            .services
            .all_service_names()
            .map(|services| services.is_some_and(|services| !services.is_empty()));

        distinct_until_changed(enabled).boxed()
    }

    pub fn is_context_menu_visible(&self) -> BoxStream<'static, bool> {
        self.selection.is_context_menu_visible()
    }

    pub fn selected_stop_name(&self) -> BoxStream<'static, Option<UiSelectedStopName>> {
        self.selection.selected_stop_name()
    }

    pub fn favourite_item(&self) -> BoxStream<'static, Option<UiFavouriteDropdownItem>> {
        self.selection.favourite_item()
    }

    pub fn arrival_alert_item(&self) -> BoxStream<'static, Option<UiArrivalAlertDropdownItem>> {
        self.selection.arrival_alert_item()
    }

    pub fn proximity_alert_item(&self) -> BoxStream<'static, Option<UiProximityAlertDropdownItem>> {
        self.selection.proximity_alert_item()
    }

    pub fn is_stop_map_item_shown(&self) -> BoxStream<'static, bool> {
        self.selection.is_stop_map_item_shown()
    }

    // ---- Intents ----

    pub fn on_stop_clicked(&self, stop: &StopIdentifier) {
        self.selection.click(stop);
    }

    pub fn on_stop_long_clicked(&self, stop: &StopIdentifier) -> bool {
        self.selection.select(stop)
    }

    pub fn on_unselect(&self) {
        self.selection.unselect();
    }

    pub fn on_filter_clicked(&self) {
        self.events.send(NearestStopsEvent::ShowServicesChooser {
            selected_services: self.saved_state.selected_services(),
        });
    }

    pub fn on_services_chosen(&self, services: Option<BTreeSet<ServiceName>>) {
        debug!(?services, "services chosen");
        self.saved_state.set_selected_services(services);
    }

    pub fn on_favourite_menu_clicked(&self) -> bool {
        self.selection.on_favourite_menu_clicked()
    }

    pub fn on_arrival_alert_menu_clicked(&self) -> bool {
        self.selection.on_arrival_alert_menu_clicked()
    }

    pub fn on_proximity_alert_menu_clicked(&self) -> bool {
        self.selection.on_proximity_alert_menu_clicked()
    }

    pub fn on_show_on_map_clicked(&self) -> bool {
        self.selection.on_show_on_map_clicked()
    }

    pub fn on_resolve_error_clicked(&self) {
        match self.current_ui_state() {
            UiState::Error(UiError::InsufficientLocationPermissions) => {
                self.events.send(NearestStopsEvent::RequestLocationPermissions)
            }
            UiState::Error(UiError::LocationOff) => {
                self.events.send(NearestStopsEvent::ShowLocationSettings)
            }
            state => debug!(?state, "nothing to resolve"),
        }
    }

    pub fn on_permissions_result(&self, permissions: PermissionsState) {
        let changed = self.permissions.send_if_modified(|current| {
            if *current == Some(permissions) {
                return false;
            }
            *current = Some(permissions);
            true
        });
        debug!(?permissions, changed, "permissions result");
    }

    pub fn on_location_settings_unavailable(&self) {
        self.events
            .send(NearestStopsEvent::ShowLocationSettingsUnavailable);
    }
}

fn reported_permissions(
    permissions: &watch::Sender<Option<PermissionsState>>,
) -> BoxStream<'static, PermissionsState> {
    watch_stream(permissions.subscribe())
        .filter_map(future::ready)
        .boxed()
}

/// Asks for location permissions once, while nothing has been granted or
/// denied yet.
async fn request_permissions_effect(
    has_location_feature: bool,
    mut permissions: BoxStream<'static, PermissionsState>,
    saved_state: SavedState,
    events: EventSender,
) {
    if !has_location_feature {
        return;
    }

    while let Some(permissions) = permissions.next().await {
        if permissions.is_fully_ungranted() && saved_state.mark_asked_for_permissions() {
            events.send(NearestStopsEvent::RequestLocationPermissions);
        }
    }
}
