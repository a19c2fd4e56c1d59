use std::sync::Arc;

use futures_util::stream::{BoxStream, StreamExt};
use nearby_stops_core::nearest_stops::{
    NearestStopsDependencies, NearestStopsViewModel, UiArrivalAlertDropdownItem,
    UiFavouriteDropdownItem, UiNearestStop, UiProximityAlertDropdownItem, UiSelectedStopName,
};
use nearby_stops_core::repositories::StopStatusRepositories;
use nearby_stops_core::tasks::BackgroundTasks;
use nearby_stops_core::{CoreError, SavedState};
use nearby_stops_transit::{DeviceLocation, StopIdentifier};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::host::{
    HostLocation, HostPreferences, HostStatusRepository, HostStopStore, StopDatabase,
    StopStatusSource,
};
use crate::logging::setup_logging;
use crate::records::{
    MenuItem, NearestStop, Permissions, ScreenState, SelectedStopName, SessionConfig,
    SessionEvent, StatusKind, service_set,
};

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum SessionError {
    #[error("failed to start the session runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Receives everything the screen should render. Called from a background
/// thread.
#[uniffi::export(with_foreign)]
pub trait SessionListener: Send + Sync {
    fn on_screen_state(&self, state: ScreenState);
    fn on_nearest_stops(&self, stops: Option<Vec<NearestStop>>);
    fn on_filter_enabled(&self, enabled: bool);
    fn on_context_menu_visible(&self, visible: bool);
    fn on_selected_stop_name(&self, name: Option<SelectedStopName>);
    fn on_favourite_item(&self, item: Option<MenuItem>);
    fn on_arrival_alert_item(&self, item: Option<MenuItem>);
    fn on_proximity_alert_item(&self, item: Option<MenuItem>);
    fn on_stop_map_item_shown(&self, shown: bool);
    fn on_event(&self, event: SessionEvent);
}

struct StatusVersions {
    favourites: watch::Sender<u64>,
    arrival_alerts: watch::Sender<u64>,
    proximity_alerts: watch::Sender<u64>,
}

impl StatusVersions {
    fn get(&self, kind: StatusKind) -> &watch::Sender<u64> {
        match kind {
            StatusKind::Favourite => &self.favourites,
            StatusKind::ArrivalAlert => &self.arrival_alerts,
            StatusKind::ProximityAlert => &self.proximity_alerts,
        }
    }
}

fn bump(version: &watch::Sender<u64>) {
    version.send_modify(|version| *version = version.wrapping_add(1));
}

fn forward<T, F>(runtime: &Handle, tasks: &mut BackgroundTasks, stream: BoxStream<'static, T>, f: F)
where
    T: Send + 'static,
    F: Fn(T) + Send + 'static,
{
    tasks.push(runtime.spawn(stream.for_each(move |item| {
        f(item);
        futures_util::future::ready(())
    })));
}

/// One attached nearby stops screen.
///
/// The host pushes location and permission signals in, forwards user
/// intents, and receives state through its [`SessionListener`]. Location is
/// reported as disabled until [`NearestStopsSession::set_location_enabled`]
/// says otherwise.
#[derive(uniffi::Object)]
pub struct NearestStopsSession {
    view_model: NearestStopsViewModel,
    location: Arc<HostLocation>,
    preferences: Arc<HostPreferences>,
    stop_data_version: watch::Sender<u64>,
    status_versions: StatusVersions,
    _forwarders: BackgroundTasks,
    // Dropped last so the tasks above are aborted first.
    _runtime: Runtime,
}

#[uniffi::export]
impl NearestStopsSession {
    #[uniffi::constructor]
    pub fn new(
        config: SessionConfig,
        database: Arc<dyn StopDatabase>,
        statuses: Arc<dyn StopStatusSource>,
        listener: Arc<dyn SessionListener>,
    ) -> Result<Arc<Self>, SessionError> {
        setup_logging(config.verbose_logging);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("nearby-stops")
            .enable_all()
            .build()?;

        let saved_state = match config.saved_state.as_deref() {
            Some(json) => SavedState::from_json(json)?,
            None => SavedState::new(),
        };

        let location = Arc::new(HostLocation::new(
            config.has_location_feature,
            config.has_gps_provider,
        ));
        let preferences = Arc::new(HostPreferences::new());
        let (stop_data_version, stop_data_rx) = watch::channel(0);
        let status_versions = StatusVersions {
            favourites: watch::channel(0).0,
            arrival_alerts: watch::channel(0).0,
            proximity_alerts: watch::channel(0).0,
        };

        let stops = Arc::new(HostStopStore::new(database, stop_data_rx));
        let status_repository = |kind| {
            Arc::new(HostStatusRepository::new(
                Arc::clone(&statuses),
                kind,
                status_versions.get(kind).subscribe(),
            ))
        };
        let deps = NearestStopsDependencies {
            location: location.clone(),
            stops: stops.clone(),
            services: stops,
            statuses: StopStatusRepositories {
                favourites: status_repository(StatusKind::Favourite),
                arrival_alerts: status_repository(StatusKind::ArrivalAlert),
                proximity_alerts: status_repository(StatusKind::ProximityAlert),
            },
            preferences: preferences.clone(),
            feature_flags: config.feature_flags(),
            config: config.nearest_stops_config(),
        };

        let view_model = {
            let _guard = runtime.enter();
            NearestStopsViewModel::new(deps, saved_state)?
        };

        let handle = runtime.handle().clone();
        let mut forwarders = BackgroundTasks::default();

        macro_rules! forward_to {
            ($stream:expr, $callback:ident, $convert:expr) => {{
                let listener = Arc::clone(&listener);
                forward(&handle, &mut forwarders, $stream, move |item| {
                    listener.$callback($convert(item))
                });
            }};
        }

        forward_to!(view_model.ui_state(), on_screen_state, ScreenState::from);
        forward_to!(view_model.nearest_stops(), on_nearest_stops, |stops: Option<Vec<UiNearestStop>>| {
            stops.map(|stops| stops.into_iter().map(NearestStop::from).collect())
        });
        forward_to!(view_model.is_filter_enabled(), on_filter_enabled, |enabled| enabled);
        forward_to!(view_model.is_context_menu_visible(), on_context_menu_visible, |visible| visible);
        forward_to!(view_model.selected_stop_name(), on_selected_stop_name, |name: Option<UiSelectedStopName>| {
            name.map(SelectedStopName::from)
        });
        forward_to!(view_model.favourite_item(), on_favourite_item, |item: Option<UiFavouriteDropdownItem>| {
            item.map(MenuItem::from)
        });
        forward_to!(view_model.arrival_alert_item(), on_arrival_alert_item, |item: Option<UiArrivalAlertDropdownItem>| {
            item.map(MenuItem::from)
        });
        forward_to!(view_model.proximity_alert_item(), on_proximity_alert_item, |item: Option<UiProximityAlertDropdownItem>| {
            item.map(MenuItem::from)
        });
        forward_to!(view_model.is_stop_map_item_shown(), on_stop_map_item_shown, |shown| shown);

        if let Some(mut events) = view_model.take_events() {
            let listener = Arc::clone(&listener);
            forwarders.push(handle.spawn(async move {
                while let Some(event) = events.recv().await {
                    listener.on_event(SessionEvent::from(event));
                }
            }));
        }

        info!("nearby stops session started");

        Ok(Arc::new(Self {
            view_model,
            location,
            preferences,
            stop_data_version,
            status_versions,
            _forwarders: forwarders,
            _runtime: runtime,
        }))
    }

    /// JSON to hand back through [`SessionConfig::saved_state`] after a restart.
    pub fn save_state(&self) -> Result<String, SessionError> {
        Ok(self.view_model.saved_state().to_json()?)
    }

    pub fn current_screen_state(&self) -> ScreenState {
        self.view_model.current_ui_state().into()
    }

    // ---- Host signals ----

    pub fn set_location_enabled(&self, enabled: bool) {
        debug!(enabled, "location enabled");
        self.location.set_location_enabled(enabled);
    }

    pub fn on_location_fix(&self, latitude: f64, longitude: f64) {
        self.location.push_fix(DeviceLocation::new(latitude, longitude));
    }

    pub fn set_gps_provider_enabled(&self, enabled: bool) {
        self.location.set_gps_provider_enabled(enabled);
    }

    pub fn set_gps_prompt_disabled(&self, disabled: bool) {
        self.preferences.set_gps_prompt_disabled(disabled);
    }

    pub fn on_permissions_result(&self, permissions: Permissions) {
        self.view_model.on_permissions_result(permissions.into());
    }

    /// Re-runs every stop query and name lookup.
    pub fn notify_stop_data_changed(&self) {
        bump(&self.stop_data_version);
    }

    pub fn notify_stop_status_changed(&self, kind: StatusKind) {
        bump(self.status_versions.get(kind));
    }

    // ---- Intents ----

    pub fn on_stop_clicked(&self, stop_identifier: String) {
        self.view_model
            .on_stop_clicked(&StopIdentifier::new(stop_identifier));
    }

    pub fn on_stop_long_clicked(&self, stop_identifier: String) -> bool {
        self.view_model
            .on_stop_long_clicked(&StopIdentifier::new(stop_identifier))
    }

    pub fn on_unselect(&self) {
        self.view_model.on_unselect();
    }

    pub fn on_filter_clicked(&self) {
        self.view_model.on_filter_clicked();
    }

    pub fn on_services_chosen(&self, services: Option<Vec<String>>) {
        self.view_model.on_services_chosen(service_set(services));
    }

    pub fn on_favourite_menu_clicked(&self) -> bool {
        self.view_model.on_favourite_menu_clicked()
    }

    pub fn on_arrival_alert_menu_clicked(&self) -> bool {
        self.view_model.on_arrival_alert_menu_clicked()
    }

    pub fn on_proximity_alert_menu_clicked(&self) -> bool {
        self.view_model.on_proximity_alert_menu_clicked()
    }

    pub fn on_show_on_map_clicked(&self) -> bool {
        self.view_model.on_show_on_map_clicked()
    }

    pub fn on_resolve_error_clicked(&self) {
        self.view_model.on_resolve_error_clicked();
    }

    pub fn on_location_settings_unavailable(&self) {
        self.view_model.on_location_settings_unavailable();
    }
}
