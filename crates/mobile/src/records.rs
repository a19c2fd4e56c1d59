//! Plain data crossing the FFI boundary.

use std::collections::BTreeSet;

use nearby_stops_core::location::{PermissionState, PermissionsState};
use nearby_stops_core::nearest_stops::{
    NearestStopsEvent, UiArrivalAlertDropdownItem, UiError, UiFavouriteDropdownItem,
    UiNearestStop, UiProximityAlertDropdownItem, UiSelectedStopName, UiState,
};
use nearby_stops_core::repositories::{FeatureFlags, NearestStopsConfig};
use nearby_stops_transit::{
    ServiceName, StopDetailsWithServices, StopIdentifier, StopName, StopOrientation,
};

#[derive(Clone, Debug, uniffi::Record)]
pub struct SessionConfig {
    pub latitude_span: f64,
    pub longitude_span: f64,
    pub has_location_feature: bool,
    pub has_gps_provider: bool,
    pub has_arrival_alert_feature: bool,
    pub has_proximity_alert_feature: bool,
    pub has_stop_map_feature: bool,
    /// Output of `NearestStopsSession::save_state` from a previous process.
    pub saved_state: Option<String>,
    pub verbose_logging: bool,
}

impl SessionConfig {
    pub(crate) fn nearest_stops_config(&self) -> NearestStopsConfig {
        NearestStopsConfig {
            latitude_span: self.latitude_span,
            longitude_span: self.longitude_span,
        }
    }

    pub(crate) fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags {
            has_arrival_alert_feature: self.has_arrival_alert_feature,
            has_proximity_alert_feature: self.has_proximity_alert_feature,
            has_stop_map_feature: self.has_stop_map_feature,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum PermissionStatus {
    Granted,
    Ungranted,
    Denied,
}

impl From<PermissionStatus> for PermissionState {
    fn from(status: PermissionStatus) -> Self {
        match status {
            PermissionStatus::Granted => Self::Granted,
            PermissionStatus::Ungranted => Self::Ungranted,
            PermissionStatus::Denied => Self::Denied,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Record)]
pub struct Permissions {
    pub fine_location: PermissionStatus,
    pub coarse_location: PermissionStatus,
}

impl From<Permissions> for PermissionsState {
    fn from(permissions: Permissions) -> Self {
        PermissionsState::new(
            permissions.fine_location.into(),
            permissions.coarse_location.into(),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum StatusKind {
    Favourite,
    ArrivalAlert,
    ProximityAlert,
}

/// A stop row as the host's database returns it.
#[derive(Clone, Debug, PartialEq, uniffi::Record)]
pub struct Stop {
    pub stop_identifier: String,
    pub name: String,
    pub locality: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Compact compass code such as `"ne"`.
    pub orientation: Option<String>,
    pub service_listing: Option<String>,
}

impl From<Stop> for StopDetailsWithServices {
    fn from(stop: Stop) -> Self {
        StopDetailsWithServices {
            stop_identifier: StopIdentifier::new(&stop.stop_identifier),
            stop_name: StopName::new(stop.name, stop.locality),
            latitude: stop.latitude,
            longitude: stop.longitude,
            orientation: StopOrientation::from_code(stop.orientation.as_deref()),
            service_listing: stop.service_listing,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct StopDisplayName {
    pub name: String,
    pub locality: Option<String>,
}

impl From<StopDisplayName> for StopName {
    fn from(name: StopDisplayName) -> Self {
        StopName::new(name.name, name.locality)
    }
}

impl From<StopName> for StopDisplayName {
    fn from(name: StopName) -> Self {
        Self {
            name: name.name,
            locality: name.locality,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum Orientation {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
    Unknown,
}

impl From<StopOrientation> for Orientation {
    fn from(orientation: StopOrientation) -> Self {
        match orientation {
            StopOrientation::North => Self::North,
            StopOrientation::NorthEast => Self::NorthEast,
            StopOrientation::East => Self::East,
            StopOrientation::SouthEast => Self::SouthEast,
            StopOrientation::South => Self::South,
            StopOrientation::SouthWest => Self::SouthWest,
            StopOrientation::West => Self::West,
            StopOrientation::NorthWest => Self::NorthWest,
            StopOrientation::Unknown => Self::Unknown,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Record)]
pub struct NearestStop {
    pub stop_identifier: String,
    pub name: StopDisplayName,
    pub services: Option<String>,
    pub distance: u32,
    pub orientation: Orientation,
    pub is_selected: bool,
}

impl From<UiNearestStop> for NearestStop {
    fn from(stop: UiNearestStop) -> Self {
        Self {
            stop_identifier: stop.stop_identifier.to_string(),
            name: stop.stop_name.into(),
            services: stop.services,
            distance: stop.distance,
            orientation: stop.orientation.into(),
            is_selected: stop.is_selected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ScreenError {
    NoLocationFeature,
    InsufficientLocationPermissions,
    LocationOff,
    LocationUnknown,
    NoNearestStops,
}

impl From<UiError> for ScreenError {
    fn from(error: UiError) -> Self {
        match error {
            UiError::NoLocationFeature => Self::NoLocationFeature,
            UiError::InsufficientLocationPermissions => Self::InsufficientLocationPermissions,
            UiError::LocationOff => Self::LocationOff,
            UiError::LocationUnknown => Self::LocationUnknown,
            UiError::NoNearestStops => Self::NoNearestStops,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum ScreenState {
    InProgress,
    Success { stops: Vec<NearestStop> },
    Error { error: ScreenError, has_resolve_action: bool },
}

impl From<UiState> for ScreenState {
    fn from(state: UiState) -> Self {
        match state {
            UiState::InProgress => Self::InProgress,
            UiState::Success(stops) => Self::Success {
                stops: stops.into_iter().map(NearestStop::from).collect(),
            },
            UiState::Error(error) => Self::Error {
                error: error.into(),
                has_resolve_action: error.has_resolve_action(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum SelectedStopName {
    Pending {
        stop_identifier: String,
    },
    Resolved {
        stop_identifier: String,
        name: Option<StopDisplayName>,
    },
}

impl From<UiSelectedStopName> for SelectedStopName {
    fn from(name: UiSelectedStopName) -> Self {
        match name {
            UiSelectedStopName::Pending { stop_identifier } => Self::Pending {
                stop_identifier: stop_identifier.to_string(),
            },
            UiSelectedStopName::Resolved {
                stop_identifier,
                stop_name,
            } => Self::Resolved {
                stop_identifier: stop_identifier.to_string(),
                name: stop_name.map(StopDisplayName::from),
            },
        }
    }
}

/// A toggle in the context menu. `checked` is `false` while loading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, uniffi::Record)]
pub struct MenuItem {
    pub checked: bool,
    pub enabled: bool,
}

impl From<UiFavouriteDropdownItem> for MenuItem {
    fn from(item: UiFavouriteDropdownItem) -> Self {
        Self {
            checked: item.is_favourite,
            enabled: item.is_enabled,
        }
    }
}

impl From<UiArrivalAlertDropdownItem> for MenuItem {
    fn from(item: UiArrivalAlertDropdownItem) -> Self {
        Self {
            checked: item.has_arrival_alert,
            enabled: item.is_enabled,
        }
    }
}

impl From<UiProximityAlertDropdownItem> for MenuItem {
    fn from(item: UiProximityAlertDropdownItem) -> Self {
        Self {
            checked: item.has_proximity_alert,
            enabled: item.is_enabled,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, uniffi::Enum)]
pub enum SessionEvent {
    RequestLocationPermissions,
    ShowLocationSettings,
    ShowLocationSettingsUnavailable,
    ShowTurnOnGpsPrompt,
    ShowStopData { stop_identifier: String },
    ShowServicesChooser { selected_services: Option<Vec<String>> },
    ShowAddFavouriteStop { stop_identifier: String },
    ShowRemoveFavouriteStop { stop_identifier: String },
    ShowAddArrivalAlert { stop_identifier: String },
    ShowRemoveArrivalAlert { stop_identifier: String },
    ShowAddProximityAlert { stop_identifier: String },
    ShowRemoveProximityAlert { stop_identifier: String },
    ShowStopMap { stop_identifier: String },
}

impl From<NearestStopsEvent> for SessionEvent {
    fn from(event: NearestStopsEvent) -> Self {
        use NearestStopsEvent as E;

        match event {
            E::RequestLocationPermissions => Self::RequestLocationPermissions,
            E::ShowLocationSettings => Self::ShowLocationSettings,
            E::ShowLocationSettingsUnavailable => Self::ShowLocationSettingsUnavailable,
            E::ShowTurnOnGpsPrompt => Self::ShowTurnOnGpsPrompt,
            E::ShowStopData(stop) => Self::ShowStopData {
                stop_identifier: stop.to_string(),
            },
            E::ShowServicesChooser { selected_services } => Self::ShowServicesChooser {
                selected_services: selected_services
                    .map(|services| services.iter().map(ToString::to_string).collect()),
            },
            E::ShowAddFavouriteStop(stop) => Self::ShowAddFavouriteStop {
                stop_identifier: stop.to_string(),
            },
            E::ShowRemoveFavouriteStop(stop) => Self::ShowRemoveFavouriteStop {
                stop_identifier: stop.to_string(),
            },
            E::ShowAddArrivalAlert(stop) => Self::ShowAddArrivalAlert {
                stop_identifier: stop.to_string(),
            },
            E::ShowRemoveArrivalAlert(stop) => Self::ShowRemoveArrivalAlert {
                stop_identifier: stop.to_string(),
            },
            E::ShowAddProximityAlert(stop) => Self::ShowAddProximityAlert {
                stop_identifier: stop.to_string(),
            },
            E::ShowRemoveProximityAlert(stop) => Self::ShowRemoveProximityAlert {
                stop_identifier: stop.to_string(),
            },
            E::ShowStopMap(stop) => Self::ShowStopMap {
                stop_identifier: stop.to_string(),
            },
        }
    }
}

/// `None` stays `None`; an empty list stays an empty set.
pub(crate) fn service_set(services: Option<Vec<String>>) -> Option<BTreeSet<ServiceName>> {
    services.map(|services| services.into_iter().map(ServiceName::from).collect())
}
