use nearby_stops_transit::{StopIdentifier, StopName, StopOrientation};

/// A stop ranked by distance from the device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiNearestStop {
    pub stop_identifier: StopIdentifier,
    pub stop_name: StopName,
    pub services: Option<String>,
    /// Rounded distance in the units of the location repository's distance function.
    pub distance: u32,
    pub orientation: StopOrientation,
    pub is_selected: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::IntoStaticStr)]
pub enum UiError {
    NoLocationFeature,
    InsufficientLocationPermissions,
    LocationOff,
    LocationUnknown,
    NoNearestStops,
}

impl UiError {
    /// Whether the error screen offers a button that can fix the problem.
    pub fn has_resolve_action(self) -> bool {
        matches!(self, Self::InsufficientLocationPermissions | Self::LocationOff)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum UiState {
    #[default]
    InProgress,
    /// Never empty, sorted by ascending distance.
    Success(Vec<UiNearestStop>),
    Error(UiError),
}

impl UiState {
    /// `None` and an empty result are both "no stops nearby".
    pub fn from_query_result(stops: Option<Vec<UiNearestStop>>) -> Self {
        match stops {
            Some(stops) if !stops.is_empty() => Self::Success(stops),
            _ => Self::Error(UiError::NoNearestStops),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(id: &str, distance: u32) -> UiNearestStop {
        UiNearestStop {
            stop_identifier: StopIdentifier::new(id),
            stop_name: StopName::new(format!("Stop {id}"), None),
            services: None,
            distance,
            orientation: StopOrientation::Unknown,
            is_selected: false,
        }
    }

    #[test]
    fn test_missing_and_empty_results_are_no_nearest_stops() {
        assert_eq!(
            UiState::from_query_result(None),
            UiState::Error(UiError::NoNearestStops)
        );
        assert_eq!(
            UiState::from_query_result(Some(vec![])),
            UiState::Error(UiError::NoNearestStops)
        );
    }

    #[test]
    fn test_non_empty_result_is_success() {
        let stops = vec![stop("1", 5)];
        assert_eq!(
            UiState::from_query_result(Some(stops.clone())),
            UiState::Success(stops)
        );
    }

    #[test]
    fn test_resolve_actions() {
        assert!(UiError::InsufficientLocationPermissions.has_resolve_action());
        assert!(UiError::LocationOff.has_resolve_action());
        assert!(!UiError::NoLocationFeature.has_resolve_action());
        assert!(!UiError::LocationUnknown.has_resolve_action());
        assert!(!UiError::NoNearestStops.has_resolve_action());
    }
}
