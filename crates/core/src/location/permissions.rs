use serde::{Deserialize, Serialize};

/// Grant state of a single runtime permission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    #[default]
    Ungranted,
    /// Permanently denied. Only the system settings screen can grant it now.
    Denied,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionsState {
    pub fine_location: PermissionState,
    pub coarse_location: PermissionState,
}

impl PermissionsState {
    pub fn new(fine_location: PermissionState, coarse_location: PermissionState) -> Self {
        Self {
            fine_location,
            coarse_location,
        }
    }

    /// Either location permission alone is enough to use location.
    pub fn has_any_location_permission(&self) -> bool {
        self.fine_location == PermissionState::Granted
            || self.coarse_location == PermissionState::Granted
    }

    /// Nothing has been granted or denied yet, so asking is still possible.
    pub fn is_fully_ungranted(&self) -> bool {
        self.fine_location == PermissionState::Ungranted
            && self.coarse_location == PermissionState::Ungranted
    }
}
