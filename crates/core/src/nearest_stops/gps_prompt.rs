use std::sync::Arc;

use tracing::debug;

use crate::location::PermissionsState;
use crate::nearest_stops::events::{EventSender, NearestStopsEvent};
use crate::repositories::LocationRepository;
use crate::saved_state::SavedState;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GpsPromptInputs {
    pub permissions: PermissionsState,
    pub is_gps_prompt_disabled: bool,
    pub has_gps_provider: bool,
    pub is_gps_provider_enabled: bool,
    pub asked_turn_on_gps: bool,
}

/// Whether the user should be asked to switch the GPS provider on.
pub fn should_prompt(inputs: &GpsPromptInputs) -> bool {
    inputs.permissions.has_any_location_permission()
        && inputs.has_gps_provider
        && !inputs.is_gps_prompt_disabled
        && !inputs.asked_turn_on_gps
        && !inputs.is_gps_provider_enabled
}

/// Emits [`NearestStopsEvent::ShowTurnOnGpsPrompt`] at most once per saved
/// state.
pub struct GpsPromptDecider {
    location: Arc<dyn LocationRepository>,
    saved_state: SavedState,
    events: EventSender,
}

impl GpsPromptDecider {
    pub fn new(
        location: Arc<dyn LocationRepository>,
        saved_state: SavedState,
        events: EventSender,
    ) -> Self {
        Self {
            location,
            saved_state,
            events,
        }
    }

    /// Returns whether the prompt was shown by this call.
    pub fn evaluate(&self, permissions: PermissionsState, is_gps_prompt_disabled: bool) -> bool {
        let inputs = GpsPromptInputs {
            permissions,
            is_gps_prompt_disabled,
            has_gps_provider: self.location.has_gps_provider(),
            is_gps_provider_enabled: self.location.is_gps_provider_enabled(),
            asked_turn_on_gps: self.saved_state.asked_turn_on_gps(),
        };

        if !should_prompt(&inputs) {
            debug!(?inputs, "not prompting to turn on gps");
            return false;
        }

        if !self.saved_state.mark_asked_turn_on_gps() {
            return false;
        }

        self.events.send(NearestStopsEvent::ShowTurnOnGpsPrompt);
        true
    }
}
