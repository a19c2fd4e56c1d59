use std::collections::BTreeSet;

use nearby_stops_transit::{ServiceName, StopIdentifier};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One-shot instructions for the presentation layer.
///
/// Each event is delivered to a single consumer exactly once and is never
/// replayed to later subscribers.
#[derive(Clone, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum NearestStopsEvent {
    RequestLocationPermissions,
    ShowLocationSettings,
    /// The system location settings could not be opened.
    ShowLocationSettingsUnavailable,
    ShowTurnOnGpsPrompt,
    ShowStopData(StopIdentifier),
    ShowServicesChooser {
        selected_services: Option<BTreeSet<ServiceName>>,
    },
    ShowAddFavouriteStop(StopIdentifier),
    ShowRemoveFavouriteStop(StopIdentifier),
    ShowAddArrivalAlert(StopIdentifier),
    ShowRemoveArrivalAlert(StopIdentifier),
    ShowAddProximityAlert(StopIdentifier),
    ShowRemoveProximityAlert(StopIdentifier),
    ShowStopMap(StopIdentifier),
}

#[derive(Clone, Debug)]
pub struct EventSender(mpsc::UnboundedSender<NearestStopsEvent>);

pub type EventReceiver = mpsc::UnboundedReceiver<NearestStopsEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), rx)
}

impl EventSender {
    pub fn send(&self, event: NearestStopsEvent) {
        let kind: &'static str = (&event).into();
        debug!(event = kind, "emitting event");

        if self.0.send(event).is_err() {
            warn!(event = kind, "event dropped, nobody is listening");
        }
    }
}
