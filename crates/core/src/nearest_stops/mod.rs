//! The nearby stops screen: state derivation, selection and one-shot events.

pub mod events;
pub mod gps_prompt;
pub mod query;
pub mod retriever;
pub mod selection;
pub mod ui_state;
pub mod view_model;

pub use events::{EventReceiver, EventSender, NearestStopsEvent, event_channel};
pub use gps_prompt::{GpsPromptDecider, GpsPromptInputs, should_prompt};
pub use query::{NearestStopQueryEngine, rank_stops};
pub use retriever::UiStateRetriever;
pub use selection::{
    SelectionController, UiArrivalAlertDropdownItem, UiFavouriteDropdownItem,
    UiProximityAlertDropdownItem, UiSelectedStopName,
};
pub use ui_state::{UiError, UiNearestStop, UiState};
pub use view_model::{NearestStopsDependencies, NearestStopsViewModel};
