pub mod error;
pub mod location;
pub mod nearest_stops;
pub mod repositories;
pub mod saved_state;
pub mod stream;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use error::{CoreError, Result};
pub use saved_state::{SavedState, SavedStateSnapshot};

// Re-export transit from the transit crate
pub use nearby_stops_transit as transit;
