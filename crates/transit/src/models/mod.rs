//! Stop data models and types.

pub mod types;

// Re-exports for convenience
pub use types::{
    DeviceLocation, Result, StopDetailsWithServices, StopName, StopOrientation, TransitError,
};
