//! # nearby-stops-transit
//!
//! Stop data for the nearby stops screen.
//!
//! ## Features
//!
//! - **Typed identifiers**: cheap `Arc<str>` stop identifiers and service names
//! - **Stop models**: stop rows with names, orientation and service listings
//! - **Spatial queries**: haversine distances and bounding boxes
//! - **Bundled stops**: R-tree backed in-memory stop store
//!
//! ## Example
//!
//! ```
//! use nearby_stops_transit::prelude::*;
//!
//! let stop = StopDetailsWithServices {
//!     stop_identifier: StopIdentifier::new("36234842"),
//!     stop_name: StopName::new("Princes Street", Some("West End".into())),
//!     latitude: 55.9502,
//!     longitude: -3.2052,
//!     orientation: StopOrientation::from_code(Some("e")),
//!     service_listing: Some("3, 4, 25".into()),
//! };
//!
//! let store = StaticStopStore::from_data(vec![stop]).unwrap();
//!
//! let here = DeviceLocation::new(55.9500, -3.2050);
//! let nearby = store.stops_in_bounding_box(&BoundingBox::around(here, 0.01, 0.01), None);
//! assert_eq!(nearby.len(), 1);
//! ```

pub mod identifiers;
pub mod models;
pub mod provider;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::identifiers::*;
    pub use crate::models::types::*;
    pub use crate::provider::static_provider::StaticStopStore;
    pub use crate::spatial::queries::{distance_between, haversine_distance, BoundingBox};
}

pub use prelude::*;
