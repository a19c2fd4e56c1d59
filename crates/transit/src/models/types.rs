//! Core data types and enums for stop data.

use geo::Point;
use strum::EnumString;

use crate::identifiers::*;

// ============================================================================
// Enums
// ============================================================================

/// Eight-point compass bearing a stop faces, as recorded in the stop database.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, EnumString)]
#[strum(ascii_case_insensitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StopOrientation {
    #[strum(serialize = "n")]
    North,
    #[strum(serialize = "ne")]
    NorthEast,
    #[strum(serialize = "e")]
    East,
    #[strum(serialize = "se")]
    SouthEast,
    #[strum(serialize = "s")]
    South,
    #[strum(serialize = "sw")]
    SouthWest,
    #[strum(serialize = "w")]
    West,
    #[strum(serialize = "nw")]
    NorthWest,
    #[default]
    #[strum(disabled)]
    Unknown,
}

impl StopOrientation {
    /// Parse a compact store code (`"n"`, `"NE"`, ...). Missing or unrecognised
    /// codes map to [`StopOrientation::Unknown`].
    pub fn from_code(code: Option<&str>) -> Self {
        code.and_then(|c| c.trim().parse().ok())
            .unwrap_or(Self::Unknown)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A fix obtained from the device location subsystem.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl DeviceLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `geo` points are (x = longitude, y = latitude).
    pub fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// Display name of a stop
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StopName {
    pub name: String,
    pub locality: Option<String>,
}

impl StopName {
    pub fn new(name: impl Into<String>, locality: Option<String>) -> Self {
        Self {
            name: name.into(),
            locality,
        }
    }
}

/// A stop row joined with the comma-separated listing of services calling at it.
#[derive(Clone, Debug, PartialEq)]
pub struct StopDetailsWithServices {
    pub stop_identifier: StopIdentifier,
    pub stop_name: StopName,
    pub latitude: f64,
    pub longitude: f64,
    pub orientation: StopOrientation,
    pub service_listing: Option<String>,
}

impl StopDetailsWithServices {
    pub fn location(&self) -> DeviceLocation {
        DeviceLocation::new(self.latitude, self.longitude)
    }

    /// Individual service names from `service_listing`, in listing order.
    pub fn services(&self) -> impl Iterator<Item = ServiceName> + '_ {
        self.service_listing
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ServiceName::new)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    #[error("Invalid coordinates for stop {stop}: ({latitude}, {longitude})")]
    InvalidCoordinates {
        stop: StopIdentifier,
        latitude: f64,
        longitude: f64,
    },
}

pub type Result<T> = std::result::Result<T, TransitError>;
