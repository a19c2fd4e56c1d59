//! Spatial query utilities for distance calculations.
//!
//! Uses Haversine formula for accurate distances on Earth's surface.

use geo::{HaversineDistance, Point};
use rstar::AABB;

use crate::models::DeviceLocation;

/// Calculate Haversine distance between two points in meters
pub fn haversine_distance(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2)
}

/// Haversine distance between two device locations in meters
pub fn distance_between(a: DeviceLocation, b: DeviceLocation) -> f64 {
    haversine_distance(a.to_point(), b.to_point())
}

/// Latitude/longitude rectangle used to pre-filter candidate stops.
///
/// Bounds are inclusive. No wrapping is done at the antimeridian.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    /// Box spanning `latitude_span` and `longitude_span` degrees either side of `center`.
    pub fn around(center: DeviceLocation, latitude_span: f64, longitude_span: f64) -> Self {
        Self {
            min_latitude: center.latitude - latitude_span,
            min_longitude: center.longitude - longitude_span,
            max_latitude: center.latitude + latitude_span,
            max_longitude: center.longitude + longitude_span,
        }
    }

    /// R-tree envelope in (longitude, latitude) order, matching [`DeviceLocation::to_point`].
    pub fn envelope(&self) -> AABB<[f64; 2]> {
        AABB::from_corners(
            [self.min_longitude, self.min_latitude],
            [self.max_longitude, self.max_latitude],
        )
    }
}
