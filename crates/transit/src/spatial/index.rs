//! R-tree nodes for spatial indexing.
//!
//! Wraps stops with their coordinates so bounding-box candidates can be found
//! without scanning the whole stop list. Points are stored as
//! `[longitude, latitude]`.

use std::sync::Arc;

use rstar::{RTreeObject, AABB};

use crate::models::StopDetailsWithServices;

#[derive(Clone)]
pub struct StopNode {
    pub stop: Arc<StopDetailsWithServices>,
    /// Position in the store's insertion order, used to keep query results stable.
    pub(crate) ordinal: usize,
    point: [f64; 2],
}

impl StopNode {
    pub fn new(ordinal: usize, stop: Arc<StopDetailsWithServices>) -> Self {
        let point = [stop.longitude, stop.latitude];
        Self {
            stop,
            ordinal,
            point,
        }
    }
}

impl RTreeObject for StopNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}
