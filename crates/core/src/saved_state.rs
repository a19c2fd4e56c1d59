//! Screen-scoped state that has to survive process death.
//!
//! The host creates one [`SavedState`] when the screen attaches, writes
//! [`SavedState::to_json`] at its save points and restores from it with
//! [`SavedState::from_json`] after a restart.

use std::collections::BTreeSet;
use std::sync::Arc;

use nearby_stops_transit::{ServiceName, StopIdentifier};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::error::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SavedStateSnapshot {
    pub selected_stop: Option<StopIdentifier>,
    pub selected_services: Option<BTreeSet<ServiceName>>,
    pub asked_for_permissions: bool,
    pub asked_turn_on_gps: bool,
}

struct Inner {
    selected_stop: watch::Sender<Option<StopIdentifier>>,
    selected_services: watch::Sender<Option<BTreeSet<ServiceName>>>,
    asked_for_permissions: watch::Sender<bool>,
    asked_turn_on_gps: watch::Sender<bool>,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct SavedState {
    inner: Arc<Inner>,
}

impl Default for SavedState {
    fn default() -> Self {
        Self::restore(SavedStateSnapshot::default())
    }
}

impl SavedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(snapshot: SavedStateSnapshot) -> Self {
        Self {
            inner: Arc::new(Inner {
                selected_stop: watch::channel(snapshot.selected_stop).0,
                selected_services: watch::channel(snapshot.selected_services).0,
                asked_for_permissions: watch::channel(snapshot.asked_for_permissions).0,
                asked_turn_on_gps: watch::channel(snapshot.asked_turn_on_gps).0,
            }),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: SavedStateSnapshot = serde_json::from_str(json)?;
        debug!(?snapshot, "restoring saved state");
        Ok(Self::restore(snapshot))
    }

    pub fn snapshot(&self) -> SavedStateSnapshot {
        SavedStateSnapshot {
            selected_stop: self.selected_stop(),
            selected_services: self.selected_services(),
            asked_for_permissions: *self.inner.asked_for_permissions.borrow(),
            asked_turn_on_gps: *self.inner.asked_turn_on_gps.borrow(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    // ---- Selected stop ----

    pub fn selected_stop(&self) -> Option<StopIdentifier> {
        self.inner.selected_stop.borrow().clone()
    }

    pub fn set_selected_stop(&self, stop: Option<StopIdentifier>) {
        self.inner.selected_stop.send_if_modified(|current| {
            if *current == stop {
                return false;
            }
            *current = stop;
            true
        });
    }

    pub fn watch_selected_stop(&self) -> watch::Receiver<Option<StopIdentifier>> {
        self.inner.selected_stop.subscribe()
    }

    // ---- Selected services ----

    pub fn selected_services(&self) -> Option<BTreeSet<ServiceName>> {
        self.inner.selected_services.borrow().clone()
    }

    pub fn set_selected_services(&self, services: Option<BTreeSet<ServiceName>>) {
        self.inner.selected_services.send_if_modified(|current| {
            if *current == services {
                return false;
            }
            *current = services;
            true
        });
    }

    pub fn watch_selected_services(&self) -> watch::Receiver<Option<BTreeSet<ServiceName>>> {
        self.inner.selected_services.subscribe()
    }

    // ---- One-shot flags ----

    /// Sets the flag, returning `true` only for the call that flipped it.
    pub fn mark_asked_for_permissions(&self) -> bool {
        mark(&self.inner.asked_for_permissions)
    }

    pub fn asked_for_permissions(&self) -> bool {
        *self.inner.asked_for_permissions.borrow()
    }

    /// Sets the flag, returning `true` only for the call that flipped it.
    pub fn mark_asked_turn_on_gps(&self) -> bool {
        mark(&self.inner.asked_turn_on_gps)
    }

    pub fn asked_turn_on_gps(&self) -> bool {
        *self.inner.asked_turn_on_gps.borrow()
    }
}

fn mark(flag: &watch::Sender<bool>) -> bool {
    flag.send_if_modified(|asked| !std::mem::replace(asked, true))
}
