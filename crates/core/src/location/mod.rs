//! Location permissions and the gate deciding whether location may be used.

pub mod gate;
pub mod permissions;

pub use gate::{GateResult, evaluate_gate};
pub use permissions::{PermissionState, PermissionsState};
