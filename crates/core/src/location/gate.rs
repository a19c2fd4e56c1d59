use crate::location::permissions::PermissionsState;

/// Whether the location subsystem can be used at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateResult {
    NoFeature,
    InsufficientPermissions,
    Proceed,
}

pub fn evaluate_gate(has_location_feature: bool, permissions: &PermissionsState) -> GateResult {
    if !has_location_feature {
        GateResult::NoFeature
    } else if permissions.has_any_location_permission() {
        GateResult::Proceed
    } else {
        GateResult::InsufficientPermissions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::permissions::PermissionState::{self, *};

    const ALL: [PermissionState; 3] = [Granted, Ungranted, Denied];

    fn all_combinations() -> impl Iterator<Item = PermissionsState> {
        ALL.into_iter()
            .flat_map(|fine| ALL.into_iter().map(move |coarse| PermissionsState::new(fine, coarse)))
    }

    #[test]
    fn test_no_feature_wins_over_permissions() {
        for permissions in all_combinations() {
            assert_eq!(evaluate_gate(false, &permissions), GateResult::NoFeature);
        }
    }

    #[test]
    fn test_insufficient_iff_nothing_granted() {
        for permissions in all_combinations() {
            let nothing_granted =
                permissions.fine_location != Granted && permissions.coarse_location != Granted;
            let expected = if nothing_granted {
                GateResult::InsufficientPermissions
            } else {
                GateResult::Proceed
            };

            assert_eq!(evaluate_gate(true, &permissions), expected, "{permissions:?}");
        }
    }
}
