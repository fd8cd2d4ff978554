use crate::models::{Action, Role, Status};
use crate::schedule::transitions;

/// Controls offered for a (normalized) status. Roles that cannot manage
/// appointments get nothing.
pub(crate) fn actions_for(status: Option<Status>, role: Option<Role>) -> Vec<Action> {
    if !role.is_some_and(Role::can_manage) {
        return Vec::new();
    }
    match status {
        Some(Status::Approved) => vec![Action::MarkAsDone, Action::MoveToPending, Action::Reject],
        Some(Status::Pending) => vec![Action::Approve, Action::Reject],
        Some(Status::Done) => vec![Action::MoveToPending, Action::Reject],
        // unknown or rejected: never offer Approve/Done
        Some(Status::Rejected) | None => vec![Action::Revert, Action::Reject],
    }
}

/// Ordered action list for a raw status string and role name.
pub fn available_actions(status: &str, role: &str) -> Vec<Action> {
    actions_for(Status::normalize(status), Role::parse(role))
}

/// Whether a host may run `action` here. Besides the listed controls,
/// "Undo visit" stays reachable on done appointments: hosts surface it
/// next to the finished visit instead of in the action list.
pub(crate) fn is_permitted(status: Option<Status>, role: Option<Role>, action: Action) -> bool {
    if actions_for(status, role).contains(&action) {
        return true;
    }
    action == Action::UndoVisit
        && role.is_some_and(Role::can_manage)
        && transitions::is_defined(status, action)
}
