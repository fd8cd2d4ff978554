use tracing::{debug, warn};

use crate::error::TransitionError;
use crate::models::{Action, Appointment, DoneVisits, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub new_status: Status,
    pub new_done_visits: DoneVisits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitEffect {
    Keep,
    Mark,
    Unmark,
}

/// Transition table. Rejected has no way out.
fn next_state(from: Status, action: Action) -> Option<(Status, VisitEffect)> {
    match (from, action) {
        (Status::Pending, Action::Approve) => Some((Status::Approved, VisitEffect::Keep)),
        (Status::Approved, Action::MarkAsDone) => Some((Status::Done, VisitEffect::Mark)),
        (Status::Approved | Status::Done, Action::MoveToPending | Action::Revert) => {
            Some((Status::Pending, VisitEffect::Keep))
        }
        (Status::Done, Action::UndoVisit) => Some((Status::Approved, VisitEffect::Unmark)),
        (Status::Pending | Status::Approved | Status::Done, Action::Reject) => {
            Some((Status::Rejected, VisitEffect::Keep))
        }
        _ => None,
    }
}

pub(crate) fn is_defined(from: Option<Status>, action: Action) -> bool {
    from.and_then(|s| next_state(s, action)).is_some()
}

/// Validate `action` against the appointment's current status, then compute
/// the new status and done-visit set. Inputs are never modified; on error
/// nothing has been computed.
pub fn apply_transition(
    appointment: &Appointment,
    action: Action,
    done_visits: &DoneVisits,
) -> Result<TransitionOutcome, TransitionError> {
    let Some((new_status, effect)) = appointment.status.and_then(|s| next_state(s, action)) else {
        let from = appointment
            .status
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());
        warn!(appointment_id = %appointment.id, %from, %action, "transition refused");
        return Err(TransitionError::InvalidTransition { from, action });
    };

    let mut new_done_visits = done_visits.clone();
    match effect {
        VisitEffect::Keep => {}
        VisitEffect::Mark => {
            new_done_visits.insert(appointment.id.clone());
        }
        VisitEffect::Unmark => {
            new_done_visits.remove(&appointment.id);
        }
    }

    debug!(appointment_id = %appointment.id, %action, to = %new_status, "transition computed");
    Ok(TransitionOutcome {
        new_status,
        new_done_visits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appt(id: &str, status: Status) -> Appointment {
        let mut a = Appointment::new(id);
        a.status = Some(status);
        a
    }

    fn status_after(from: Status, action: Action) -> Result<Status, TransitionError> {
        apply_transition(&appt("1", from), action, &DoneVisits::new()).map(|o| o.new_status)
    }

    #[test]
    fn pending_approve() {
        let out = apply_transition(&appt("1", Status::Pending), Action::Approve, &DoneVisits::new())
            .unwrap();
        assert_eq!(out.new_status, Status::Approved);
        assert!(out.new_done_visits.is_empty());
    }

    #[test]
    fn table() {
        let cases = [
            (Status::Approved, Action::MoveToPending, Status::Pending),
            (Status::Approved, Action::Revert, Status::Pending),
            (Status::Done, Action::MoveToPending, Status::Pending),
            (Status::Done, Action::Revert, Status::Pending),
            (Status::Pending, Action::Reject, Status::Rejected),
            (Status::Approved, Action::Reject, Status::Rejected),
            (Status::Done, Action::Reject, Status::Rejected),
        ];
        for (from, action, to) in cases {
            assert_eq!(status_after(from, action), Ok(to), "{from} + {action}");
        }
    }

    #[test]
    fn mark_done_and_undo_track_visits() {
        let visits: DoneVisits = ["other".to_string()].into_iter().collect();

        let done = apply_transition(&appt("7", Status::Approved), Action::MarkAsDone, &visits)
            .unwrap();
        assert_eq!(done.new_status, Status::Done);
        assert!(done.new_done_visits.contains("7"));
        assert!(done.new_done_visits.contains("other"));

        let undone =
            apply_transition(&appt("7", Status::Done), Action::UndoVisit, &done.new_done_visits)
                .unwrap();
        assert_eq!(undone.new_status, Status::Approved);
        assert!(!undone.new_done_visits.contains("7"));
        assert!(undone.new_done_visits.contains("other"));
    }

    #[test]
    fn approve_from_done_is_refused_without_touching_visits() {
        let visits: DoneVisits = ["3".to_string()].into_iter().collect();
        let before = visits.clone();
        let err = apply_transition(&appt("3", Status::Done), Action::Approve, &visits).unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: "done".into(),
                action: Action::Approve
            }
        );
        assert_eq!(visits, before);
    }

    #[test]
    fn rejected_is_terminal() {
        for action in Action::ALL {
            assert!(status_after(Status::Rejected, action).is_err(), "{action}");
        }
    }

    #[test]
    fn unknown_status_accepts_nothing() {
        let mut a = Appointment::new("x");
        a.status = None;
        for action in Action::ALL {
            assert!(apply_transition(&a, action, &DoneVisits::new()).is_err());
            assert!(!is_defined(None, action));
        }
    }
}
