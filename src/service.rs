use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::models::{Action, Actor, Appointment};
use crate::repository::{AppointmentRepository, VisitChange};
use crate::schedule::actions::{actions_for, is_permitted};
use crate::schedule::transitions::{TransitionOutcome, apply_transition};
use crate::schedule::views::{SortDirection, ViewKind, select_for_view};

/// Runs the engine against fresh repository snapshots: every query and
/// every action starts from `list()`, then writes go back through the
/// repository. Nothing is cached between calls.
pub struct ScheduleService<R> {
    repo: R,
}

impl<R: AppointmentRepository> ScheduleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub async fn view(
        &self,
        kind: ViewKind,
        actor: &Actor,
        now: NaiveDateTime,
        direction: SortDirection,
    ) -> Result<Vec<Appointment>, ServiceError> {
        let snapshot = self.repo.list().await?;
        Ok(select_for_view(&snapshot, kind, actor, now, direction)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn actions(&self, id: &str, actor: &Actor) -> Result<Vec<Action>, ServiceError> {
        let snapshot = self.repo.list().await?;
        let appointment = find(&snapshot, id)?;
        Ok(actions_for(appointment.status, actor.role))
    }

    /// Authorize, transition, then persist the status and any done-visit change
    /// in one repository write.
    pub async fn perform(
        &self,
        id: &str,
        action: Action,
        actor: &Actor,
    ) -> Result<TransitionOutcome, ServiceError> {
        let snapshot = self.repo.list().await?;
        let appointment = find(&snapshot, id)?;

        if !is_permitted(appointment.status, actor.role, action) {
            let role = actor.role.map_or("unknown", |r| r.as_str()).to_string();
            warn!(appointment_id = id, %role, %action, "action not permitted");
            return Err(ServiceError::NotPermitted {
                id: id.to_string(),
                role,
                action,
            });
        }

        let done_visits = self.repo.done_visits().await?;
        let outcome = apply_transition(appointment, action, &done_visits)?;

        let visit = match (done_visits.contains(id), outcome.new_done_visits.contains(id)) {
            (false, true) => VisitChange::Mark,
            (true, false) => VisitChange::Unmark,
            _ => VisitChange::Keep,
        };
        self.repo.apply(id, outcome.new_status, visit).await?;

        info!(appointment_id = id, %action, status = %outcome.new_status, "appointment updated");
        Ok(outcome)
    }
}

fn find<'a>(snapshot: &'a [Appointment], id: &str) -> Result<&'a Appointment, ServiceError> {
    snapshot
        .iter()
        .find(|a| a.id == id)
        .ok_or_else(|| ServiceError::NotFound(id.to_string()))
}
