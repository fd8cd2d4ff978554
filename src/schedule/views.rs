use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::models::{Actor, Appointment, Role, Status};
use crate::schedule::time_format::SortKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Today,
    Tomorrow,
    Upcoming,
    Approved,
}

impl ViewKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Today => "today",
            ViewKind::Tomorrow => "tomorrow",
            ViewKind::Upcoming => "upcoming",
            ViewKind::Approved => "approved",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(ViewKind::Today),
            "tomorrow" => Ok(ViewKind::Tomorrow),
            "upcoming" => Ok(ViewKind::Upcoming),
            "approved" => Ok(ViewKind::Approved),
            other => Err(format!("unknown view: {other}")),
        }
    }
}

/// Only the approved list lets the caller choose; it defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/* ============================================================
   Selection
   ============================================================ */

/// Rows for one view, role-filtered and ordered. Sorting is stable, so rows
/// with equal keys keep their input order.
pub fn select_for_view<'a>(
    appointments: &'a [Appointment],
    view: ViewKind,
    actor: &Actor,
    reference_now: NaiveDateTime,
    direction: SortDirection,
) -> Vec<&'a Appointment> {
    select(appointments, view, actor, Some(reference_now.date()), direction)
}

/// Shared by every entry point. `today` is `None` only for callers that have
/// no reference time; dated buckets are then empty.
fn select<'a>(
    appointments: &'a [Appointment],
    view: ViewKind,
    actor: &Actor,
    today: Option<NaiveDate>,
    direction: SortDirection,
) -> Vec<&'a Appointment> {
    let tomorrow = today.and_then(|d| d.succ_opt());

    let mut rows: Vec<&Appointment> = appointments
        .iter()
        .filter(|a| in_bucket(a, view, today, tomorrow))
        .filter(|a| visible_to(a, actor))
        .collect();

    match view {
        ViewKind::Today => rows.sort_by_key(|a| a.sort_key()),
        ViewKind::Tomorrow => {}
        ViewKind::Upcoming => rows.sort_by(|a, b| compare_slots(a, b, SortDirection::Ascending)),
        ViewKind::Approved => rows.sort_by(|a, b| compare_slots(a, b, direction)),
    }

    debug!(view = %view, total = appointments.len(), shown = rows.len(), "view selected");
    rows
}

pub fn today_view<'a>(
    appointments: &'a [Appointment],
    actor: &Actor,
    reference_now: NaiveDateTime,
) -> Vec<&'a Appointment> {
    select_for_view(appointments, ViewKind::Today, actor, reference_now, SortDirection::Ascending)
}

pub fn tomorrow_view<'a>(
    appointments: &'a [Appointment],
    actor: &Actor,
    reference_now: NaiveDateTime,
) -> Vec<&'a Appointment> {
    select_for_view(appointments, ViewKind::Tomorrow, actor, reference_now, SortDirection::Ascending)
}

pub fn upcoming_view<'a>(
    appointments: &'a [Appointment],
    actor: &Actor,
    reference_now: NaiveDateTime,
) -> Vec<&'a Appointment> {
    select_for_view(appointments, ViewKind::Upcoming, actor, reference_now, SortDirection::Ascending)
}

/// The approved list has no date predicate, so no reference time is needed.
pub fn approved_view<'a>(
    appointments: &'a [Appointment],
    actor: &Actor,
    direction: SortDirection,
) -> Vec<&'a Appointment> {
    select(appointments, ViewKind::Approved, actor, None, direction)
}

fn in_bucket(
    appointment: &Appointment,
    view: ViewKind,
    today: Option<NaiveDate>,
    tomorrow: Option<NaiveDate>,
) -> bool {
    match view {
        ViewKind::Today => today.is_some() && appointment.date == today,
        ViewKind::Tomorrow => {
            tomorrow.is_some()
                && appointment.date == tomorrow
                && appointment.status == Some(Status::Approved)
        }
        ViewKind::Upcoming => match (appointment.date, tomorrow) {
            (Some(date), Some(tomorrow)) => date > tomorrow,
            _ => false,
        },
        ViewKind::Approved => appointment.status == Some(Status::Approved),
    }
}

/// Doctors see their own rows: matched by id, else by a case-insensitive
/// name substring. Everyone else sees the whole set.
fn visible_to(appointment: &Appointment, actor: &Actor) -> bool {
    if actor.role != Some(Role::Doctor) {
        return true;
    }

    let actor_id = actor.id.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let (Some(want), Some(have)) = (actor_id, appointment.doctor_id.as_deref()) {
        if have.trim() == want {
            return true;
        }
    }

    let actor_name = actor.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match (actor_name, appointment.doctor_name.as_deref()) {
        (Some(want), Some(have)) => have.to_lowercase().contains(&want.to_lowercase()),
        _ => false,
    }
}

/// (date, time) ordering. Rows without a date, and rows whose time is not
/// well formed, stay at the end whichever way the list runs.
fn compare_slots(a: &Appointment, b: &Appointment, direction: SortDirection) -> Ordering {
    let by_date = match (a.date, b.date) {
        (Some(x), Some(y)) => direction.apply(x.cmp(&y)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date.then_with(|| compare_times(a.sort_key(), b.sort_key(), direction))
}

fn compare_times(a: SortKey, b: SortKey, direction: SortDirection) -> Ordering {
    match (a.is_well_formed(), b.is_well_formed()) {
        (true, true) => direction.apply(a.cmp(&b)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.cmp(&b),
    }
}
