use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::schedule::time_format::{self, SortKey};
use crate::settings::DateTimeSettings;

/// Ids of appointments whose visit has been marked done.
pub type DoneVisits = BTreeSet<String>;

/* -------------------------
   Status
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Status {
    Pending,
    Approved,
    Done,
    Rejected,
}

impl Status {
    /// The one place raw status strings are interpreted.
    /// "accepted" is an older spelling of approved.
    pub fn normalize(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "approved" | "accepted" => Some(Status::Approved),
            "done" => Some(Status::Done),
            "rejected" => Some(Status::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Done => "done",
            Status::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/* -------------------------
   Roles
--------------------------*/

/// Clinic roles. Stored codes: 0 Patient, 1 Admin, 2 Manager, 3 Doctor, 4 Receptionist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Patient,
    Admin,
    Manager,
    Doctor,
    Receptionist,
}

impl Role {
    pub fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Role::Patient),
            1 => Some(Role::Admin),
            2 => Some(Role::Manager),
            3 => Some(Role::Doctor),
            4 => Some(Role::Receptionist),
            _ => None,
        }
    }

    /// Accepts a role name (any case) or its numeric code.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(code) = raw.parse::<i16>() {
            return Self::from_code(code);
        }
        match raw.to_ascii_lowercase().as_str() {
            "patient" => Some(Role::Patient),
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "doctor" => Some(Role::Doctor),
            "receptionist" => Some(Role::Receptionist),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Doctor => "doctor",
            Role::Receptionist => "receptionist",
        }
    }

    /// Admin-tier and clinical staff may change appointment status.
    pub fn can_manage(self) -> bool {
        matches!(
            self,
            Role::Admin | Role::Manager | Role::Doctor | Role::Receptionist
        )
    }
}

/// Who is looking at the schedule. `id`/`name` only matter for doctors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor {
    pub role: Option<Role>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl Actor {
    pub fn new(role: &str) -> Self {
        Self {
            role: Role::parse(role),
            ..Self::default()
        }
    }

    pub fn with_identity(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self.name = Some(name.into());
        self
    }
}

/* -------------------------
   Actions
--------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Approve,
    MarkAsDone,
    MoveToPending,
    Revert,
    UndoVisit,
    Reject,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Approve,
        Action::MarkAsDone,
        Action::MoveToPending,
        Action::Revert,
        Action::UndoVisit,
        Action::Reject,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Action::Approve => "Approve",
            Action::MarkAsDone => "Mark as Done",
            Action::MoveToPending => "Move to Pending",
            Action::Revert => "Revert",
            Action::UndoVisit => "Undo visit",
            Action::Reject => "Reject",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Action::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown action: {wanted}"))
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/* -------------------------
   Appointment
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(alias = "_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub patient_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub patient_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub doctor_id: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<Status>,
    #[serde(default)]
    pub appointment_mode: Option<String>,
    #[serde(default)]
    pub appointment_type: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

impl Appointment {
    /// A bare pending appointment; handy for hosts and tests.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            patient_name: None,
            patient_email: None,
            patient_phone: None,
            doctor_id: None,
            doctor_name: None,
            date: None,
            time: None,
            status: Some(Status::Pending),
            appointment_mode: None,
            appointment_type: None,
            source: None,
        }
    }

    pub fn display_date(&self, settings: &DateTimeSettings) -> String {
        time_format::format_date_for_display(self.date, settings)
    }

    pub fn display_time(&self, settings: &DateTimeSettings) -> String {
        time_format::format_time_for_display(self.time.as_deref(), settings)
    }

    pub(crate) fn sort_key(&self) -> SortKey {
        time_format::parse_sort_key(self.time.as_deref())
    }
}

/* -------------------------
   Boundary decoding
--------------------------*/

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "appointment id must be a string or number, got {other}"
        ))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let Some(raw) = lenient_string(d)? else {
        return Ok(None);
    };
    let parsed = time_format::parse_calendar_date(&raw);
    if parsed.is_none() && !raw.trim().is_empty() {
        tracing::warn!(date = %raw, "unparseable appointment date, treating as missing");
    }
    Ok(parsed)
}

fn lenient_status<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Status>, D::Error> {
    let Some(raw) = lenient_string(d)? else {
        return Ok(None);
    };
    let status = Status::normalize(&raw);
    if status.is_none() {
        tracing::warn!(status = %raw, "unrecognized appointment status");
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_is_approved() {
        assert_eq!(Status::normalize("Accepted"), Some(Status::Approved));
        assert_eq!(Status::normalize(" APPROVED "), Some(Status::Approved));
        assert_eq!(Status::normalize("cancelled"), None);
    }

    #[test]
    fn role_parses_names_and_codes() {
        assert_eq!(Role::parse("Doctor"), Some(Role::Doctor));
        assert_eq!(Role::parse("4"), Some(Role::Receptionist));
        assert_eq!(Role::parse("9"), None);
        assert!(!Role::Patient.can_manage());
        assert!(Role::Doctor.can_manage());
    }

    #[test]
    fn action_labels_round_trip() {
        assert_eq!("mark as done".parse::<Action>(), Ok(Action::MarkAsDone));
        assert_eq!("Undo visit".parse::<Action>(), Ok(Action::UndoVisit));
        assert!("Cancel".parse::<Action>().is_err());
    }

    #[test]
    fn decodes_loose_rows() {
        let row = serde_json::json!({
            "_id": 42,
            "doctorId": 5,
            "date": "2024-03-05T09:00:00.000Z",
            "time": "2:30 PM",
            "status": "accepted",
            "patientName": "Ana"
        });
        let appt: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appt.id, "42");
        assert_eq!(appt.doctor_id.as_deref(), Some("5"));
        assert_eq!(appt.date, NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(appt.status, Some(Status::Approved));
    }

    #[test]
    fn bad_date_and_status_do_not_fail_the_row() {
        let row = serde_json::json!({
            "id": "a1",
            "date": "next tuesday",
            "status": "on-hold"
        });
        let appt: Appointment = serde_json::from_value(row).unwrap();
        assert_eq!(appt.date, None);
        assert_eq!(appt.status, None);
        assert_eq!(appt.time, None);
    }
}
