//! Integration tests for view selection, formatting and the action/transition
//! surface, exercised only through the crate's public API.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use dcms_schedule::{
    Action, Actor, Appointment, DateFormat, DateTimeSettings, DoneVisits, SortDirection, Status,
    TimeFormat, TransitionError, ViewKind, apply_transition, available_actions,
    format_date_for_display, format_time_for_display, select_for_view,
};
use proptest::prelude::*;

fn noon(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(12, 0, 0).unwrap()
}

fn row(id: &str, date: Option<NaiveDate>, time: &str, status: Status) -> Appointment {
    let mut a = Appointment::new(id);
    a.date = date;
    a.time = Some(time.to_string());
    a.status = Some(status);
    a
}

fn ids(rows: &[&Appointment]) -> Vec<String> {
    rows.iter().map(|a| a.id.clone()).collect()
}

const ALL_DATE_FORMATS: [DateFormat; 3] = [
    DateFormat::MonthDayYear,
    DateFormat::DayMonthYear,
    DateFormat::YearMonthDay,
];

#[test]
fn end_to_end_display_and_sort_key() {
    let settings = DateTimeSettings::resolve(Some(r#"{"dateFormat":"DD/MM/YYYY","timeFormat":"24h"}"#));
    assert_eq!(settings.date_format, DateFormat::DayMonthYear);
    assert_eq!(settings.time_format, TimeFormat::TwentyFourHour);

    let appt: Appointment = serde_json::from_value(serde_json::json!({
        "id": "e2e",
        "date": "2024-03-05",
        "time": "2:30 PM",
        "status": "approved"
    }))
    .unwrap();

    assert_eq!(appt.display_date(&settings), "05/03/2024");
    assert_eq!(appt.display_time(&settings), "14:30");
    assert_eq!(
        format_date_for_display(appt.date, &settings),
        "05/03/2024"
    );
    assert_eq!(format_time_for_display(Some("2:30 PM"), &settings), "14:30");
}

#[test]
fn doctor_filtering_example() {
    let mut first = Appointment::new("1");
    first.doctor_id = Some("5".into());
    let mut second = Appointment::new("2");
    second.doctor_name = Some("Dr. Lee".into());
    let mut third = Appointment::new("3");
    third.doctor_id = Some("9".into());
    third.doctor_name = Some("Dr. Park".into());
    let all: Vec<Appointment> = [first, second, third]
        .into_iter()
        .map(|mut a| {
            a.status = Some(Status::Approved);
            a
        })
        .collect();

    let doctor = Actor::new("doctor").with_identity("5", "Dr. Lee");
    let now = noon(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    let rows = select_for_view(&all, ViewKind::Approved, &doctor, now, SortDirection::Descending);
    assert_eq!(ids(&rows), ["1", "2"]);
}

#[test]
fn spec_transition_examples() {
    let mut pending = Appointment::new("p");
    pending.status = Status::normalize("pending");
    let out = apply_transition(&pending, Action::Approve, &DoneVisits::new()).unwrap();
    assert_eq!(out.new_status, Status::Approved);

    let mut done = Appointment::new("d");
    done.status = Status::normalize("done");
    let visits: DoneVisits = ["d".to_string()].into_iter().collect();
    let err = apply_transition(&done, Action::Approve, &visits).unwrap_err();
    assert!(matches!(err, TransitionError::InvalidTransition { action: Action::Approve, .. }));
    assert!(visits.contains("d"));
}

#[test]
fn action_lists_for_staff_and_patients() {
    let labels: Vec<&str> = available_actions("approved", "doctor")
        .iter()
        .map(Action::label)
        .collect();
    assert_eq!(labels, ["Mark as Done", "Move to Pending", "Reject"]);
    assert!(available_actions("approved", "patient").is_empty());
}

#[test]
fn accepted_rows_show_up_as_approved() {
    let appt: Appointment = serde_json::from_value(serde_json::json!({
        "id": "acc",
        "date": "2024-03-06",
        "time": "10:00",
        "status": "ACCEPTED"
    }))
    .unwrap();
    let rows = vec![appt];
    let now = noon(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    let staff = Actor::new("admin");
    assert_eq!(
        select_for_view(&rows, ViewKind::Tomorrow, &staff, now, SortDirection::Ascending).len(),
        1
    );
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::Pending),
        Just(Status::Approved),
        Just(Status::Done),
        Just(Status::Rejected),
    ]
}

fn arb_row() -> impl Strategy<Value = (Option<i64>, u32, u32, Status)> {
    (proptest::option::of(-3i64..5), 0u32..24, prop_oneof![Just(0u32), Just(30u32)], arb_status())
}

proptest! {
    #[test]
    fn today_is_exactly_the_reference_day(
        specs in proptest::collection::vec(arb_row(), 0..24),
        fmt_index in 0usize..3,
    ) {
        let today = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let all: Vec<Appointment> = specs
            .iter()
            .enumerate()
            .map(|(i, (offset, h, m, status))| {
                let date = offset.map(|o| today + Duration::days(o));
                row(&i.to_string(), date, &format!("{h}:{m:02}"), *status)
            })
            .collect();

        let settings = DateTimeSettings::new(ALL_DATE_FORMATS[fmt_index], TimeFormat::TwelveHour);
        let staff = Actor::new("manager");
        let rows = select_for_view(&all, ViewKind::Today, &staff, noon(today), SortDirection::Ascending);

        let mut got = ids(&rows);
        got.sort();
        let mut want: Vec<String> = all
            .iter()
            .filter(|a| a.date == Some(today))
            .map(|a| a.id.clone())
            .collect();
        want.sort();
        prop_assert_eq!(got, want);

        // rendering under any format leaves membership alone
        for a in &rows {
            prop_assert_eq!(a.display_date(&settings), format_date_for_display(Some(today), &settings));
        }
    }

    #[test]
    fn equal_keys_preserve_input_order(
        statuses in proptest::collection::vec(arb_status(), 1..12),
        spelling in 0usize..3,
    ) {
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let spellings = ["9:00 AM", "09:00", "09:00:00"];
        let all: Vec<Appointment> = statuses
            .iter()
            .enumerate()
            .map(|(i, s)| row(&i.to_string(), Some(date), spellings[(i + spelling) % 3], *s))
            .collect();
        let staff = Actor::new("receptionist");
        // upcoming starts the day after tomorrow, so look from a few days back
        let views = [
            (ViewKind::Today, noon(date)),
            (ViewKind::Approved, noon(date)),
            (ViewKind::Upcoming, noon(date - Duration::days(3))),
        ];

        for (view, now) in views {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let rows = select_for_view(&all, view, &staff, now, direction);
                if view == ViewKind::Upcoming {
                    prop_assert_eq!(rows.len(), all.len());
                }
                let positions: Vec<usize> = rows.iter().map(|a| a.id.parse().unwrap()).collect();
                let mut sorted = positions.clone();
                sorted.sort();
                prop_assert_eq!(positions, sorted);
            }
        }
    }
}
