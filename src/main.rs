mod config;

use anyhow::{Context, bail};
use chrono::Local;
use dcms_schedule::{
    Action, Appointment, DateTimeSettings, ErrorResponse, FileSettingsStore, JsonFileRepository,
    MemorySettingsStore, ScheduleService, SettingsWatch, SortDirection, ViewKind,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const USAGE: &str = "usage:
  dcms-schedule view <today|tomorrow|upcoming|approved> [asc|desc]
  dcms-schedule actions <appointment-id>
  dcms-schedule act <appointment-id> <action label>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // stdout carries the JSON rows, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::from_env().context("APPOINTMENTS_PATH must be set")?;
    let settings = match &cfg.settings_path {
        Some(path) => SettingsWatch::load(&FileSettingsStore::new(path)),
        None => SettingsWatch::load(&MemorySettingsStore::default()),
    };
    let repo = JsonFileRepository::open(&cfg.appointments_path)
        .await
        .with_context(|| format!("reading {}", cfg.appointments_path.display()))?;
    let service = ScheduleService::new(repo);
    let actor = cfg.actor();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["view", kind, rest @ ..] => {
            let kind: ViewKind = kind.parse().map_err(anyhow::Error::msg)?;
            let direction = match rest.first() {
                Some(&"asc") => SortDirection::Ascending,
                Some(&"desc") | None => SortDirection::Descending,
                Some(other) => bail!("unknown sort direction: {other}"),
            };
            let now = Local::now().naive_local();
            let rows = service.view(kind, &actor, now, direction).await?;
            tracing::info!(view = %kind, rows = rows.len(), "rendering view");
            for row in &rows {
                println!("{}", render_row(row, settings.current()));
            }
        }
        ["actions", id] => {
            let actions = service.actions(id, &actor).await?;
            println!("{}", serde_json::to_string(&actions)?);
        }
        ["act", id, label @ ..] if !label.is_empty() => {
            let action: Action = label.join(" ").parse().map_err(anyhow::Error::msg)?;
            match service.perform(id, action, &actor).await {
                Ok(outcome) => println!("{}", json!({ "id": id, "status": outcome.new_status })),
                Err(e) => {
                    println!("{}", serde_json::to_string(&ErrorResponse::from(&e))?);
                    std::process::exit(1);
                }
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}

fn render_row(row: &Appointment, settings: &DateTimeSettings) -> serde_json::Value {
    json!({
        "id": row.id,
        "patientName": row.patient_name,
        "doctorName": row.doctor_name,
        "date": row.display_date(settings),
        "time": row.display_time(settings),
        "status": row.status,
        "appointmentType": row.appointment_type,
        "appointmentMode": row.appointment_mode,
    })
}
