//! Appointment lifecycle and schedule views for the clinic front desk.
//!
//! The engine (`schedule`) is pure and synchronous; `repository`, `settings`
//! and `service` are the host-side adapters around it.

mod error;
mod models;
mod repository;
mod schedule;
mod service;
mod settings;

pub use error::{ErrorObject, ErrorResponse, RepositoryError, ServiceError, TransitionError};
pub use models::{Action, Actor, Appointment, DoneVisits, Role, Status};
pub use repository::{AppointmentRepository, JsonFileRepository, MemoryRepository, VisitChange};
pub use schedule::actions::available_actions;
pub use schedule::time_format::{
    DISPLAY_PLACEHOLDER, format_date_for_display, format_time_for_display,
};
pub use schedule::transitions::{TransitionOutcome, apply_transition};
pub use schedule::views::{
    SortDirection, ViewKind, approved_view, select_for_view, today_view, tomorrow_view,
    upcoming_view,
};
pub use service::ScheduleService;
pub use settings::{
    DATE_TIME_SETTINGS_KEY, DateFormat, DateTimeSettings, FileSettingsStore, MemorySettingsStore,
    SettingsStore, SettingsWatch, TimeFormat, load_date_time_settings,
};
