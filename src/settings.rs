use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde_json::Value;
use tracing::{debug, warn};

/// Storage key the host keeps date/time preferences under.
pub const DATE_TIME_SETTINGS_KEY: &str = "dateTimeSettings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    #[default]
    MonthDayYear,
    DayMonthYear,
    YearMonthDay,
}

impl DateFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "MM/DD/YYYY" => Some(DateFormat::MonthDayYear),
            "DD/MM/YYYY" => Some(DateFormat::DayMonthYear),
            "YYYY-MM-DD" => Some(DateFormat::YearMonthDay),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "MM/DD/YYYY",
            DateFormat::DayMonthYear => "DD/MM/YYYY",
            DateFormat::YearMonthDay => "YYYY-MM-DD",
        }
    }

    /// chrono format string for this layout.
    pub(crate) fn pattern(&self) -> &'static str {
        match self {
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::YearMonthDay => "%Y-%m-%d",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFormat {
    #[default]
    TwelveHour,
    TwentyFourHour,
}

impl TimeFormat {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "12h" | "12" => Some(TimeFormat::TwelveHour),
            "24h" | "24" => Some(TimeFormat::TwentyFourHour),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFormat::TwelveHour => "12h",
            TimeFormat::TwentyFourHour => "24h",
        }
    }
}

/// Fully resolved display preferences. There is no partial form of this
/// type: anything missing or invalid is replaced while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeSettings {
    pub date_format: DateFormat,
    pub time_format: TimeFormat,
    /// Shown to the user only; bucket math ignores it.
    pub timezone: Tz,
}

impl Default for DateTimeSettings {
    fn default() -> Self {
        Self {
            date_format: DateFormat::default(),
            time_format: TimeFormat::default(),
            timezone: Tz::UTC,
        }
    }
}

impl DateTimeSettings {
    pub fn new(date_format: DateFormat, time_format: TimeFormat) -> Self {
        Self {
            date_format,
            time_format,
            ..Self::default()
        }
    }

    /// Resolve stored JSON into complete settings. Never fails.
    pub fn resolve(raw: Option<&str>) -> Self {
        let default = Self::default();
        let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
            debug!("no stored date/time settings, using defaults");
            return default;
        };

        let obj = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(obj)) => obj,
            Ok(_) => {
                warn!("stored date/time settings are not an object, using defaults");
                return default;
            }
            Err(e) => {
                warn!(error = %e, "corrupt date/time settings, using defaults");
                return default;
            }
        };

        let field = |key: &str| obj.get(key).and_then(Value::as_str);

        let date_format = resolve_field("dateFormat", field("dateFormat"), DateFormat::parse)
            .unwrap_or(default.date_format);
        let time_format = resolve_field("timeFormat", field("timeFormat"), TimeFormat::parse)
            .unwrap_or(default.time_format);
        let timezone = resolve_field("timezone", field("timezone"), |s| s.parse::<Tz>().ok())
            .unwrap_or(default.timezone);

        Self {
            date_format,
            time_format,
            timezone,
        }
    }
}

fn resolve_field<T>(key: &str, raw: Option<&str>, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = raw?;
    let parsed = parse(raw);
    if parsed.is_none() {
        warn!(field = key, value = raw, "invalid date/time setting, using default");
    }
    parsed
}

/* -------------------------
   Stores
--------------------------*/

/// Key/value store the host persists preferences in.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettingsStore {
    values: HashMap<String, String>,
}

impl MemorySettingsStore {
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// A JSON object on disk. Values may be nested objects or
/// stringified JSON (the browser-storage shape).
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings file unreadable");
                return None;
            }
        };
        let root: Value = serde_json::from_str(&text).ok()?;
        match root.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

pub fn load_date_time_settings(store: &dyn SettingsStore) -> DateTimeSettings {
    DateTimeSettings::resolve(store.get(DATE_TIME_SETTINGS_KEY).as_deref())
}

/* -------------------------
   Change notification
--------------------------*/

type Subscriber = Box<dyn Fn(&DateTimeSettings) + Send + Sync>;

/// Current settings plus the callbacks the host registered for changes.
pub struct SettingsWatch {
    current: DateTimeSettings,
    subscribers: Vec<Subscriber>,
}

impl SettingsWatch {
    pub fn new(current: DateTimeSettings) -> Self {
        Self {
            current,
            subscribers: Vec::new(),
        }
    }

    pub fn load(store: &dyn SettingsStore) -> Self {
        Self::new(load_date_time_settings(store))
    }

    pub fn current(&self) -> &DateTimeSettings {
        &self.current
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: Fn(&DateTimeSettings) + Send + Sync + 'static,
    {
        self.subscribers.push(Box::new(callback));
    }

    /// Re-resolve from raw stored JSON. Subscribers only hear about real changes.
    pub fn update(&mut self, raw: Option<&str>) -> &DateTimeSettings {
        let next = DateTimeSettings::resolve(raw);
        if next != self.current {
            self.current = next;
            for notify in &self.subscribers {
                notify(&self.current);
            }
        }
        &self.current
    }
}
