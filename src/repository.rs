use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::RepositoryError;
use crate::models::{Appointment, DoneVisits, Status};

/// What a status write does to the done-visit set alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitChange {
    #[default]
    Keep,
    Mark,
    Unmark,
}

/// Where snapshots come from and where status changes go. The engine never
/// retries or queues; failures are handed back to the caller.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Appointment>, RepositoryError>;
    /// Status and done-visit change land together or not at all.
    async fn apply(
        &self,
        id: &str,
        status: Status,
        visit: VisitChange,
    ) -> Result<(), RepositoryError>;
    async fn set_status(&self, id: &str, status: Status) -> Result<(), RepositoryError>;
    async fn mark_visit_done(&self, id: &str) -> Result<(), RepositoryError>;
    async fn undo_visit(&self, id: &str) -> Result<(), RepositoryError>;
    async fn done_visits(&self) -> Result<DoneVisits, RepositoryError>;
}

/* ============================================================
   In-memory
   ============================================================ */

#[derive(Debug, Default)]
struct MemoryState {
    appointments: Vec<Appointment>,
    done_visits: DoneVisits,
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                appointments,
                done_visits: DoneVisits::new(),
            }),
        }
    }
}

#[async_trait]
impl AppointmentRepository for MemoryRepository {
    async fn list(&self) -> Result<Vec<Appointment>, RepositoryError> {
        Ok(self.state.read().await.appointments.clone())
    }

    async fn apply(
        &self,
        id: &str,
        status: Status,
        visit: VisitChange,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let appt = state
            .appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        appt.status = Some(status);
        match visit {
            VisitChange::Keep => {}
            VisitChange::Mark => {
                state.done_visits.insert(id.to_string());
            }
            VisitChange::Unmark => {
                state.done_visits.remove(id);
            }
        }
        Ok(())
    }

    async fn set_status(&self, id: &str, status: Status) -> Result<(), RepositoryError> {
        self.apply(id, status, VisitChange::Keep).await
    }

    async fn mark_visit_done(&self, id: &str) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if !state.appointments.iter().any(|a| a.id == id) {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        state.done_visits.insert(id.to_string());
        Ok(())
    }

    async fn undo_visit(&self, id: &str) -> Result<(), RepositoryError> {
        self.state.write().await.done_visits.remove(id);
        Ok(())
    }

    async fn done_visits(&self) -> Result<DoneVisits, RepositoryError> {
        Ok(self.state.read().await.done_visits.clone())
    }
}

/* ============================================================
   JSON file
   ============================================================ */

/// Either a bare array of appointments or
/// `{"appointments": [...], "doneVisits": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum FileLayout {
    Bare(Vec<Value>),
    Wrapped {
        appointments: Vec<Value>,
        #[serde(default, rename = "doneVisits")]
        done_visits: Vec<Value>,
    },
}

#[derive(Clone)]
struct FileState {
    rows: Vec<Value>,
    done_visits: DoneVisits,
}

impl FileState {
    fn has_row(&self, id: &str) -> bool {
        self.rows.iter().any(|r| row_id(r).as_deref() == Some(id))
    }

    fn set_status(&mut self, id: &str, status: Status) -> Result<(), RepositoryError> {
        let row = self
            .rows
            .iter_mut()
            .find(|r| row_id(r).as_deref() == Some(id))
            .and_then(Value::as_object_mut)
            .ok_or_else(|| RepositoryError::NotFound(id.to_string()))?;
        row.insert("status".into(), Value::String(status.as_str().into()));
        Ok(())
    }

    /// Returns whether the set actually changed.
    fn change_visit(&mut self, id: &str, visit: VisitChange) -> bool {
        match visit {
            VisitChange::Keep => false,
            VisitChange::Mark => self.done_visits.insert(id.to_string()),
            VisitChange::Unmark => self.done_visits.remove(id),
        }
    }
}

/// Appointments kept as raw JSON rows so fields this crate does not model
/// survive a save. Every mutation rewrites the file in the wrapped layout.
pub struct JsonFileRepository {
    path: PathBuf,
    state: RwLock<FileState>,
}

fn value_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn row_id(row: &Value) -> Option<String> {
    row.get("id").or_else(|| row.get("_id")).and_then(value_id)
}

impl JsonFileRepository {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let text = tokio::fs::read_to_string(&path).await?;
        let (rows, done_visits) = match serde_json::from_str::<FileLayout>(&text)? {
            FileLayout::Bare(rows) => (rows, DoneVisits::new()),
            FileLayout::Wrapped {
                appointments,
                done_visits,
            } => (appointments, done_visits.iter().filter_map(value_id).collect()),
        };
        debug!(path = %path.display(), rows = rows.len(), "appointments loaded");

        Ok(Self {
            path,
            state: RwLock::new(FileState { rows, done_visits }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &FileState) -> Result<(), RepositoryError> {
        let body = json!({
            "appointments": state.rows,
            "doneVisits": state.done_visits,
        });
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&body)?).await?;
        Ok(())
    }

    /// Stage a change on a copy of the state and swap it in only after the
    /// file write succeeded, so memory never runs ahead of disk.
    async fn commit<F>(&self, change: F) -> Result<(), RepositoryError>
    where
        F: FnOnce(&mut FileState) -> Result<bool, RepositoryError> + Send,
    {
        let mut state = self.state.write().await;
        let mut next = (*state).clone();
        if !change(&mut next)? {
            return Ok(());
        }
        if let Err(e) = self.persist(&next).await {
            warn!(path = %self.path.display(), error = %e, "save failed, state left unchanged");
            return Err(e);
        }
        *state = next;
        Ok(())
    }
}

#[async_trait]
impl AppointmentRepository for JsonFileRepository {
    async fn list(&self) -> Result<Vec<Appointment>, RepositoryError> {
        let state = self.state.read().await;
        let mut out = Vec::with_capacity(state.rows.len());
        for (index, row) in state.rows.iter().enumerate() {
            match serde_json::from_value::<Appointment>(row.clone()) {
                Ok(appt) => out.push(appt),
                // one bad row must not blank the schedule
                Err(e) => warn!(index, error = %e, "skipping undecodable appointment row"),
            }
        }
        Ok(out)
    }

    async fn apply(
        &self,
        id: &str,
        status: Status,
        visit: VisitChange,
    ) -> Result<(), RepositoryError> {
        self.commit(|state| {
            state.set_status(id, status)?;
            state.change_visit(id, visit);
            Ok(true)
        })
        .await
    }

    async fn set_status(&self, id: &str, status: Status) -> Result<(), RepositoryError> {
        self.apply(id, status, VisitChange::Keep).await
    }

    async fn mark_visit_done(&self, id: &str) -> Result<(), RepositoryError> {
        self.commit(|state| {
            if !state.has_row(id) {
                return Err(RepositoryError::NotFound(id.to_string()));
            }
            Ok(state.change_visit(id, VisitChange::Mark))
        })
        .await
    }

    async fn undo_visit(&self, id: &str) -> Result<(), RepositoryError> {
        self.commit(|state| Ok(state.change_visit(id, VisitChange::Unmark)))
            .await
    }

    async fn done_visits(&self) -> Result<DoneVisits, RepositoryError> {
        Ok(self.state.read().await.done_visits.clone())
    }
}
