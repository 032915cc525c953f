// Data models for the task list

use crate::record::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A to-do item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    pub details: Option<String>,
}

impl Task {
    /// Text used when sharing a task: name, blank line, details
    pub fn share_text(&self) -> String {
        format!("{}\n\n{}", self.name, self.details.as_deref().unwrap_or(""))
    }
}

impl Record for Task {
    fn id(&self) -> Uuid {
        self.id
    }

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn sort_key(&self) -> i64 {
        self.created_at.timestamp_millis()
    }
}

/// Parameters for creating a task; unset fields take their defaults
#[derive(Debug, Clone)]
pub struct TaskDraft {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub is_completed: bool,
    pub details: Option<String>,
    pub persist_immediately: bool,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            created_at: Utc::now(),
            is_completed: false,
            details: None,
            persist_immediately: false,
        }
    }

    pub fn completed(mut self, is_completed: bool) -> Self {
        self.is_completed = is_completed;
        self
    }

    pub fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Commit to durable storage as soon as the task is created
    pub fn persist(mut self) -> Self {
        self.persist_immediately = true;
        self
    }

    pub(crate) fn into_task(self) -> Task {
        Task {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            is_completed: self.is_completed,
            details: self.details,
        }
    }
}

/// Singleton record gating the first-launch remote sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub id: Uuid,
    pub needs_initial_sync: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: Uuid::now_v7(),
            needs_initial_sync: true,
        }
    }
}

impl Record for Settings {
    fn id(&self) -> Uuid {
        self.id
    }

    fn collection_name() -> &'static str {
        "settings"
    }
}
