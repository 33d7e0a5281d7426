//! Account-backed integrations behind the task, calendar and mail capabilities.
//!
//! Account linking lives outside this service, so the default [`Unlinked`]
//! backend answers every call with `NotConnected` and the settings guidance.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::error::CapabilityError;

/// Task list used when the caller names none
pub const DEFAULT_TASK_LIST: &str = "@default";

const TASKS_NOT_CONNECTED: &str =
    "Google Tasks not connected. Please go to Settings > Connect Google Account to enable task features.";
const CALENDAR_NOT_CONNECTED: &str = "Google Calendar not connected. Please go to Settings > Connect Google Account to enable calendar features.";
const MAIL_NOT_CONNECTED: &str =
    "Google account not connected. Please go to Settings > Connect Google Account to enable email features.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub task_list_id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Fields to change on an existing task; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub start: String,
    pub end: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub summary: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailSummary {
    pub from: String,
    pub subject: String,
    pub snippet: String,
}

#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<TaskItem, CapabilityError>;

    /// Uncompleted tasks in a list
    async fn list(&self, task_list_id: &str) -> Result<Vec<TaskItem>, CapabilityError>;

    async fn complete(&self, task_list_id: &str, task_id: &str) -> Result<(), CapabilityError>;

    async fn update(
        &self,
        task_list_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<(), CapabilityError>;

    async fn delete(&self, task_list_id: &str, task_id: &str) -> Result<(), CapabilityError>;
}

#[async_trait]
pub trait CalendarBackend: Send + Sync {
    /// Events from the start of `first_day` through the end of `first_day + days - 1`
    async fn events(
        &self,
        first_day: NaiveDate,
        days: u32,
    ) -> Result<Vec<CalendarEvent>, CapabilityError>;

    async fn create_event(&self, event: NewEvent) -> Result<CalendarEvent, CapabilityError>;
}

#[async_trait]
pub trait MailBackend: Send + Sync {
    async fn unread(&self, limit: usize) -> Result<Vec<MailSummary>, CapabilityError>;

    async fn recent(&self, limit: usize) -> Result<Vec<MailSummary>, CapabilityError>;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MailSummary>, CapabilityError>;

    /// Returns the sent message id
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<String, CapabilityError>;
}

/// Stands in for every account-backed integration until an account is linked
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlinked;

fn not_connected(message: &str) -> CapabilityError {
    CapabilityError::NotConnected {
        message: message.to_string(),
    }
}

#[async_trait]
impl TaskBackend for Unlinked {
    async fn create(&self, _task: NewTask) -> Result<TaskItem, CapabilityError> {
        Err(not_connected(TASKS_NOT_CONNECTED))
    }

    async fn list(&self, _task_list_id: &str) -> Result<Vec<TaskItem>, CapabilityError> {
        Err(not_connected(TASKS_NOT_CONNECTED))
    }

    async fn complete(&self, _task_list_id: &str, _task_id: &str) -> Result<(), CapabilityError> {
        Err(not_connected(TASKS_NOT_CONNECTED))
    }

    async fn update(
        &self,
        _task_list_id: &str,
        _task_id: &str,
        _patch: TaskPatch,
    ) -> Result<(), CapabilityError> {
        Err(not_connected(TASKS_NOT_CONNECTED))
    }

    async fn delete(&self, _task_list_id: &str, _task_id: &str) -> Result<(), CapabilityError> {
        Err(not_connected(TASKS_NOT_CONNECTED))
    }
}

#[async_trait]
impl CalendarBackend for Unlinked {
    async fn events(
        &self,
        _first_day: NaiveDate,
        _days: u32,
    ) -> Result<Vec<CalendarEvent>, CapabilityError> {
        Err(not_connected(CALENDAR_NOT_CONNECTED))
    }

    async fn create_event(&self, _event: NewEvent) -> Result<CalendarEvent, CapabilityError> {
        Err(not_connected(CALENDAR_NOT_CONNECTED))
    }
}

#[async_trait]
impl MailBackend for Unlinked {
    async fn unread(&self, _limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
        Err(not_connected(MAIL_NOT_CONNECTED))
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
        Err(not_connected(MAIL_NOT_CONNECTED))
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<MailSummary>, CapabilityError> {
        Err(not_connected(MAIL_NOT_CONNECTED))
    }

    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<String, CapabilityError> {
        Err(not_connected(MAIL_NOT_CONNECTED))
    }
}
