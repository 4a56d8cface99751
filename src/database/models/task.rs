use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::text_enum;

text_enum! {
    TaskStatus ("task status") {
        #[default]
        Todo => "todo",
        InProgress => "in-progress",
        Review => "review",
        Done => "done",
    }
}

text_enum! {
    TaskPriority ("task priority") {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
    }
}

impl TaskStatus {
    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    /// Flips the done/not-done state. Anything that is not done becomes done.
    pub fn toggled(&self) -> TaskStatus {
        if self.is_done() {
            TaskStatus::Todo
        } else {
            TaskStatus::Done
        }
    }

    /// `completed_at` value that accompanies this status when written at `now`.
    pub fn completed_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.is_done().then_some(now)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    pub assigned_to: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the inline "Add Task" form. New tasks always start as todo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
}

impl NewTask {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::Todo
    }
}
