use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::client::ClientSummary;
use super::task::Task;
use super::text_enum;

/// Rounds a budget to cents the way `numeric(12, 2)` does: halves go away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

text_enum! {
    /// Project lifecycle stage. Any value may follow any other.
    ProjectStatus ("project status") {
        #[default]
        Planning => "planning",
        Active => "active",
        OnHold => "on-hold",
        Completed => "completed",
        Archived => "archived",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub budget: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with its client expanded, as shown in lists and the detail header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectWithClient {
    #[serde(flatten)]
    pub project: Project,
    pub client: Option<ClientSummary>,
}

impl std::ops::Deref for ProjectWithClient {
    type Target = Project;
    fn deref(&self) -> &Self::Target {
        &self.project
    }
}

/// Everything the project detail page loads: header data plus the task list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: ProjectWithClient,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    pub client_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
}
