use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::database::models::{
    Client, ClientSummary, NewClient, NewProject, NewTask, Project, ProjectWithClient, Task, User,
};
use crate::filter::FilterError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched the scoped lookup.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The backend refused the write (constraint violation, malformed payload).
    /// The message is the backend's own and is shown to users as-is.
    #[error("{0}")]
    Rejected(String),

    /// A unique constraint refused the write.
    #[error("{0}")]
    Duplicate(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// The hosted record store: table-scoped select / insert / update / delete.
///
/// Every method takes the owning user's id; implementations must apply it as an
/// equality filter on every statement they issue.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // users
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    // clients
    /// Newest first.
    async fn list_clients(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError>;
    /// Ordered by display name, for the project form's client picker.
    async fn list_client_summaries(&self, user_id: Uuid) -> Result<Vec<ClientSummary>, StoreError>;
    async fn count_clients(&self, user_id: Uuid) -> Result<i64, StoreError>;
    async fn insert_client(&self, user_id: Uuid, client: &NewClient) -> Result<Client, StoreError>;

    // projects
    /// Newest first, each with its client expanded.
    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<ProjectWithClient>, StoreError>;
    async fn find_project(&self, user_id: Uuid, id: Uuid) -> Result<Option<ProjectWithClient>, StoreError>;
    async fn count_projects(&self, user_id: Uuid) -> Result<i64, StoreError>;
    async fn insert_project(&self, user_id: Uuid, project: &NewProject) -> Result<Project, StoreError>;

    // tasks
    /// Newest first.
    async fn list_tasks(&self, user_id: Uuid, project_id: Uuid) -> Result<Vec<Task>, StoreError>;
    async fn find_task(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;
    async fn count_open_tasks(&self, user_id: Uuid) -> Result<i64, StoreError>;
    async fn insert_task(&self, user_id: Uuid, task: &NewTask) -> Result<Task, StoreError>;
    /// Flips the task between done and not done in one atomic step, stamping
    /// `completed_at` with `now` or clearing it. Returns `None` when no row matched.
    async fn toggle_task(&self, user_id: Uuid, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>, StoreError>;
    /// Returns whether a row was removed.
    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError>;
}

/// Orders client summaries the way the project form lists them.
pub(crate) fn sort_summaries(summaries: &mut [ClientSummary]) {
    summaries.sort_by(|a, b| {
        a.display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase())
    });
}
