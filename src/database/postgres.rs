use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, PgPool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use crate::database::models::{
    Client, ClientSummary, NewClient, NewProject, NewTask, Project, ProjectWithClient, Task,
    TaskPriority, TaskStatus, User,
};
use crate::database::store::{sort_summaries, RecordStore, StoreError};
use crate::filter::{Filter, SortDirection, SqlParam, SqlResult};

/// Postgres-backed record store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select_all<T>(&self, sql: SqlResult) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!(query = %sql.query, "select");
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        q.fetch_all(&self.pool).await.map_err(map_sqlx_error)
    }

    async fn select_optional<T>(&self, sql: SqlResult) -> Result<Option<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!(query = %sql.query, "select");
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query_as(q, p);
        }
        q.fetch_optional(&self.pool).await.map_err(map_sqlx_error)
    }

    async fn count(&self, sql: SqlResult) -> Result<i64, StoreError> {
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let row = q.fetch_one(&self.pool).await.map_err(map_sqlx_error)?;
        row.try_get::<i64, _>("count").map_err(map_sqlx_error)
    }

    /// Loads client summaries for the given ids, keyed for the project join.
    async fn client_summaries(&self, user_id: Uuid, ids: Vec<Uuid>) -> Result<Vec<ClientSummary>, StoreError> {
        if ids.is_empty() {
            return Ok(vec![]);
        }
        let sql = Filter::new("clients")?
            .where_eq("user_id", user_id)?
            .where_in("id", ids)?
            .to_select_sql();
        self.select_all(sql).await
    }

    async fn with_clients(&self, user_id: Uuid, projects: Vec<Project>) -> Result<Vec<ProjectWithClient>, StoreError> {
        let mut ids: Vec<Uuid> = projects.iter().map(|p| p.client_id).collect();
        ids.sort();
        ids.dedup();
        let clients = self.client_summaries(user_id, ids).await?;

        Ok(projects
            .into_iter()
            .map(|project| {
                let client = clients.iter().find(|c| c.id == project.client_id).cloned();
                ProjectWithClient { project, client }
            })
            .collect())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = Filter::new("users")?.where_eq("id", id)?.limit(1).to_select_sql();
        self.select_optional(sql).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = Filter::new("users")?.where_eq("email", email)?.limit(1).to_select_sql();
        self.select_optional(sql).await
    }

    async fn list_clients(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError> {
        let sql = Filter::new("clients")?
            .where_eq("user_id", user_id)?
            .order("created_at", SortDirection::Desc)?
            .to_select_sql();
        self.select_all(sql).await
    }

    async fn list_client_summaries(&self, user_id: Uuid) -> Result<Vec<ClientSummary>, StoreError> {
        let sql = Filter::new("clients")?.where_eq("user_id", user_id)?.to_select_sql();
        let mut summaries: Vec<ClientSummary> = self.select_all(sql).await?;
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn count_clients(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let sql = Filter::new("clients")?.where_eq("user_id", user_id)?.to_count_sql();
        self.count(sql).await
    }

    async fn insert_client(&self, user_id: Uuid, client: &NewClient) -> Result<Client, StoreError> {
        sqlx::query_as::<_, Client>(
            "INSERT INTO clients (id, user_id, name, email, phone, company, status, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&client.name)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(&client.company)
        .bind(client.status.as_str())
        .bind(&client.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<ProjectWithClient>, StoreError> {
        let sql = Filter::new("projects")?
            .where_eq("user_id", user_id)?
            .order("created_at", SortDirection::Desc)?
            .to_select_sql();
        let projects: Vec<Project> = self.select_all(sql).await?;
        self.with_clients(user_id, projects).await
    }

    async fn find_project(&self, user_id: Uuid, id: Uuid) -> Result<Option<ProjectWithClient>, StoreError> {
        let sql = Filter::new("projects")?
            .where_eq("id", id)?
            .where_eq("user_id", user_id)?
            .limit(1)
            .to_select_sql();
        let Some(project) = self.select_optional::<Project>(sql).await? else {
            return Ok(None);
        };
        Ok(self.with_clients(user_id, vec![project]).await?.pop())
    }

    async fn count_projects(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let sql = Filter::new("projects")?.where_eq("user_id", user_id)?.to_count_sql();
        self.count(sql).await
    }

    async fn insert_project(&self, user_id: Uuid, project: &NewProject) -> Result<Project, StoreError> {
        sqlx::query_as::<_, Project>(
            "INSERT INTO projects (id, user_id, client_id, name, description, status, start_date, due_date, budget) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(project.start_date)
        .bind(project.due_date)
        .bind(project.budget)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_tasks(&self, user_id: Uuid, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let sql = Filter::new("tasks")?
            .where_eq("user_id", user_id)?
            .where_eq("project_id", project_id)?
            .order("created_at", SortDirection::Desc)?
            .to_select_sql();
        self.select_all(sql).await
    }

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let sql = Filter::new("tasks")?
            .where_eq("id", id)?
            .where_eq("user_id", user_id)?
            .limit(1)
            .to_select_sql();
        self.select_optional(sql).await
    }

    async fn count_open_tasks(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let open: Vec<String> = TaskStatus::ALL
            .iter()
            .filter(|s| !s.is_done())
            .map(|s| s.as_str().to_string())
            .collect();
        let sql = Filter::new("tasks")?
            .where_eq("user_id", user_id)?
            .where_in("status", open)?
            .to_count_sql();
        self.count(sql).await
    }

    async fn insert_task(&self, user_id: Uuid, task: &NewTask) -> Result<Task, StoreError> {
        sqlx::query_as::<_, Task>(
            "INSERT INTO tasks (id, user_id, project_id, title, status, priority) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(task.project_id)
        .bind(&task.title)
        .bind(task.status().as_str())
        .bind(TaskPriority::default().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)
    }

    async fn toggle_task(&self, user_id: Uuid, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // The row stays locked until commit, so concurrent toggles queue up behind each other
        let select = Filter::new("tasks")?
            .where_eq("id", id)?
            .where_eq("user_id", user_id)?
            .limit(1)
            .for_update()
            .to_select_sql();
        let mut q = sqlx::query_as::<_, Task>(&select.query);
        for p in select.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let Some(task) = q.fetch_optional(&mut *tx).await.map_err(map_sqlx_error)? else {
            return Ok(None);
        };

        let status = task.status.toggled();
        let update = Filter::new("tasks")?
            .where_eq("id", id)?
            .where_eq("user_id", user_id)?
            .to_update_sql(vec![
                ("status", status.as_str().into()),
                ("completed_at", status.completed_at(now).into()),
                ("updated_at", now.into()),
            ])?;
        let mut q = sqlx::query_as::<_, Task>(&update.query);
        for p in update.params.iter() {
            q = bind_param_query_as(q, p);
        }
        let toggled = q.fetch_optional(&mut *tx).await.map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(toggled)
    }

    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let sql = Filter::new("tasks")?
            .where_eq("id", id)?
            .where_eq("user_id", user_id)?
            .to_delete_sql()?;
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_param_query(q, p);
        }
        let result = q.execute(&self.pool).await.map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}

/// Maps driver errors onto the store's taxonomy. Constraint messages pass through verbatim.
fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound("Record not found".to_string()),
        sqlx::Error::Database(db) => classify_database_error(db.code().as_deref(), db.message()),
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) | sqlx::Error::Tls(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Query(err.to_string()),
    }
}

const UNIQUE_VIOLATION: &str = "23505";

/// Unique violations become `Duplicate`; every other backend refusal is
/// `Rejected` with the backend's message untouched.
fn classify_database_error(code: Option<&str>, message: &str) -> StoreError {
    match code {
        Some(UNIQUE_VIOLATION) => StoreError::Duplicate(message.to_string()),
        _ => StoreError::Rejected(message.to_string()),
    }
}

fn bind_param_query<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match p {
        SqlParam::Uuid(v) => q.bind(*v),
        SqlParam::UuidList(v) => q.bind(v.clone()),
        SqlParam::Text(v) => q.bind(v.clone()),
        SqlParam::TextList(v) => q.bind(v.clone()),
        SqlParam::Timestamp(v) => q.bind(*v),
        SqlParam::OptTimestamp(v) => q.bind(*v),
    }
}

fn bind_param_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    p: &SqlParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match p {
        SqlParam::Uuid(v) => q.bind(*v),
        SqlParam::UuidList(v) => q.bind(v.clone()),
        SqlParam::Text(v) => q.bind(v.clone()),
        SqlParam::TextList(v) => q.bind(v.clone()),
        SqlParam::Timestamp(v) => q.bind(*v),
        SqlParam::OptTimestamp(v) => q.bind(*v),
    }
}
