use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    round_cents, Client, ClientSummary, NewClient, NewProject, NewTask, Project, ProjectWithClient, Task,
    TaskPriority, User,
};
use crate::database::store::{sort_summaries, RecordStore, StoreError};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    clients: Vec<Client>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
}

/// Process-local record store for development and tests.
///
/// Rows are kept in insertion order, so "newest first" is a reverse walk. The
/// constraints of the Postgres schema (ownership foreign keys, the unique email,
/// the budget check) are enforced here too, with the same messages.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn fk_violation(table: &str, constraint: &str) -> StoreError {
    StoreError::Rejected(format!(
        "insert or update on table \"{}\" violates foreign key constraint \"{}\"",
        table, constraint
    ))
}

/// Mirrors `numeric(12, 2)`: rounds to cents, refuses ten digits before the point.
fn store_budget(budget: Option<Decimal>) -> Result<Option<Decimal>, StoreError> {
    let Some(budget) = budget else {
        return Ok(None);
    };
    let rounded = round_cents(budget);
    if rounded.abs() >= Decimal::from(10_000_000_000i64) {
        return Err(StoreError::Rejected("numeric field overflow".to_string()));
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        return Err(StoreError::Rejected(
            "new row for relation \"projects\" violates check constraint \"projects_budget_check\"".to_string(),
        ));
    }
    Ok(Some(rounded))
}

impl Tables {
    fn has_user(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn summaries(&self, user_id: Uuid) -> impl Iterator<Item = ClientSummary> + '_ {
        self.clients
            .iter()
            .filter(move |c| c.user_id == user_id)
            .map(Client::summary)
    }

    fn with_client(&self, project: &Project) -> ProjectWithClient {
        let client = self
            .summaries(project.user_id)
            .find(|c| c.id == project.client_id);
        ProjectWithClient {
            project: project.clone(),
            client,
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Duplicate(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_clients(&self, user_id: Uuid) -> Result<Vec<Client>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .clients
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_client_summaries(&self, user_id: Uuid) -> Result<Vec<ClientSummary>, StoreError> {
        let tables = self.tables.read().await;
        let mut summaries: Vec<ClientSummary> = tables.summaries(user_id).collect();
        sort_summaries(&mut summaries);
        Ok(summaries)
    }

    async fn count_clients(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.clients.iter().filter(|c| c.user_id == user_id).count() as i64)
    }

    async fn insert_client(&self, user_id: Uuid, client: &NewClient) -> Result<Client, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.has_user(user_id) {
            return Err(fk_violation("clients", "clients_user_id_fkey"));
        }
        let now = Utc::now();
        let row = Client {
            id: Uuid::new_v4(),
            user_id,
            name: client.name.clone(),
            email: client.email.clone(),
            phone: client.phone.clone(),
            company: client.company.clone(),
            status: client.status,
            notes: client.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(row.clone());
        Ok(row)
    }

    async fn list_projects(&self, user_id: Uuid) -> Result<Vec<ProjectWithClient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .map(|p| tables.with_client(p))
            .collect())
    }

    async fn find_project(&self, user_id: Uuid, id: Uuid) -> Result<Option<ProjectWithClient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .map(|p| tables.with_client(p)))
    }

    async fn count_projects(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().filter(|p| p.user_id == user_id).count() as i64)
    }

    async fn insert_project(&self, user_id: Uuid, project: &NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.has_user(user_id) {
            return Err(fk_violation("projects", "projects_user_id_fkey"));
        }
        let owns_client = tables
            .clients
            .iter()
            .any(|c| c.id == project.client_id && c.user_id == user_id);
        if !owns_client {
            return Err(fk_violation("projects", "projects_client_owner_fkey"));
        }
        let budget = store_budget(project.budget)?;

        let now = Utc::now();
        let row = Project {
            id: Uuid::new_v4(),
            user_id,
            client_id: project.client_id,
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status,
            start_date: project.start_date,
            due_date: project.due_date,
            budget,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(row.clone());
        Ok(row)
    }

    async fn list_tasks(&self, user_id: Uuid, project_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id && t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn find_task(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .find(|t| t.id == id && t.user_id == user_id)
            .cloned())
    }

    async fn count_open_tasks(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id && !t.status.is_done())
            .count() as i64)
    }

    async fn insert_task(&self, user_id: Uuid, task: &NewTask) -> Result<Task, StoreError> {
        let mut tables = self.tables.write().await;
        let owns_project = tables
            .projects
            .iter()
            .any(|p| p.id == task.project_id && p.user_id == user_id);
        if !owns_project {
            return Err(fk_violation("tasks", "tasks_project_owner_fkey"));
        }
        let now = Utc::now();
        let row = Task {
            id: Uuid::new_v4(),
            user_id,
            project_id: task.project_id,
            title: task.title.clone(),
            description: None,
            status: task.status(),
            priority: TaskPriority::default(),
            assigned_to: None,
            due_date: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        tables.tasks.push(row.clone());
        Ok(row)
    }

    async fn toggle_task(&self, user_id: Uuid, id: Uuid, now: DateTime<Utc>) -> Result<Option<Task>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(task) = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == user_id)
        else {
            return Ok(None);
        };
        task.status = task.status.toggled();
        task.completed_at = task.status.completed_at(now);
        task.updated_at = now;
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, user_id: Uuid, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| !(t.id == id && t.user_id == user_id));
        Ok(tables.tasks.len() < before)
    }
}
