use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::models::{
    Client, ClientSummary, NewTask, Project, ProjectDetail, ProjectWithClient, SessionUser, Task,
};
use crate::database::store::{RecordStore, StoreError};
use crate::forms::{FormError, NewClientForm, NewProjectForm, NewTaskForm};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardCounts {
    pub clients: i64,
    pub projects: i64,
    pub open_tasks: i64,
}

/// The signed-in user's view of the record store.
///
/// Handlers never see the store directly: every read and write goes through a
/// workspace, and every statement it issues carries the owner's id.
#[derive(Clone)]
pub struct Workspace {
    store: Arc<dyn RecordStore>,
    user: SessionUser,
}

impl Workspace {
    pub fn new(store: Arc<dyn RecordStore>, user: SessionUser) -> Self {
        Self { store, user }
    }

    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    fn owner(&self) -> Uuid {
        self.user.id
    }

    pub async fn dashboard(&self) -> Result<DashboardCounts, WorkspaceError> {
        Ok(DashboardCounts {
            clients: self.store.count_clients(self.owner()).await?,
            projects: self.store.count_projects(self.owner()).await?,
            open_tasks: self.store.count_open_tasks(self.owner()).await?,
        })
    }

    pub async fn clients(&self) -> Result<Vec<Client>, WorkspaceError> {
        Ok(self.store.list_clients(self.owner()).await?)
    }

    /// Choices for the project form's client picker.
    pub async fn client_options(&self) -> Result<Vec<ClientSummary>, WorkspaceError> {
        Ok(self.store.list_client_summaries(self.owner()).await?)
    }

    pub async fn create_client(&self, form: NewClientForm) -> Result<Client, WorkspaceError> {
        let new = form.into_new_client()?;
        let client = self.store.insert_client(self.owner(), &new).await?;
        info!(user_id = %self.owner(), client_id = %client.id, "Client created");
        Ok(client)
    }

    pub async fn projects(&self) -> Result<Vec<ProjectWithClient>, WorkspaceError> {
        Ok(self.store.list_projects(self.owner()).await?)
    }

    /// A project with its client and tasks. Unknown ids and other users'
    /// projects are indistinguishable.
    pub async fn project(&self, id: Uuid) -> Result<ProjectDetail, WorkspaceError> {
        let project = self.owned_project(id).await?;
        let tasks = self.store.list_tasks(self.owner(), id).await?;
        Ok(ProjectDetail { project, tasks })
    }

    pub async fn create_project(&self, form: NewProjectForm) -> Result<Project, WorkspaceError> {
        let new = form.into_new_project()?;
        let project = self.store.insert_project(self.owner(), &new).await?;
        info!(user_id = %self.owner(), project_id = %project.id, "Project created");
        Ok(project)
    }

    pub async fn tasks(&self, project_id: Uuid) -> Result<Vec<Task>, WorkspaceError> {
        self.owned_project(project_id).await?;
        Ok(self.store.list_tasks(self.owner(), project_id).await?)
    }

    /// Adds a todo task to one of the user's projects. Only the title is taken from the form.
    pub async fn add_task(&self, project_id: Uuid, form: NewTaskForm) -> Result<Task, WorkspaceError> {
        let title = form.into_title()?;
        self.owned_project(project_id).await?;

        let task = self
            .store
            .insert_task(self.owner(), &NewTask { project_id, title })
            .await?;
        info!(user_id = %self.owner(), task_id = %task.id, "Task added");
        Ok(task)
    }

    /// Flips a task between done and not done, stamping or clearing `completed_at`.
    pub async fn toggle_task(&self, task_id: Uuid) -> Result<Task, WorkspaceError> {
        let result = self.try_toggle_task(task_id).await;
        match &result {
            Ok(task) => info!(user_id = %self.owner(), task_id = %task.id, status = %task.status, "Task toggled"),
            Err(err) => warn!(user_id = %self.owner(), %task_id, "Task toggle failed: {}", err),
        }
        result
    }

    async fn try_toggle_task(&self, task_id: Uuid) -> Result<Task, WorkspaceError> {
        self.store
            .toggle_task(self.owner(), task_id, Utc::now())
            .await?
            .ok_or(WorkspaceError::NotFound("Task"))
    }

    /// Removes one task and returns it as it was before deletion.
    pub async fn delete_task(&self, task_id: Uuid) -> Result<Task, WorkspaceError> {
        let result = self.try_delete_task(task_id).await;
        match &result {
            Ok(task) => info!(user_id = %self.owner(), task_id = %task.id, "Task deleted"),
            Err(err) => warn!(user_id = %self.owner(), %task_id, "Task delete failed: {}", err),
        }
        result
    }

    async fn try_delete_task(&self, task_id: Uuid) -> Result<Task, WorkspaceError> {
        let task = self
            .store
            .find_task(self.owner(), task_id)
            .await?
            .ok_or(WorkspaceError::NotFound("Task"))?;

        if !self.store.delete_task(self.owner(), task_id).await? {
            return Err(WorkspaceError::NotFound("Task"));
        }
        Ok(task)
    }

    /// Finds a task the user owns, for pages that only need to look at it.
    pub async fn task(&self, task_id: Uuid) -> Result<Task, WorkspaceError> {
        self.store
            .find_task(self.owner(), task_id)
            .await?
            .ok_or(WorkspaceError::NotFound("Task"))
    }

    async fn owned_project(&self, id: Uuid) -> Result<ProjectWithClient, WorkspaceError> {
        self.store
            .find_project(self.owner(), id)
            .await?
            .ok_or(WorkspaceError::NotFound("Project"))
    }
}
