//! Presentation filters over rows that have already been fetched and scoped.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::database::models::{ProjectStatus, ProjectWithClient, Task};

/// The status tabs above the projects table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl ProjectFilter {
    pub const ALL: [ProjectFilter; 3] = [ProjectFilter::All, ProjectFilter::Active, ProjectFilter::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectFilter::All => "all",
            ProjectFilter::Active => "active",
            ProjectFilter::Completed => "completed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProjectFilter::All => "All",
            ProjectFilter::Active => "Active",
            ProjectFilter::Completed => "Completed",
        }
    }

    /// Reads the `?status=` query value. Anything unrecognised shows everything.
    pub fn from_query(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    pub fn matches(&self, project: &ProjectWithClient) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Active => project.status == ProjectStatus::Active,
            ProjectFilter::Completed => project.status == ProjectStatus::Completed,
        }
    }

    /// Keeps the matching projects in their original order.
    pub fn apply<'a>(&self, projects: &'a [ProjectWithClient]) -> Vec<&'a ProjectWithClient> {
        projects.iter().filter(|p| self.matches(p)).collect()
    }

    pub fn count(&self, projects: &[ProjectWithClient]) -> usize {
        projects.iter().filter(|p| self.matches(p)).count()
    }
}

impl FromStr for ProjectFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ProjectFilter::All),
            "active" => Ok(ProjectFilter::Active),
            "completed" => Ok(ProjectFilter::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ProjectFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterTab {
    pub filter: ProjectFilter,
    /// "Active (3)"
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

pub fn filter_tabs(projects: &[ProjectWithClient], selected: ProjectFilter) -> Vec<FilterTab> {
    ProjectFilter::ALL
        .iter()
        .map(|&filter| {
            let count = filter.count(projects);
            FilterTab {
                filter,
                label: format!("{} ({})", filter.label(), count),
                count,
                selected: filter == selected,
            }
        })
        .collect()
}

/// Tasks split for the project page: everything not done, then done.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskBuckets {
    pub todo: Vec<Task>,
    pub done: Vec<Task>,
}

impl TaskBuckets {
    pub fn partition(tasks: Vec<Task>) -> Self {
        let (done, todo) = tasks.into_iter().partition(|t| t.status.is_done());
        Self { todo, done }
    }
}

/// Cuts `text` to `max` characters, marking the cut with `...`.
pub fn truncate_description(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Project, TaskPriority, TaskStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn project(name: &str, status: ProjectStatus) -> ProjectWithClient {
        ProjectWithClient {
            project: Project {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                client_id: Uuid::nil(),
                name: name.to_string(),
                description: None,
                status,
                start_date: None,
                due_date: None,
                budget: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            client: None,
        }
    }

    fn task(title: &str, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            project_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            status,
            priority: TaskPriority::Medium,
            assigned_to: None,
            due_date: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample() -> Vec<ProjectWithClient> {
        vec![
            project("A", ProjectStatus::Active),
            project("B", ProjectStatus::Completed),
            project("C", ProjectStatus::OnHold),
            project("D", ProjectStatus::Active),
        ]
    }

    fn names(projects: Vec<&ProjectWithClient>) -> Vec<&str> {
        projects.into_iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn all_returns_everything_in_order() {
        let projects = sample();
        assert_eq!(names(ProjectFilter::All.apply(&projects)), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn active_keeps_order() {
        let projects = sample();
        assert_eq!(names(ProjectFilter::Active.apply(&projects)), vec!["A", "D"]);
        assert_eq!(names(ProjectFilter::Completed.apply(&projects)), vec!["B"]);
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let projects = sample();
        let once: Vec<ProjectWithClient> = ProjectFilter::Active.apply(&projects).into_iter().cloned().collect();
        assert_eq!(names(ProjectFilter::Active.apply(&once)), vec!["A", "D"]);
    }

    #[test]
    fn unknown_query_shows_all() {
        assert_eq!(ProjectFilter::from_query(Some("archived")), ProjectFilter::All);
        assert_eq!(ProjectFilter::from_query(None), ProjectFilter::All);
        assert_eq!(ProjectFilter::from_query(Some("Completed")), ProjectFilter::Completed);
    }

    #[test]
    fn tabs_carry_counts() {
        let tabs = filter_tabs(&sample(), ProjectFilter::Active);
        let labels: Vec<&str> = tabs.iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["All (4)", "Active (2)", "Completed (1)"]);
        assert!(tabs[1].selected);
    }

    #[test]
    fn buckets_split_on_done() {
        let buckets = TaskBuckets::partition(vec![
            task("one", TaskStatus::Todo),
            task("two", TaskStatus::Done),
            task("three", TaskStatus::Review),
        ]);
        assert_eq!(buckets.todo.len(), 2);
        assert_eq!(buckets.done[0].title, "two");
    }

    #[test]
    fn descriptions_are_truncated() {
        assert_eq!(truncate_description("short", 60), "short");
        let long = "x".repeat(61);
        assert_eq!(truncate_description(&long, 60), format!("{}...", "x".repeat(60)));
    }
}
