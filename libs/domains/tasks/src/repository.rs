use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::TaskResult;
use crate::filter::{OrderField, Ordering, TaskFilter};
use crate::models::{NewTask, Task, TaskChanges};

/// Repository trait for Task persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Insert a new task
    async fn create(&self, input: NewTask) -> TaskResult<Task>;

    /// Fetch a task by id
    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>>;

    /// List tasks matching the filter.
    ///
    /// Returns the requested window plus the total match count before
    /// pagination.
    async fn list(
        &self,
        filter: &TaskFilter,
        offset: u64,
        limit: u64,
    ) -> TaskResult<(Vec<Task>, u64)>;

    /// Apply changes to a task, refreshing `updated_at`.
    ///
    /// Returns `None` when the id is unknown.
    async fn update(&self, id: i64, changes: TaskChanges) -> TaskResult<Option<Task>>;

    /// Delete a task. Returns `false` when the id was unknown.
    async fn delete(&self, id: i64) -> TaskResult<bool>;
}

/// In-memory implementation of TaskRepository (for development/testing).
///
/// Ids are handed out by a monotonically increasing counter and never
/// reused, matching the database's BIGSERIAL behavior.
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tasks: Arc<RwLock<HashMap<i64, Task>>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn matches(task: &Task, filter: &TaskFilter) -> bool {
    if let Some(status) = filter.status {
        if task.status != status {
            return false;
        }
    }
    if let Some(ref needle) = filter.title {
        if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
    }
    if let Some(ref needle) = filter.search {
        if !task.title.to_lowercase().contains(&needle.to_lowercase()) {
            return false;
        }
    }
    if let Some(after) = filter.created_after {
        if task.created_at < after {
            return false;
        }
    }
    if let Some(before) = filter.created_before {
        if task.created_at > before {
            return false;
        }
    }
    true
}

fn sort_tasks(tasks: &mut [Task], ordering: Ordering) {
    tasks.sort_by(|a, b| {
        let by_field = match ordering.field {
            OrderField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            OrderField::Title => a.title.cmp(&b.title),
            OrderField::Status => a.status.cmp(&b.status),
        };
        // id as tie-breaker keeps listings deterministic
        let full = by_field.then(a.id.cmp(&b.id));
        if ordering.descending {
            full.reverse()
        } else {
            full
        }
    });
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    async fn create(&self, input: NewTask) -> TaskResult<Task> {
        let mut tasks = self.tasks.write().await;

        let now = Utc::now();
        let task = Task {
            id: self.next_id.fetch_add(1, AtomicOrdering::SeqCst),
            title: input.title,
            status: input.status,
            created_at: now,
            updated_at: now,
        };
        tasks.insert(task.id, task.clone());

        Ok(task)
    }

    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>> {
        let tasks = self.tasks.read().await;
        Ok(tasks.get(&id).cloned())
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        offset: u64,
        limit: u64,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let tasks = self.tasks.read().await;

        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|task| matches(task, filter))
            .cloned()
            .collect();

        sort_tasks(&mut matching, filter.ordering);

        let total = matching.len() as u64;
        let window = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        Ok((window, total))
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> TaskResult<Option<Task>> {
        let mut tasks = self.tasks.write().await;

        let Some(task) = tasks.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            task.title = title;
        }
        if let Some(status) = changes.status {
            task.status = status;
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete(&self, id: i64) -> TaskResult<bool> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;

    fn new_task(title: &str, status: TaskStatus) -> NewTask {
        NewTask {
            title: title.to_string(),
            status,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_task() {
        let repo = InMemoryTaskRepository::new();

        let task = repo
            .create(new_task("Buy milk", TaskStatus::Active))
            .await
            .unwrap();
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.created_at, task.updated_at);

        let fetched = repo.get_by_id(task.id).await.unwrap();
        assert_eq!(fetched, Some(task));
    }

    #[tokio::test]
    async fn test_ids_are_sequential_and_never_reused() {
        let repo = InMemoryTaskRepository::new();

        let first = repo
            .create(new_task("First", TaskStatus::Active))
            .await
            .unwrap();
        let second = repo
            .create(new_task("Second", TaskStatus::Active))
            .await
            .unwrap();
        assert!(second.id > first.id);

        assert!(repo.delete(second.id).await.unwrap());
        let third = repo
            .create(new_task("Third", TaskStatus::Active))
            .await
            .unwrap();
        assert!(third.id > second.id);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_returns_false() {
        let repo = InMemoryTaskRepository::new();
        assert!(!repo.delete(999).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let repo = InMemoryTaskRepository::new();
        let task = repo
            .create(new_task("Buy milk", TaskStatus::Active))
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let updated = repo
            .update(task.id, TaskChanges::with_status(TaskStatus::Completed))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, "Buy milk");
        assert!(updated.updated_at > task.updated_at);
        assert_eq!(updated.created_at, task.created_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let repo = InMemoryTaskRepository::new();
        let result = repo
            .update(42, TaskChanges::with_status(TaskStatus::Active))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let repo = InMemoryTaskRepository::new();
        repo.create(new_task("Active one", TaskStatus::Active))
            .await
            .unwrap();
        repo.create(new_task("Done one", TaskStatus::Completed))
            .await
            .unwrap();

        let filter = TaskFilter::for_status(TaskStatus::Completed);
        let (tasks, total) = repo.list(&filter, 0, 10).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(tasks[0].title, "Done one");
    }

    #[tokio::test]
    async fn test_list_search_is_case_insensitive() {
        let repo = InMemoryTaskRepository::new();
        repo.create(new_task("Buy MILK", TaskStatus::Active))
            .await
            .unwrap();
        repo.create(new_task("Walk dog", TaskStatus::Active))
            .await
            .unwrap();

        let filter = TaskFilter {
            search: Some("milk".to_string()),
            ..TaskFilter::default()
        };
        let (tasks, total) = repo.list(&filter, 0, 10).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(tasks[0].title, "Buy MILK");
    }

    #[tokio::test]
    async fn test_list_default_order_is_newest_first() {
        let repo = InMemoryTaskRepository::new();
        for title in ["first", "second", "third"] {
            repo.create(new_task(title, TaskStatus::Active))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let (tasks, _) = repo.list(&TaskFilter::default(), 0, 10).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_list_orders_by_title_ascending() {
        let repo = InMemoryTaskRepository::new();
        for title in ["cherry", "apple", "banana"] {
            repo.create(new_task(title, TaskStatus::Active))
                .await
                .unwrap();
        }

        let filter = TaskFilter {
            ordering: Ordering {
                field: OrderField::Title,
                descending: false,
            },
            ..TaskFilter::default()
        };
        let (tasks, _) = repo.list(&filter, 0, 10).await.unwrap();
        let titles: Vec<_> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["apple", "banana", "cherry"]);
    }

    #[tokio::test]
    async fn test_list_pagination_window_and_total() {
        let repo = InMemoryTaskRepository::new();
        for i in 0..15 {
            repo.create(new_task(&format!("task {}", i), TaskStatus::Active))
                .await
                .unwrap();
        }

        let (window, total) = repo.list(&TaskFilter::default(), 10, 10).await.unwrap();
        assert_eq!(total, 15);
        assert_eq!(window.len(), 5);
    }

    #[tokio::test]
    async fn test_list_combines_status_and_search() {
        let repo = InMemoryTaskRepository::new();
        repo.create(new_task("Buy milk", TaskStatus::Completed))
            .await
            .unwrap();
        repo.create(new_task("Buy bread", TaskStatus::Completed))
            .await
            .unwrap();
        repo.create(new_task("Buy milk again", TaskStatus::Active))
            .await
            .unwrap();

        let filter = TaskFilter {
            status: Some(TaskStatus::Completed),
            search: Some("milk".to_string()),
            ..TaskFilter::default()
        };
        let (tasks, total) = repo.list(&filter, 0, 10).await.unwrap();

        assert_eq!(total, 1);
        assert_eq!(tasks[0].title, "Buy milk");
    }

    #[tokio::test]
    async fn test_list_created_bounds_are_inclusive() {
        let repo = InMemoryTaskRepository::new();
        let task = repo
            .create(new_task("Buy milk", TaskStatus::Active))
            .await
            .unwrap();

        let filter = TaskFilter {
            created_after: Some(task.created_at),
            created_before: Some(task.created_at),
            ..TaskFilter::default()
        };
        let (_, total) = repo.list(&filter, 0, 10).await.unwrap();
        assert_eq!(total, 1);
    }
}
