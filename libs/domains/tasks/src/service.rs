use std::sync::Arc;

use crate::error::{TaskError, TaskResult};
use crate::filter::TaskFilter;
use crate::models::{CreateTask, Task, TaskChanges, TaskStatus, UpdateTask};
use crate::repository::TaskRepository;

/// Service layer for Task business logic.
///
/// Validates input before any repository call and emits one structured log
/// record per successful mutation.
#[derive(Clone)]
pub struct TaskService<R: TaskRepository> {
    repository: Arc<R>,
}

impl<R: TaskRepository> TaskService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new task with validation
    pub async fn create_task(&self, input: CreateTask) -> TaskResult<Task> {
        let new_task = input.validated().map_err(TaskError::Validation)?;

        let task = self.repository.create(new_task).await?;
        tracing::info!(task_id = task.id, title = %task.title, "Created task");
        Ok(task)
    }

    /// Get a task by id
    pub async fn get_task(&self, id: i64) -> TaskResult<Task> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(TaskError::NotFound(id))
    }

    /// List tasks with filters.
    ///
    /// Returns the requested window plus the total match count before
    /// pagination.
    pub async fn list_tasks(
        &self,
        filter: &TaskFilter,
        offset: u64,
        limit: u64,
    ) -> TaskResult<(Vec<Task>, u64)> {
        self.repository.list(filter, offset, limit).await
    }

    /// Update a task. Serves both full and partial updates: absent fields
    /// are left unchanged.
    pub async fn update_task(&self, id: i64, input: UpdateTask) -> TaskResult<Task> {
        let changes = input.validated().map_err(TaskError::Validation)?;

        let task = self
            .repository
            .update(id, changes)
            .await?
            .ok_or(TaskError::NotFound(id))?;
        tracing::info!(task_id = task.id, title = %task.title, "Updated task");
        Ok(task)
    }

    /// Delete a task
    pub async fn delete_task(&self, id: i64) -> TaskResult<()> {
        let task = self.get_task(id).await?;

        if !self.repository.delete(id).await? {
            return Err(TaskError::NotFound(id));
        }

        tracing::info!(task_id = task.id, title = %task.title, "Deleted task");
        Ok(())
    }

    /// Mark a task completed, refreshing its `updated_at`
    pub async fn complete_task(&self, id: i64) -> TaskResult<Task> {
        let task = self
            .repository
            .update(id, TaskChanges::with_status(TaskStatus::Completed))
            .await?
            .ok_or(TaskError::NotFound(id))?;
        tracing::info!(task_id = task.id, "Task marked completed");
        Ok(task)
    }

    /// Mark a task active, refreshing its `updated_at`
    pub async fn activate_task(&self, id: i64) -> TaskResult<Task> {
        let task = self
            .repository
            .update(id, TaskChanges::with_status(TaskStatus::Active))
            .await?
            .ok_or(TaskError::NotFound(id))?;
        tracing::info!(task_id = task.id, "Task marked active");
        Ok(task)
    }
}
