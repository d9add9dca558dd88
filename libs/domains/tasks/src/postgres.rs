use async_trait::async_trait;
use sea_orm::sea_query::{Expr, ExprTrait, Func, Order};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};

use crate::entity;
use crate::error::{TaskError, TaskResult};
use crate::filter::{OrderField, TaskFilter};
use crate::models::{NewTask, Task, TaskChanges};
use crate::repository::TaskRepository;

/// PostgreSQL implementation of TaskRepository on SeaORM.
///
/// Listing relies on the `status` and `created_at` indexes; a single-row
/// update is one UPDATE statement, so readers never observe a half-written
/// record.
pub struct PgTaskRepository {
    db: DatabaseConnection,
}

impl PgTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Escape LIKE wildcards in user-supplied needles
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Case-insensitive substring condition on the title column
fn title_contains(query: Select<entity::Entity>, needle: &str) -> Select<entity::Entity> {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    query.filter(
        Expr::expr(Func::lower(Expr::col((
            entity::Entity,
            entity::Column::Title,
        ))))
        .like(pattern),
    )
}

fn apply_filter(filter: &TaskFilter) -> Select<entity::Entity> {
    let mut query = entity::Entity::find();

    if let Some(status) = filter.status {
        query = query.filter(entity::Column::Status.eq(status));
    }
    if let Some(ref needle) = filter.title {
        query = title_contains(query, needle);
    }
    if let Some(ref needle) = filter.search {
        query = title_contains(query, needle);
    }
    if let Some(after) = filter.created_after {
        query = query.filter(entity::Column::CreatedAt.gte(after));
    }
    if let Some(before) = filter.created_before {
        query = query.filter(entity::Column::CreatedAt.lte(before));
    }

    let column = match filter.ordering.field {
        OrderField::CreatedAt => entity::Column::CreatedAt,
        OrderField::UpdatedAt => entity::Column::UpdatedAt,
        OrderField::Title => entity::Column::Title,
        OrderField::Status => entity::Column::Status,
    };
    let order = if filter.ordering.descending {
        Order::Desc
    } else {
        Order::Asc
    };

    // id as tie-breaker keeps listings deterministic
    query
        .order_by(column, order.clone())
        .order_by(entity::Column::Id, order)
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn create(&self, input: NewTask) -> TaskResult<Task> {
        let active_model: entity::ActiveModel = input.into();

        let model = active_model.insert(&self.db).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to create task");
            TaskError::Internal(format!("Database error: {}", e))
        })?;

        Ok(model.into())
    }

    async fn get_by_id(&self, id: i64) -> TaskResult<Option<Task>> {
        let model = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(task_id = id, error = %e, "Failed to fetch task");
                TaskError::Internal(format!("Database error: {}", e))
            })?;

        Ok(model.map(|m| m.into()))
    }

    async fn list(
        &self,
        filter: &TaskFilter,
        offset: u64,
        limit: u64,
    ) -> TaskResult<(Vec<Task>, u64)> {
        let query = apply_filter(filter);

        let total = query.clone().count(&self.db).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to count tasks");
            TaskError::Internal(format!("Database error: {}", e))
        })?;

        let models = query
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to list tasks");
                TaskError::Internal(format!("Database error: {}", e))
            })?;

        Ok((models.into_iter().map(|m| m.into()).collect(), total))
    }

    async fn update(&self, id: i64, changes: TaskChanges) -> TaskResult<Option<Task>> {
        let Some(model) = entity::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(task_id = id, error = %e, "Failed to fetch task for update");
                TaskError::Internal(format!("Database error: {}", e))
            })?
        else {
            return Ok(None);
        };

        let mut active_model: entity::ActiveModel = model.into();
        if let Some(title) = changes.title {
            active_model.title = Set(title);
        }
        if let Some(status) = changes.status {
            active_model.status = Set(status);
        }
        active_model.updated_at = Set(chrono::Utc::now().into());

        let updated = active_model.update(&self.db).await.map_err(|e| {
            tracing::error!(task_id = id, error = %e, "Failed to update task");
            TaskError::Internal(format!("Database error: {}", e))
        })?;

        Ok(Some(updated.into()))
    }

    async fn delete(&self, id: i64) -> TaskResult<bool> {
        let result = entity::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                tracing::error!(task_id = id, error = %e, "Failed to delete task");
                TaskError::Internal(format!("Database error: {}", e))
            })?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
