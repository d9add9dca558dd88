use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_helpers::ErrorResponse;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::TaskResult;
use crate::filter::{ListTasksQuery, TaskFilter};
use crate::models::{CreateTask, TaskResponse, TaskStatus, UpdateTask};
use crate::pagination::{Page, PageRequest};
use crate::repository::TaskRepository;
use crate::service::TaskService;

const TAG: &str = "tasks";

/// OpenAPI documentation for the Tasks API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_tasks,
        create_task,
        get_task,
        update_task,
        patch_task,
        delete_task,
        list_active_tasks,
        list_completed_tasks,
        complete_task,
        activate_task,
    ),
    components(schemas(
        TaskResponse,
        TaskStatus,
        CreateTask,
        UpdateTask,
        Page<TaskResponse>,
        ErrorResponse,
    )),
    tags(
        (name = TAG, description = "Task management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the tasks router with all HTTP endpoints
pub fn router<R: TaskRepository + 'static>(service: TaskService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_tasks).post(create_task))
        .route(
            "/{id}",
            get(get_task)
                .put(update_task)
                .patch(patch_task)
                .delete(delete_task),
        )
        .route("/active", get(list_active_tasks))
        .route("/completed", get(list_completed_tasks))
        .route("/{id}/complete", post(complete_task))
        .route("/{id}/activate", post(activate_task))
        .with_state(shared_service)
}

/// Run a listing through the service and wrap it in the pagination envelope
async fn paginated<R: TaskRepository>(
    service: &TaskService<R>,
    filter: TaskFilter,
    page: PageRequest,
    uri: &Uri,
) -> TaskResult<Json<Page<TaskResponse>>> {
    let (tasks, count) = service
        .list_tasks(&filter, page.offset(), page.limit())
        .await?;
    let results = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(Json(Page::build(results, count, page, uri)?))
}

/// List tasks with filtering, ordering, and pagination
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(ListTasksQuery),
    responses(
        (status = 200, description = "Paginated list of tasks", body = Page<TaskResponse>),
        (status = 400, description = "Invalid filter value", body = ErrorResponse),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
async fn list_tasks<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListTasksQuery>,
) -> TaskResult<Json<Page<TaskResponse>>> {
    let filter = TaskFilter::from_query(&query)?;
    let page = PageRequest::from_param(query.page.as_deref())?;
    paginated(&service, filter, page, &uri).await
}

/// Create a new task
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateTask,
    responses(
        (status = 201, description = "Task created successfully", body = TaskResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
async fn create_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> TaskResult<impl IntoResponse> {
    let Json(input) = payload?;
    let task = service.create_task(input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(task))))
}

/// Get a task by id
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task found", body = TaskResponse),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn get_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
) -> TaskResult<Json<TaskResponse>> {
    let task = service.get_task(id).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Update a task (absent fields are left unchanged)
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn update_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> TaskResult<Json<TaskResponse>> {
    let Json(input) = payload?;
    let task = service.update_task(id, input).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Partially update a task
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTask,
    responses(
        (status = 200, description = "Task updated successfully", body = TaskResponse),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn patch_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateTask>, JsonRejection>,
) -> TaskResult<Json<TaskResponse>> {
    let Json(input) = payload?;
    let task = service.update_task(id, input).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted successfully"),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn delete_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
) -> TaskResult<impl IntoResponse> {
    service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List active tasks
#[utoipa::path(
    get,
    path = "/active",
    tag = TAG,
    responses(
        (status = 200, description = "Paginated list of active tasks", body = Page<TaskResponse>),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
async fn list_active_tasks<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListTasksQuery>,
) -> TaskResult<Json<Page<TaskResponse>>> {
    let page = PageRequest::from_param(query.page.as_deref())?;
    paginated(
        &service,
        TaskFilter::for_status(TaskStatus::Active),
        page,
        &uri,
    )
    .await
}

/// List completed tasks
#[utoipa::path(
    get,
    path = "/completed",
    tag = TAG,
    responses(
        (status = 200, description = "Paginated list of completed tasks", body = Page<TaskResponse>),
        (status = 404, description = "Page out of range", body = ErrorResponse)
    )
)]
async fn list_completed_tasks<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListTasksQuery>,
) -> TaskResult<Json<Page<TaskResponse>>> {
    let page = PageRequest::from_param(query.page.as_deref())?;
    paginated(
        &service,
        TaskFilter::for_status(TaskStatus::Completed),
        page,
        &uri,
    )
    .await
}

/// Mark a task completed
#[utoipa::path(
    post,
    path = "/{id}/complete",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task marked completed", body = TaskResponse),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn complete_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
) -> TaskResult<Json<TaskResponse>> {
    let task = service.complete_task(id).await?;
    Ok(Json(TaskResponse::from(task)))
}

/// Mark a task active
#[utoipa::path(
    post,
    path = "/{id}/activate",
    tag = TAG,
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task marked active", body = TaskResponse),
        (status = 404, description = "Unknown task id", body = ErrorResponse)
    )
)]
async fn activate_task<R: TaskRepository>(
    State(service): State<Arc<TaskService<R>>>,
    Path(id): Path<i64>,
) -> TaskResult<Json<TaskResponse>> {
    let task = service.activate_task(id).await?;
    Ok(Json(TaskResponse::from(task)))
}
