use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::error::SchedulerError;
use crate::scheduler::{NodeId, SchedulerEngine, SchedulerKind, Task, TaskId, WorkerNode};

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<RwLock<SchedulerEngine>>,
}

/// Build the full REST router. The dashboards are browser pages served from
/// other origins, so CORS stays wide open.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/nodes", get(list_nodes_handler))
        .route("/add_node", post(add_node_handler))
        .route("/remove_node", post(remove_node_handler))
        .route("/tasks", get(list_tasks_handler))
        .route("/add_task", post(add_task_handler))
        .route("/scheduler_info", get(scheduler_info_handler))
        .route("/set_scheduler", post(set_scheduler_handler))
        .route("/db_stats", get(db_stats_handler))
        .layer(cors)
        .with_state(state)
}

// ---- error mapping ----

/// Wrapper that turns engine errors into the `{"error": <message>}` envelope
/// every failing route returns.
struct ApiError(SchedulerError);

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        Self(err)
    }
}

// A body the extractor cannot deserialize (wrong type, bad JSON) gets the
// same envelope as any other bad input instead of axum's plain-text reply.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SchedulerError::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SchedulerError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            SchedulerError::TaskNotFound(_) | SchedulerError::NodeNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SchedulerError::NoNodeAvailable => StatusCode::SERVICE_UNAVAILABLE,
            SchedulerError::InvalidTransition { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

// ---- wire types ----

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct NodeResponse {
    id: NodeId,
    task_count: usize,
    task_ids: Vec<TaskId>,
}

impl From<&WorkerNode> for NodeResponse {
    fn from(node: &WorkerNode) -> Self {
        Self {
            id: node.id,
            task_count: node.task_count(),
            task_ids: node.task_ids.clone(),
        }
    }
}

#[derive(Serialize)]
struct AddNodeResponse {
    message: &'static str,
    node: NodeResponse,
}

/// Task as the dashboards consume it; `status` is the integer code 0/1/2.
#[derive(Serialize)]
struct TaskResponse {
    id: TaskId,
    name: String,
    duration: u32,
    status: u8,
}

impl From<&Task> for TaskResponse {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            name: task.name.clone(),
            duration: task.duration_secs,
            status: task.status.code(),
        }
    }
}

#[derive(Serialize)]
struct AddTaskResponse {
    message: &'static str,
    task: TaskResponse,
}

// Request fields are optional so a missing field gets a specific message
// rather than a generic deserialization error.
#[derive(Deserialize)]
struct AddTaskRequest {
    name: Option<String>,
    duration: Option<u32>,
}

#[derive(Deserialize)]
struct RemoveNodeRequest {
    node_id: Option<NodeId>,
}

#[derive(Deserialize)]
struct SetSchedulerRequest {
    #[serde(rename = "type")]
    scheduler_type: Option<String>,
}

#[derive(Serialize)]
struct SchedulerInfoResponse {
    #[serde(rename = "type")]
    scheduler_type: &'static str,
    name: &'static str,
}

impl From<SchedulerKind> for SchedulerInfoResponse {
    fn from(kind: SchedulerKind) -> Self {
        Self {
            scheduler_type: kind.as_str(),
            name: kind.display_name(),
        }
    }
}

// ---- handlers ----

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

async fn list_nodes_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    let nodes: Vec<NodeResponse> = engine.list_nodes().iter().map(NodeResponse::from).collect();
    Json(nodes)
}

async fn add_node_handler(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let node = state.engine.write().await.add_node()?;
    Ok((
        StatusCode::CREATED,
        Json(AddNodeResponse {
            message: "Node added",
            node: NodeResponse::from(&node),
        }),
    )
        .into_response())
}

async fn remove_node_handler(
    State(state): State<ApiState>,
    payload: Result<Json<RemoveNodeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let Some(node_id) = payload.node_id else {
        return Err(SchedulerError::InvalidArgument("Missing node id".to_string()).into());
    };
    state.engine.write().await.remove_node(node_id)?;
    Ok(Json(MessageResponse {
        message: "Node removed",
    })
    .into_response())
}

async fn list_tasks_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let engine = state.engine.read().await;
    let tasks: Vec<TaskResponse> = engine.list_tasks().iter().map(TaskResponse::from).collect();
    Json(tasks)
}

async fn add_task_handler(
    State(state): State<ApiState>,
    payload: Result<Json<AddTaskRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let (Some(name), Some(duration)) = (payload.name, payload.duration) else {
        return Err(
            SchedulerError::InvalidArgument("Missing task name or duration".to_string()).into(),
        );
    };
    let task = state.engine.write().await.submit_task(&name, duration)?;
    Ok((
        StatusCode::CREATED,
        Json(AddTaskResponse {
            message: "Task added",
            task: TaskResponse::from(&task),
        }),
    )
        .into_response())
}

async fn scheduler_info_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let kind = state.engine.read().await.scheduler_kind();
    Json(SchedulerInfoResponse::from(kind))
}

async fn set_scheduler_handler(
    State(state): State<ApiState>,
    payload: Result<Json<SetSchedulerRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(payload) = payload?;
    let Some(raw) = payload.scheduler_type else {
        return Err(SchedulerError::InvalidArgument("Missing scheduler type".to_string()).into());
    };
    let kind: SchedulerKind = raw.parse()?;
    let active = state.engine.write().await.set_scheduler(kind);
    Ok(Json(SchedulerInfoResponse::from(active)).into_response())
}

async fn db_stats_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let stats = state.engine.read().await.stats();
    Json(stats)
}
