use thiserror::Error;

use crate::scheduler::task::TaskStatus;
use crate::scheduler::{NodeId, TaskId};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("No node available")]
    NoNodeAvailable,

    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
