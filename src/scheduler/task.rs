use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::scheduler::{NodeId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
}

impl TaskStatus {
    /// Integer code used on the wire: 0=Pending, 1=Running, 2=Completed.
    pub fn code(&self) -> u8 {
        match self {
            TaskStatus::Pending => 0,
            TaskStatus::Running => 1,
            TaskStatus::Completed => 2,
        }
    }

    /// Whether `next` is a legal successor. The lifecycle is strictly
    /// Pending -> Running -> Completed, no skips, no regressions.
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Running)
                | (TaskStatus::Running, TaskStatus::Completed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Running => write!(f, "running"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A unit of simulated work with a fixed duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub duration_secs: u32,
    pub status: TaskStatus,
    /// Back-reference to the owning node by id, never a live handle.
    pub assigned_node: Option<NodeId>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: TaskId, name: String, duration_secs: u32) -> Self {
        Self {
            id,
            name,
            duration_secs,
            status: TaskStatus::Pending,
            assigned_node: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Completion deadline: `started_at + duration`. None until the task
    /// has started.
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .map(|started| started + Duration::seconds(i64::from(self.duration_secs)))
    }

    /// True when a running task's simulated work has elapsed at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::Running && self.deadline().is_some_and(|d| now >= d)
    }
}
