use std::collections::BTreeMap;

use crate::error::{Result, SchedulerError};
use crate::scheduler::task::{Task, TaskStatus};
use crate::scheduler::{NodeId, TaskId};

/// Owns every task record and its lifecycle state.
///
/// Ids are allocated monotonically from 1 and never reused, so iterating the
/// underlying map yields tasks in creation order.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, Task>,
    next_id: TaskId,
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Validate and create a new Pending task. Rejections leave the store
    /// untouched.
    pub fn create(&mut self, name: &str, duration_secs: u32) -> Result<&Task> {
        if name.trim().is_empty() {
            return Err(SchedulerError::InvalidArgument(
                "task name must not be empty".to_string(),
            ));
        }
        if duration_secs < 1 {
            return Err(SchedulerError::InvalidArgument(
                "task duration must be at least 1 second".to_string(),
            ));
        }

        let id = self.next_id;
        self.next_id += 1;
        let task = Task::new(id, name.trim().to_string(), duration_secs);
        self.tasks.insert(id, task);
        // Just inserted under this id
        Ok(&self.tasks[&id])
    }

    pub fn get(&self, id: TaskId) -> Result<&Task> {
        self.tasks.get(&id).ok_or(SchedulerError::TaskNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        self.tasks
            .get_mut(&id)
            .ok_or(SchedulerError::TaskNotFound(id))
    }

    /// All tasks in creation order.
    pub fn list(&self) -> Vec<&Task> {
        self.tasks.values().collect()
    }

    /// Apply a status change, enforcing the monotonic transition table.
    pub fn update_status(&mut self, id: TaskId, next: TaskStatus) -> Result<()> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or(SchedulerError::TaskNotFound(id))?;
        if !task.status.can_transition_to(next) {
            return Err(SchedulerError::InvalidTransition {
                task_id: id,
                from: task.status,
                to: next,
            });
        }
        task.status = next;
        Ok(())
    }

    /// Reset a task to Pending-unassigned. Only used when its node is removed
    /// and no other node can take it over; a later assignment pass restarts
    /// the work from scratch. Not reachable through `update_status`.
    pub(crate) fn revert_to_unassigned(&mut self, id: TaskId) -> Result<()> {
        let task = self
            .tasks
            .get_mut(&id)
            .ok_or(SchedulerError::TaskNotFound(id))?;
        task.status = TaskStatus::Pending;
        task.assigned_node = None;
        task.started_at = None;
        Ok(())
    }

    /// Pending tasks that were submitted while no node existed.
    pub fn unassigned_pending(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.status == TaskStatus::Pending && t.assigned_node.is_none())
            .map(|t| t.id)
            .collect()
    }

    /// Non-completed tasks bound to `node_id`, in creation order. This is the
    /// authoritative view the registry's per-node lists are reconciled
    /// against.
    pub fn active_on_node(&self, node_id: NodeId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.assigned_node == Some(node_id) && t.status != TaskStatus::Completed)
            .map(|t| t.id)
            .collect()
    }

    /// Every task (any status) still back-referencing `node_id`.
    pub fn referencing_node(&self, node_id: NodeId) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|t| t.assigned_node == Some(node_id))
            .map(|t| t.id)
            .collect()
    }

    /// Count tasks per status in one pass: (pending, running, completed).
    pub fn status_counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for task in self.tasks.values() {
            match task.status {
                TaskStatus::Pending => counts.0 += 1,
                TaskStatus::Running => counts.1 += 1,
                TaskStatus::Completed => counts.2 += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
