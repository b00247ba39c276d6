use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::error::{Result, SchedulerError};
use crate::scheduler::{NodeId, TaskId};

/// A simulated worker unit and the tasks currently bound to it.
#[derive(Debug, Clone)]
pub struct WorkerNode {
    pub id: NodeId,
    /// Non-completed tasks assigned to this node, in binding order.
    pub task_ids: Vec<TaskId>,
    pub created_at: DateTime<Utc>,
}

impl WorkerNode {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            task_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Current load: the number of non-completed tasks bound to this node.
    pub fn task_count(&self) -> usize {
        self.task_ids.len()
    }
}

/// Tracks the set of worker nodes.
///
/// Ids are allocated monotonically from 1 and never reused; map iteration
/// order is therefore registration order.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeId, WorkerNode>,
    next_id: NodeId,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            nodes: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Register a new node with no tasks. Always succeeds.
    pub fn add(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, WorkerNode::new(id));
        id
    }

    /// Remove a node, returning its record so the caller can resolve the
    /// tasks that were bound to it.
    pub fn remove(&mut self, id: NodeId) -> Result<WorkerNode> {
        self.nodes
            .remove(&id)
            .ok_or(SchedulerError::NodeNotFound(id))
    }

    pub fn get(&self, id: NodeId) -> Result<&WorkerNode> {
        self.nodes.get(&id).ok_or(SchedulerError::NodeNotFound(id))
    }

    /// All nodes in registration order.
    pub fn list(&self) -> Vec<&WorkerNode> {
        self.nodes.values().collect()
    }

    /// Record that `task_id` is now bound to `node_id`.
    pub fn bind(&mut self, node_id: NodeId, task_id: TaskId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(SchedulerError::NodeNotFound(node_id))?;
        if !node.task_ids.contains(&task_id) {
            node.task_ids.push(task_id);
        }
        Ok(())
    }

    /// Release a finished (or reassigned) task from `node_id`.
    pub fn release(&mut self, node_id: NodeId, task_id: TaskId) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(SchedulerError::NodeNotFound(node_id))?;
        node.task_ids.retain(|&t| t != task_id);
        Ok(())
    }

    /// Replace a node's task list wholesale. Used by reconciliation.
    pub(crate) fn overwrite_tasks(&mut self, node_id: NodeId, task_ids: Vec<TaskId>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&node_id)
            .ok_or(SchedulerError::NodeNotFound(node_id))?;
        node.task_ids = task_ids;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
