use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SchedulerError};
use crate::scheduler::policy::{policy_for, SchedulerKind, SchedulerPolicy};
use crate::scheduler::registry::{NodeRegistry, WorkerNode};
use crate::scheduler::store::TaskStore;
use crate::scheduler::task::{Task, TaskStatus};
use crate::scheduler::{NodeId, TaskId};
use crate::stats::StatsSnapshot;

/// What a single lifecycle tick changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub started: usize,
    pub completed: usize,
    pub repaired: usize,
}

impl TickSummary {
    pub fn is_idle(&self) -> bool {
        self.started == 0 && self.completed == 0 && self.repaired == 0
    }
}

/// The assignment engine: task store, node registry and the active policy,
/// mutated together so no observer ever sees half of a placement.
///
/// The engine itself is synchronous; callers put it behind an
/// `Arc<RwLock<_>>` and every method runs inside one guard scope.
pub struct SchedulerEngine {
    store: TaskStore,
    registry: NodeRegistry,
    policy: Box<dyn SchedulerPolicy>,
}

impl SchedulerEngine {
    pub fn new(kind: SchedulerKind) -> Self {
        Self {
            store: TaskStore::new(),
            registry: NodeRegistry::new(),
            policy: policy_for(kind),
        }
    }

    // ---- tasks ----

    /// Create a task and route it through the active policy. With no node
    /// registered the task is still created and waits unassigned; the next
    /// `add_node` picks it up.
    pub fn submit_task(&mut self, name: &str, duration_secs: u32) -> Result<Task> {
        let task_id = self.store.create(name, duration_secs)?.id;
        match self.try_assign(task_id) {
            Ok(node_id) => {
                info!(task_id, node_id, scheduler = %self.policy.kind(), "Task assigned");
            }
            Err(SchedulerError::NoNodeAvailable) => {
                warn!(task_id, "No node available, task waits unassigned");
            }
            Err(err) => return Err(err),
        }
        self.store.get(task_id).cloned()
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        self.store.get(id).cloned()
    }

    /// All tasks in creation order.
    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.list().into_iter().cloned().collect()
    }

    // ---- nodes ----

    /// Register a new node, then give every unassigned task another pass
    /// through the active policy (which still decides where each one lands).
    pub fn add_node(&mut self) -> Result<WorkerNode> {
        let node_id = self.registry.add();
        self.policy.on_nodes_changed(self.registry.len());

        let mut backlog_assigned = 0usize;
        for task_id in self.store.unassigned_pending() {
            match self.try_assign(task_id) {
                Ok(target) => {
                    backlog_assigned += 1;
                    debug!(task_id, node_id = target, "Backlog task assigned");
                }
                Err(SchedulerError::NoNodeAvailable) => break,
                Err(err) => return Err(err),
            }
        }

        info!(node_id, backlog_assigned, "Node added");
        self.registry.get(node_id).cloned()
    }

    /// Remove a node and resolve every task bound to it in the same critical
    /// section: reassign through the active policy while other nodes remain,
    /// otherwise revert to Pending-unassigned. A reassigned Running task
    /// keeps its status and start time; nothing references the node
    /// afterwards.
    pub fn remove_node(&mut self, node_id: NodeId) -> Result<()> {
        let removed = self.registry.remove(node_id)?;
        self.policy.on_nodes_changed(self.registry.len());

        let mut reassigned = 0usize;
        let mut reverted = 0usize;
        for task_id in self.store.referencing_node(node_id) {
            if self.store.get(task_id)?.status == TaskStatus::Completed {
                // Completed tasks only carry the reference as history.
                self.store.get_mut(task_id)?.assigned_node = None;
                continue;
            }
            if self.registry.is_empty() {
                self.store.revert_to_unassigned(task_id)?;
                reverted += 1;
                continue;
            }
            self.store.get_mut(task_id)?.assigned_node = None;
            match self.try_assign(task_id) {
                Ok(target) => {
                    reassigned += 1;
                    debug!(task_id, from = node_id, to = target, "Task reassigned");
                }
                Err(SchedulerError::NoNodeAvailable) => {
                    self.store.revert_to_unassigned(task_id)?;
                    reverted += 1;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            node_id,
            orphaned = removed.task_count(),
            reassigned,
            reverted,
            "Node removed"
        );
        Ok(())
    }

    pub fn get_node(&self, id: NodeId) -> Result<WorkerNode> {
        self.registry.get(id).cloned()
    }

    /// All nodes in registration order.
    pub fn list_nodes(&self) -> Vec<WorkerNode> {
        self.registry.list().into_iter().cloned().collect()
    }

    // ---- scheduler policy ----

    /// Install a new policy. Requesting the kind that is already active is a
    /// no-op, so a redundant call does not reset the round-robin cursor.
    pub fn set_scheduler(&mut self, kind: SchedulerKind) -> SchedulerKind {
        if self.policy.kind() != kind {
            let previous = self.policy.kind();
            self.policy = policy_for(kind);
            info!(from = %previous, to = %kind, "Scheduler switched");
        }
        self.policy.kind()
    }

    pub fn scheduler_kind(&self) -> SchedulerKind {
        self.policy.kind()
    }

    // ---- aggregates ----

    pub fn stats(&self) -> StatsSnapshot {
        let (pending, running, completed) = self.store.status_counts();
        StatsSnapshot {
            total_tasks: self.store.len(),
            pending_tasks: pending,
            running_tasks: running,
            completed_tasks: completed,
            total_nodes: self.registry.len(),
        }
    }

    // ---- lifecycle ----

    /// One lifecycle step against the supplied clock. Completions run before
    /// promotions, so a task stays Running for at least one full tick.
    pub fn advance_clock(&mut self, now: DateTime<Utc>) -> TickSummary {
        let mut summary = TickSummary::default();

        let due: Vec<TaskId> = self
            .store
            .list()
            .into_iter()
            .filter(|task| task.is_due(now))
            .map(|task| task.id)
            .collect();
        for task_id in due {
            match self.complete_task(task_id, now) {
                Ok(()) => summary.completed += 1,
                Err(err) => error!(task_id, %err, "Completing due task failed"),
            }
        }

        let ready: Vec<TaskId> = self
            .store
            .list()
            .into_iter()
            .filter(|task| task.status == TaskStatus::Pending && task.assigned_node.is_some())
            .map(|task| task.id)
            .collect();
        for task_id in ready {
            match self.start_task(task_id, now) {
                Ok(()) => summary.started += 1,
                Err(err) => error!(task_id, %err, "Starting assigned task failed"),
            }
        }

        summary.repaired = self.reconcile();
        summary
    }

    /// Rebuild each node's task list from the store's back-references.
    /// Returns the number of nodes that had to be repaired; anything nonzero
    /// means the two views drifted apart, which the caller logs loudly.
    pub fn reconcile(&mut self) -> usize {
        let node_ids: Vec<NodeId> = self.registry.list().iter().map(|node| node.id).collect();
        let mut repaired = 0usize;
        for node_id in node_ids {
            // active_on_node is ascending by id; the registry list is in
            // binding order, which a reassignment can scramble. Membership
            // is what has to agree, not order.
            let expected = self.store.active_on_node(node_id);
            let mut current = match self.registry.get(node_id) {
                Ok(node) => node.task_ids.clone(),
                Err(_) => continue,
            };
            current.sort_unstable();
            if current != expected {
                warn!(
                    node_id,
                    have = current.len(),
                    want = expected.len(),
                    "Repairing drifted node task list"
                );
                if self.registry.overwrite_tasks(node_id, expected).is_ok() {
                    repaired += 1;
                }
            }
        }
        repaired
    }

    // ---- internals ----

    /// Pick a node for the task via the active policy and bind both sides of
    /// the relationship. Status is untouched; promotion happens on the next
    /// tick.
    fn try_assign(&mut self, task_id: TaskId) -> Result<NodeId> {
        let task = self.store.get(task_id)?;
        let candidates = self.registry.list();
        let node_id = self
            .policy
            .select_node(&candidates, task)
            .ok_or(SchedulerError::NoNodeAvailable)?;
        self.registry.bind(node_id, task_id)?;
        self.store.get_mut(task_id)?.assigned_node = Some(node_id);
        Ok(node_id)
    }

    fn start_task(&mut self, task_id: TaskId, now: DateTime<Utc>) -> Result<()> {
        self.store.update_status(task_id, TaskStatus::Running)?;
        self.store.get_mut(task_id)?.started_at = Some(now);
        debug!(task_id, "Task running");
        Ok(())
    }

    fn complete_task(&mut self, task_id: TaskId, now: DateTime<Utc>) -> Result<()> {
        self.store.update_status(task_id, TaskStatus::Completed)?;
        let task = self.store.get_mut(task_id)?;
        task.completed_at = Some(now);
        let node_id = task.assigned_node;
        if let Some(node_id) = node_id {
            // Completion frees the node slot; the back-reference stays as a
            // record of where the task ran.
            self.registry.release(node_id, task_id)?;
        }
        info!(task_id, node_id = ?node_id, "Task completed");
        Ok(())
    }
}
