use std::str::FromStr;

use crate::error::SchedulerError;
use crate::scheduler::registry::WorkerNode;
use crate::scheduler::task::Task;
use crate::scheduler::NodeId;

/// The closed set of scheduling policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Fifo,
    RoundRobin,
    LoadBalanced,
}

impl SchedulerKind {
    /// Wire identifier, as the dashboards send and receive it.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerKind::Fifo => "fifo",
            SchedulerKind::RoundRobin => "roundrobin",
            SchedulerKind::LoadBalanced => "loadbalanced",
        }
    }

    /// Human-readable name for scheduler_info responses.
    pub fn display_name(&self) -> &'static str {
        match self {
            SchedulerKind::Fifo => "FIFO",
            SchedulerKind::RoundRobin => "RoundRobin",
            SchedulerKind::LoadBalanced => "LoadBalanced",
        }
    }
}

impl std::fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchedulerKind {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fifo" => Ok(SchedulerKind::Fifo),
            "roundrobin" => Ok(SchedulerKind::RoundRobin),
            "loadbalanced" => Ok(SchedulerKind::LoadBalanced),
            other => Err(SchedulerError::InvalidArgument(format!(
                "unknown scheduler type '{other}', expected fifo, roundrobin or loadbalanced"
            ))),
        }
    }
}

/// Strategy that picks a target node for a newly submitted task.
///
/// `candidates` is the full node list in registration order; `None` means no
/// node is available and the task stays pending-unassigned. Policies carrying
/// internal state (the round-robin cursor) get `on_nodes_changed` whenever
/// the membership changes so they never reference a stale index.
pub trait SchedulerPolicy: Send + Sync {
    fn kind(&self) -> SchedulerKind;

    fn select_node(&mut self, candidates: &[&WorkerNode], task: &Task) -> Option<NodeId>;

    fn on_nodes_changed(&mut self, _node_count: usize) {}
}

/// Always places on the first node in registration order.
#[derive(Debug, Default)]
pub struct Fifo;

impl SchedulerPolicy for Fifo {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::Fifo
    }

    fn select_node(&mut self, candidates: &[&WorkerNode], _task: &Task) -> Option<NodeId> {
        candidates.first().map(|node| node.id)
    }
}

/// Cycles through nodes in registration order, starting at node[0].
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: usize,
}

impl SchedulerPolicy for RoundRobin {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::RoundRobin
    }

    fn select_node(&mut self, candidates: &[&WorkerNode], _task: &Task) -> Option<NodeId> {
        if candidates.is_empty() {
            return None;
        }
        let index = self.cursor % candidates.len();
        self.cursor = (index + 1) % candidates.len();
        Some(candidates[index].id)
    }

    fn on_nodes_changed(&mut self, node_count: usize) {
        // Clamp into the new range so the cursor never points past the end.
        if node_count == 0 {
            self.cursor = 0;
        } else {
            self.cursor %= node_count;
        }
    }
}

/// Places on the node with the fewest live tasks; ties go to the lowest id.
#[derive(Debug, Default)]
pub struct LoadBalanced;

impl SchedulerPolicy for LoadBalanced {
    fn kind(&self) -> SchedulerKind {
        SchedulerKind::LoadBalanced
    }

    fn select_node(&mut self, candidates: &[&WorkerNode], _task: &Task) -> Option<NodeId> {
        candidates
            .iter()
            .min_by_key(|node| (node.task_count(), node.id))
            .map(|node| node.id)
    }
}

/// Build a fresh policy of the given kind (cursor state starts over).
pub fn policy_for(kind: SchedulerKind) -> Box<dyn SchedulerPolicy> {
    match kind {
        SchedulerKind::Fifo => Box::new(Fifo),
        SchedulerKind::RoundRobin => Box::new(RoundRobin::default()),
        SchedulerKind::LoadBalanced => Box::new(LoadBalanced),
    }
}
