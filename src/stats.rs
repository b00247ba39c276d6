use serde::Serialize;

/// Point-in-time aggregate counts backing the `/db_stats` dashboard panel.
///
/// Computed in a single pass under one engine guard, so the totals always
/// add up: `total_tasks == pending + running + completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub total_tasks: usize,
    pub pending_tasks: usize,
    pub running_tasks: usize,
    pub completed_tasks: usize,
    pub total_nodes: usize,
}
