pub mod engine;
pub mod policy;
pub mod registry;
pub mod store;
pub mod task;

pub use engine::{SchedulerEngine, TickSummary};
pub use policy::{SchedulerKind, SchedulerPolicy};
pub use registry::{NodeRegistry, WorkerNode};
pub use store::TaskStore;
pub use task::{Task, TaskStatus};

/// Monotonic identifier for a task, allocated from 1 and never reused.
pub type TaskId = u64;
/// Monotonic identifier for a worker node, allocated from 1 and never reused.
pub type NodeId = u64;
