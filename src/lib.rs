pub mod api;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod scheduler;
pub mod server;
pub mod shutdown;
pub mod stats;

pub use config::ServerConfig;
pub use error::{Result, SchedulerError};
pub use scheduler::{SchedulerEngine, SchedulerKind};
pub use stats::StatsSnapshot;
