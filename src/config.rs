use std::net::SocketAddr;
use std::time::Duration;

use crate::scheduler::SchedulerKind;

/// Runtime configuration for the server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    pub listen_addr: SocketAddr,
    /// Lifecycle tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Scheduling policy installed at startup.
    pub initial_scheduler: SchedulerKind,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // SAFETY: This is a hardcoded valid address that will always parse
            listen_addr: "0.0.0.0:18080"
                .parse()
                .expect("default listen address is valid"),
            tick_interval_ms: 1000,
            initial_scheduler: SchedulerKind::Fifo,
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            ..Default::default()
        }
    }

    pub fn with_tick_interval_ms(mut self, tick_interval_ms: u64) -> Self {
        self.tick_interval_ms = tick_interval_ms;
        self
    }

    pub fn with_scheduler(mut self, kind: SchedulerKind) -> Self {
        self.initial_scheduler = kind;
        self
    }

    /// Tick interval as a `Duration`. Zero is bumped to 1ms because a
    /// zero-period `tokio::time::interval` panics.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}
