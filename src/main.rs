use std::net::SocketAddr;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use taskmaster::config::ServerConfig;
use taskmaster::scheduler::SchedulerKind;

#[derive(Parser, Debug)]
#[command(name = "taskmaster")]
#[command(version)]
#[command(about = "A task scheduling and node-assignment engine")]
struct Args {
    /// Address to bind the HTTP API to
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port for the HTTP API
    #[arg(long, default_value = "18080")]
    port: u16,

    /// Lifecycle tick interval in milliseconds
    #[arg(long, default_value = "1000")]
    tick_interval_ms: u64,

    /// Scheduling policy active at startup
    #[arg(long, default_value = "fifo")]
    scheduler: SchedulerArg,
}

#[derive(Debug, Clone, ValueEnum)]
enum SchedulerArg {
    Fifo,
    Roundrobin,
    Loadbalanced,
}

impl From<SchedulerArg> for SchedulerKind {
    fn from(arg: SchedulerArg) -> Self {
        match arg {
            SchedulerArg::Fifo => SchedulerKind::Fifo,
            SchedulerArg::Roundrobin => SchedulerKind::RoundRobin,
            SchedulerArg::Loadbalanced => SchedulerKind::LoadBalanced,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let listen_addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    let config = ServerConfig::new(listen_addr)
        .with_tick_interval_ms(args.tick_interval_ms)
        .with_scheduler(args.scheduler.into());

    taskmaster::server::run(config).await
}
