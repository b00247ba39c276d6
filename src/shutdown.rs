use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Listen for SIGTERM/SIGINT in a background task and cancel the returned
/// token when either arrives. Subsystems watch the token and drain instead
/// of being killed mid-request.
pub fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");

        tokio::select! {
            _ = sigterm.recv() => tracing::info!(signal = "SIGTERM", "Shutting down"),
            _ = sigint.recv() => tracing::info!(signal = "SIGINT", "Shutting down"),
        }

        trigger.cancel();
    });

    token
}
