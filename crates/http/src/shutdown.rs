use tokio::signal;

/// Resolve on the first of Ctrl+C or SIGTERM.
pub async fn signal() {
    tokio::select! {
        _ = ctrl_c() => {},
        _ = sigterm() => {},
    }

    tracing::info!("shutdown signal received, initiating graceful shutdown");
}

async fn ctrl_c() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C signal"),
        Err(e) => {
            tracing::error!(%e, "error handling Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(unix)]
async fn sigterm() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut handler) => {
            handler.recv().await;
            tracing::info!("received SIGTERM signal");
        }
        Err(e) => {
            tracing::error!(%e, "failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await
}
