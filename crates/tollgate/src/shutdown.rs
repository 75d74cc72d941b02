// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal handling: Ctrl+C (and SIGTERM on unix) cancel the returned token.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
        debug!("cancellation requested");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("received SIGINT (Ctrl+C), cancelling"),
                _ = sigterm.recv() => info!("received SIGTERM, cancelling"),
            }
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable; listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            info!("received Ctrl+C, cancelling");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, cancelling");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }
}
