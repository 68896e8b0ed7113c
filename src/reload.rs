//! Configuration reload on SIGHUP.
//!
//! A single background task waits for the hangup signal for the lifetime of
//! the process. Each signal re-reads the config file; a file that fails to
//! load is logged and the running configuration stays active.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::SharedState;

/// Spawn the background reload task.
pub fn spawn_reload_listener(state: SharedState) -> JoinHandle<()> {
    tokio::spawn(reload_loop(state))
}

/// Reload once, logging the outcome instead of returning it.
pub async fn reload_and_log(state: &SharedState) {
    if let Err(e) = state.reload().await {
        error!("Failed to reload config, keeping the previous one: {}", e);
    }
}

#[cfg(unix)]
async fn reload_loop(state: SharedState) {
    use tokio::signal::unix::{SignalKind, signal};

    use crate::error::HookError;

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(sig) => sig,
        Err(e) => {
            error!("{}", HookError::Signal(e));
            return;
        }
    };

    info!("Send SIGHUP to reload {:?}", state.config_path);
    while hangup.recv().await.is_some() {
        info!("SIGHUP received, reloading config");
        reload_and_log(&state).await;
    }
}

#[cfg(not(unix))]
async fn reload_loop(_state: SharedState) {
    info!("Config reload on signal is not supported on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ProcessRunner;
    use crate::{AppState, load_config};
    use std::sync::Arc;

    #[tokio::test]
    async fn reload_and_log_swallows_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"Address":"127.0.0.1","Port":9000,"Repositories":[{"Name":"demo","Commands":["a"]}]}"#,
        )
        .unwrap();
        let config = load_config(&path).await.unwrap();
        let state = Arc::new(AppState::new(config, path.clone(), Arc::new(ProcessRunner)));

        std::fs::remove_file(&path).unwrap();
        reload_and_log(&state).await;
        assert_eq!(state.current_config().repositories[0].name, "demo");

        std::fs::write(
            &path,
            r#"{"Address":"127.0.0.1","Port":9000,"Repositories":[{"Name":"next","Commands":["b"]}]}"#,
        )
        .unwrap();
        reload_and_log(&state).await;
        assert_eq!(state.current_config().repositories[0].name, "next");
    }
}
