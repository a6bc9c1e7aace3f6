use crate::presence::PresenceEvent;
use crate::state::AppState;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Spawn a background task that deletes a session document once its host has
/// no live connection left. Fire-and-forget: failures are logged, never
/// retried.
pub fn spawn_cleanup_watcher(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut events = state.presence.subscribe();
        loop {
            match events.recv().await {
                Ok(PresenceEvent::HostGone { code }) => {
                    match state.remove_session(&code).await {
                        Ok(()) => {
                            tracing::info!("Deleted game {} after host disconnect", code)
                        }
                        Err(e) => tracing::error!("Failed to delete game {}: {}", code, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Cleanup watcher lagged, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn host_disconnect_deletes_the_session() {
        let state = Arc::new(AppState::new());
        let session = state.create_session("Ana").await.unwrap();
        spawn_cleanup_watcher(state.clone());

        state.presence.set_presence(&session.code, "uid-1").await;
        state.presence.remove_presence(&session.code, "uid-1").await;

        // Give the watcher a moment to observe the event
        for _ in 0..50 {
            if state.get_session(&session.code).await.is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("session was not cleaned up");
    }
}
