use async_trait::async_trait;

use crate::events::{Listener, SessionEvent};

/// Emits session events as `tracing` events under the
/// `taskboard_session::events` target.
pub struct TracingListener;

#[async_trait]
impl Listener for TracingListener {
    async fn handle(&self, event: &SessionEvent) {
        match event {
            SessionEvent::LoginFailed { .. } | SessionEvent::SessionDiscarded { .. } => {
                tracing::warn!(
                    target: "taskboard_session::events",
                    event_name = event.name(),
                    ?event,
                    "session event"
                );
            }
            _ => {
                tracing::info!(
                    target: "taskboard_session::events",
                    event_name = event.name(),
                    ?event,
                    "session event"
                );
            }
        }
    }
}
