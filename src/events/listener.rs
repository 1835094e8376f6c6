use async_trait::async_trait;

use super::SessionEvent;

/// Handles session events.
///
/// Listeners are awaited in registration order on the task that changed
/// the session, so long-running work should be spawned.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    async fn handle(&self, event: &SessionEvent);
}
