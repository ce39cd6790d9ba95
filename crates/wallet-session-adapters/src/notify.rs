use std::sync::{Arc, Mutex};

use wallet_session_core::{Notification, NotifierPort, PortError};

/// Collects notification intents in memory and logs them. Whatever renders
/// toasts drains this; tests read it directly.
#[derive(Debug, Clone, Default)]
pub struct NotifierAdapter {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl NotifierAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Result<Vec<Notification>, PortError> {
        let mut g = self
            .sent
            .lock()
            .map_err(|e| PortError::Transport(format!("notifier lock poisoned: {e}")))?;
        Ok(std::mem::take(&mut *g))
    }

    pub fn sent(&self) -> Result<Vec<Notification>, PortError> {
        let g = self
            .sent
            .lock()
            .map_err(|e| PortError::Transport(format!("notifier lock poisoned: {e}")))?;
        Ok(g.clone())
    }
}

impl NotifierPort for NotifierAdapter {
    fn notify(&self, notification: Notification) -> Result<(), PortError> {
        tracing::info!(description = %notification.description, "notification");
        let mut g = self
            .sent
            .lock()
            .map_err(|e| PortError::Transport(format!("notifier lock poisoned: {e}")))?;
        g.push(notification);
        Ok(())
    }
}
