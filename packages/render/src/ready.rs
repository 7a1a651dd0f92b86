//! One-shot readiness signal between the render layer and the core.

use tokio::sync::watch;

use crate::RenderError;

/// Sending half, owned by the render layer adapter.
#[derive(Debug)]
pub struct ReadySignal {
    tx: watch::Sender<bool>,
}

/// Receiving half; clone it freely.
#[derive(Debug, Clone)]
pub struct ReadyHandle {
    rx: watch::Receiver<bool>,
}

impl ReadySignal {
    /// Creates an unresolved signal and its handle.
    #[must_use]
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Self, ReadyHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, ReadyHandle { rx })
    }

    /// Resolves every waiting and future [`ReadyHandle::wait`]. Calling it
    /// again has no effect.
    pub fn mark_ready(&self) {
        if !self.tx.send_replace(true) {
            log::debug!("Render layer ready");
        }
    }
}

impl ReadyHandle {
    /// Whether the render layer has signalled readiness.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Waits until the render layer is ready.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::NeverReady`] if the [`ReadySignal`] was
    /// dropped without being marked ready.
    pub async fn wait(&self) -> Result<(), RenderError> {
        let mut rx = self.rx.clone();
        rx.wait_for(|ready| *ready)
            .await
            .map(|_| ())
            .map_err(|_| RenderError::NeverReady)
    }
}
