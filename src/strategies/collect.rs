//! One-shot settlement shared between a strategy's handlers.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Delivers the first value sent; later sends are ignored.
pub(crate) struct Settle<T> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> Settle<T> {
    pub(crate) fn channel() -> (Arc<Self>, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Arc::new(Self {
                tx: Mutex::new(Some(tx)),
            }),
            rx,
        )
    }

    pub(crate) fn send(&self, value: T) {
        if let Some(tx) = self.tx.lock().take() {
            let _ = tx.send(value);
        }
    }
}
