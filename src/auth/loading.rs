//! Debounced loading flag.
//!
//! The web client debounced its `isLoading` store by 300 ms so that
//! auth resolutions faster than the debounce never flash a spinner. The
//! flag here only flips to `true` if the operation is still pending when
//! the debounce elapses; `finish` always clears it immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::config::LOADING_DEBOUNCE;

/// A watchable boolean that turns on only after a debounce period.
#[derive(Clone)]
pub struct LoadingFlag {
    tx: Arc<watch::Sender<bool>>,
    /// Generation counter; a begin/finish pair invalidates older timers.
    generation: Arc<AtomicU64>,
    debounce: Duration,
}

impl LoadingFlag {
    /// Create a flag with the default 300 ms debounce.
    pub fn new() -> Self {
        Self::with_debounce(LOADING_DEBOUNCE)
    }

    /// Create a flag with a custom debounce.
    pub fn with_debounce(debounce: Duration) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            generation: Arc::new(AtomicU64::new(0)),
            debounce,
        }
    }

    /// Mark an operation as started.
    ///
    /// The flag flips to `true` after the debounce unless
    /// [`finish`](Self::finish) runs first.
    pub fn begin(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let tx = Arc::clone(&self.tx);
        let gen_slot = Arc::clone(&self.generation);
        let debounce = self.debounce;

        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if gen_slot.load(Ordering::SeqCst) == generation {
                tx.send_replace(true);
            }
        });
    }

    /// Mark the operation as finished, clearing the flag immediately.
    pub fn finish(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.tx.send_replace(false);
    }

    /// Current flag state.
    pub fn is_loading(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to flag changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for LoadingFlag {
    fn default() -> Self {
        Self::new()
    }
}
