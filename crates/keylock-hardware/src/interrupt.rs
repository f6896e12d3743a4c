//! Latched interrupt flag.
//!
//! [`InterruptFlag`] models a hardware interrupt-pending bit: the platform
//! raises it on a signal edge, the handler clears it when it is done. Raising
//! an already raised flag is a no-op, so edges that arrive while a request is
//! pending coalesce into that request instead of queueing.
//!
//! # Examples
//!
//! ```
//! use keylock_hardware::interrupt::InterruptFlag;
//!
//! let flag = InterruptFlag::new();
//! assert!(flag.raise());
//! assert!(!flag.raise()); // coalesced
//! assert!(flag.is_raised());
//!
//! flag.clear();
//! assert!(!flag.is_raised());
//! ```

use std::sync::Arc;

use tokio::sync::watch;

/// Single-bit, asynchronously settable, synchronously clearable flag.
///
/// Clones share the same bit.
#[derive(Debug, Clone)]
pub struct InterruptFlag {
    state: Arc<watch::Sender<bool>>,
}

impl InterruptFlag {
    /// Create a cleared flag.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self {
            state: Arc::new(state),
        }
    }

    /// Set the flag.
    ///
    /// Returns `true` if the flag was clear before this call.
    pub fn raise(&self) -> bool {
        self.state.send_if_modified(|pending| {
            if *pending {
                false
            } else {
                *pending = true;
                true
            }
        })
    }

    /// Clear the flag.
    pub fn clear(&self) {
        self.state
            .send_if_modified(|pending| std::mem::replace(pending, false));
    }

    /// Returns `true` while a request is pending.
    pub fn is_raised(&self) -> bool {
        *self.state.borrow()
    }

    /// Wait until the flag is raised. Returns immediately if it already is.
    pub async fn raised(&self) {
        self.wait_for(true).await;
    }

    /// Wait until the flag is clear. Returns immediately if it already is.
    pub async fn cleared(&self) {
        self.wait_for(false).await;
    }

    async fn wait_for(&self, level: bool) {
        let mut rx = self.state.subscribe();
        // The sender lives as long as `self`, so the channel cannot close here.
        let _ = rx.wait_for(|pending| *pending == level).await;
    }
}

impl Default for InterruptFlag {
    fn default() -> Self {
        Self::new()
    }
}
