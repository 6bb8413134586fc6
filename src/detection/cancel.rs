//! Cooperative cancellation.
//!
//! The ESD loop polls a [`Cancellation`] once per iteration, before it
//! touches the working set, and returns the anomalies confirmed so far when
//! the poll reports cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Polled once per ESD iteration.
pub trait Cancellation {
    /// Return `true` to stop the detection early.
    fn is_canceled(&self) -> bool;
}

impl<F> Cancellation for F
where
    F: Fn() -> bool,
{
    fn is_canceled(&self) -> bool {
        self()
    }
}

/// A [`Cancellation`] that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancellation for NeverCancel {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shared flag that can be flipped from another thread or a timer.
///
/// # Example
/// ```
/// use anofox_anomaly::detection::{CancelToken, Cancellation};
///
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(!token.is_canceled());
/// handle.cancel();
/// assert!(token.is_canceled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

impl Cancellation for CancelToken {
    fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
