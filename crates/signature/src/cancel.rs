//! crates/signature/src/cancel.rs
//!
//! Shared stop signal carrying the first failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SignatureError;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    cause: Mutex<Option<SignatureError>>,
}

/// Cloneable handle to one pipeline's stop signal.
///
/// Any stage may cancel; only the first cause is kept. Stages poll
/// [`is_cancelled`](Self::is_cancelled) between units of work.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Creates an untriggered token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triggers the token, recording `cause` if no cause was recorded yet.
    ///
    /// Returns `true` when this call supplied the recorded cause.
    pub fn cancel(&self, cause: SignatureError) -> bool {
        let mut slot = self
            .inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let first = slot.is_none();
        if first {
            *slot = Some(cause);
        }
        self.inner.cancelled.store(true, Ordering::Release);
        first
    }

    /// Reports whether the token has been triggered.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Removes and returns the recorded cause.
    #[must_use]
    pub fn take_cause(&self) -> Option<SignatureError> {
        self.inner
            .cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}
