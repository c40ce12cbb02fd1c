//! Cooperative cancellation for resize requests.
//!
//! A [`CancelToken`] is a shared flag. The caller holds one end, the worker
//! job holds a clone and polls it between stages. [`RequestSlot`] enforces
//! one outstanding request per logical output: starting a new request cancels
//! whatever the slot was holding.

use crate::imaging::BackendError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(BackendError::Cancelled)` once the flag is set.
    pub fn check(&self) -> Result<(), BackendError> {
        if self.is_cancelled() {
            Err(BackendError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Holds the token of the request currently writing to one output.
#[derive(Debug, Default)]
pub struct RequestSlot {
    current: Mutex<Option<CancelToken>>,
}

impl RequestSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the previous request (if any) and hand out a fresh token.
    pub fn begin(&self) -> CancelToken {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = current.take() {
            if !previous.is_cancelled() {
                tracing::debug!("cancelling superseded resize request");
            }
            previous.cancel();
        }
        let token = CancelToken::new();
        *current = Some(token.clone());
        token
    }

    /// Cancel the outstanding request without starting a new one.
    pub fn cancel(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = current.take() {
            token.cancel();
        }
    }
}
