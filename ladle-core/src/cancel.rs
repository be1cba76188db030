use crate::{CancelSignature, Cancelled, DbError, Error, Result};
use futures::{Stream, StreamExt};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

type Callback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct TokenInner {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, Callback)>>,
}

/// Caller-owned cancellation signal.
///
/// Clones share the same state. Callbacks registered through
/// [`CancelToken::register`] run exactly once, either when `cancel` fires or
/// immediately at registration if the token is already cancelled; drivers
/// use them to request an abort of the in-flight operation.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenInner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation: marks the token and fires every registered
    /// callback. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        let callbacks = {
            let mut guard = self
                .inner
                .callbacks
                .lock()
                .expect("Cancel callback lock poisoned");
            std::mem::take(&mut *guard)
        };
        for (_, callback) in callbacks {
            callback();
        }
    }

    /// Attach a callback, returning the registration handle that owns it.
    /// Dropping or disposing the handle detaches the callback; a handle for
    /// an already-cancelled token is inert (the callback has already run).
    pub fn register(&self, callback: impl FnOnce() + Send + 'static) -> CancelGuard {
        if self.is_cancelled() {
            callback();
            return CancelGuard { token: None, id: 0 };
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut guard = self
            .inner
            .callbacks
            .lock()
            .expect("Cancel callback lock poisoned");
        // `cancel` may have drained the list while the lock was contended.
        if self.is_cancelled() {
            drop(guard);
            callback();
            return CancelGuard { token: None, id: 0 };
        }
        guard.push((id, Box::new(callback)));
        CancelGuard {
            token: Some(self.clone()),
            id,
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Registration handle produced by [`CancelToken::register`]. Detaching is
/// idempotent: `dispose` and `Drop` are both no-ops the second time around.
#[derive(Default)]
pub struct CancelGuard {
    token: Option<CancelToken>,
    id: u64,
}

impl CancelGuard {
    pub fn dispose(&mut self) {
        if let Some(token) = self.token.take() {
            let mut callbacks = token
                .inner
                .callbacks
                .lock()
                .expect("Cancel callback lock poisoned");
            callbacks.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Reclassify a provider error as the uniform [`Cancelled`] outcome.
///
/// The rewrite happens only when both hold: the error carries the driver's
/// abort signature, and the caller's token was cancelled at the time the
/// error is observed. Anything else is preserved untouched — the signature
/// alone is not proof of a requested abort.
pub fn reclassify(error: Error, token: &CancelToken, signature: &CancelSignature) -> Error {
    if token.is_cancelled()
        && error
            .downcast_ref::<DbError>()
            .is_some_and(|e| e.matches(signature))
    {
        return Error::new(Cancelled);
    }
    error
}

/// Wrap a result stream so every failing advance goes through
/// [`reclassify`]. Values pass through untouched: the cancellation heuristic
/// lives entirely in the error path of the advance step.
pub fn cancel_checked<T, S>(
    stream: S,
    token: CancelToken,
    signature: CancelSignature,
) -> impl Stream<Item = Result<T>> + Send
where
    S: Stream<Item = Result<T>> + Send,
    T: Send,
{
    stream.map(move |item| item.map_err(|e| reclassify(e, &token, &signature)))
}
