//! Single-producer / single-consumer delivery with a terminal error.
//!
//! [`channel`] returns a [`Publisher`] (moved into the producing task) and a
//! [`Subscription`] (held by the consumer). Neither half can be cloned.
//!
//! Ordering: values queued before [`Publisher::fail`] are still delivered.
//! The terminal error becomes visible through [`Subscription::error`] only
//! after [`Subscription::receive`] has returned `None`, so no value is ever
//! observed after the error.

use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::FollowError;

/// Default number of values buffered between producer and consumer.
pub const DEFAULT_CAPACITY: usize = 1;

/// Returned by [`Publisher::send`] when the value can no longer be delivered.
#[derive(Debug, PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> std::fmt::Display for Closed<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("subscription closed")
    }
}

impl<T: std::fmt::Debug> std::error::Error for Closed<T> {}

/// Create an open subscription with [`DEFAULT_CAPACITY`].
pub fn channel<T, E>() -> (Publisher<T, E>, Subscription<T, E>) {
    channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create an open subscription buffering up to `capacity` values (minimum 1).
pub fn channel_with_capacity<T, E>(capacity: usize) -> (Publisher<T, E>, Subscription<T, E>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let terminal = Arc::new(OnceLock::new());
    (
        Publisher {
            tx: Some(tx),
            terminal: Arc::clone(&terminal),
        },
        Subscription {
            rx,
            terminal,
            drained: false,
        },
    )
}

// ─── Publisher ────────────────────────────────────────────────────────────────

/// Producer half. Dropping it closes the subscription without an error.
pub struct Publisher<T, E = FollowError> {
    tx: Option<mpsc::Sender<T>>,
    terminal: Arc<OnceLock<E>>,
}

impl<T, E> Publisher<T, E> {
    /// Deliver `value`, waiting while the buffer is full.
    ///
    /// Fails if the publisher was closed or the consumer dropped its half.
    pub async fn send(&self, value: T) -> Result<(), Closed<T>> {
        match &self.tx {
            Some(tx) => tx.send(value).await.map_err(|e| Closed(e.0)),
            None => Err(Closed(value)),
        }
    }

    /// Set the terminal error and close. Only the first error is kept.
    pub fn fail(&mut self, err: E)
    where
        E: std::fmt::Display,
    {
        if let Err(ignored) = self.terminal.set(err) {
            tracing::warn!(error = %ignored, "subscription already failed, ignoring error");
        }
        self.close();
    }

    /// Mark that no further values will arrive. Idempotent.
    pub fn close(&mut self) {
        self.tx.take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }
}

impl<T, E> std::fmt::Debug for Publisher<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("closed", &self.is_closed())
            .finish()
    }
}

// ─── Subscription ─────────────────────────────────────────────────────────────

/// Consumer half.
pub struct Subscription<T, E = FollowError> {
    rx: mpsc::Receiver<T>,
    terminal: Arc<OnceLock<E>>,
    drained: bool,
}

impl<T, E> Subscription<T, E> {
    /// Wait for the next value. `None` means closed and drained; check
    /// [`Subscription::error`] afterwards.
    pub async fn receive(&mut self) -> Option<T> {
        if self.drained {
            return None;
        }
        let next = self.rx.recv().await;
        if next.is_none() {
            self.drained = true;
        }
        next
    }

    /// The terminal error, once the subscription has been drained.
    pub fn error(&self) -> Option<&E> {
        if self.drained {
            self.terminal.get()
        } else {
            None
        }
    }

    /// Returns `true` once `receive` has returned `None`.
    pub fn is_drained(&self) -> bool {
        self.drained
    }
}

impl<T, E> Stream for Subscription<T, E> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.drained {
            return Poll::Ready(None);
        }
        match this.rx.poll_recv(cx) {
            Poll::Ready(None) => {
                this.drained = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl<T, E> std::fmt::Debug for Subscription<T, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("drained", &self.drained)
            .finish()
    }
}
