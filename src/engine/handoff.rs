// src/engine/handoff.rs

//! Rendezvous handoff between the debouncer and a dispatch loop.
//!
//! A value only changes hands when the consumer is actually ready for it:
//! the [`Taker`] sends a one-shot request, and the [`Giver`] answers it. No
//! value is ever parked in a channel, so anything not yet handed over stays
//! in the giver's own bookkeeping (the debouncer's backlog).

use tokio::sync::{mpsc, oneshot};

/// Create a connected giver/taker pair.
pub fn channel<T>() -> (Giver<T>, Taker<T>) {
    let (tx, rx) = mpsc::channel(1);
    (Giver { requests: rx }, Taker { requests: tx })
}

/// Consumer side.
#[derive(Debug)]
pub struct Taker<T> {
    requests: mpsc::Sender<oneshot::Sender<T>>,
}

impl<T> Taker<T> {
    /// Wait for the next value. Returns `None` once the giver is gone.
    pub async fn take(&self) -> Option<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests.send(reply_tx).await.ok()?;
        reply_rx.await.ok()
    }
}

/// Producer side.
#[derive(Debug)]
pub struct Giver<T> {
    requests: mpsc::Receiver<oneshot::Sender<T>>,
}

impl<T> Giver<T> {
    /// Wait until the taker asks for a value. Cancel safe.
    ///
    /// Returns `None` once the taker is gone.
    pub async fn request(&mut self) -> Option<Request<T>> {
        self.requests.recv().await.map(Request)
    }

    /// Hand `value` to the next taker request, skipping abandoned ones.
    pub async fn give(&mut self, mut value: T) -> Result<(), T> {
        loop {
            let Some(request) = self.request().await else {
                return Err(value);
            };
            match request.fulfil(value) {
                Ok(()) => return Ok(()),
                Err(returned) => value = returned,
            }
        }
    }
}

/// A pending request from the taker.
#[derive(Debug)]
pub struct Request<T>(oneshot::Sender<T>);

impl<T> Request<T> {
    /// Answer the request. Gives the value back if the taker stopped
    /// waiting in the meantime.
    pub fn fulfil(self, value: T) -> Result<(), T> {
        self.0.send(value)
    }
}
