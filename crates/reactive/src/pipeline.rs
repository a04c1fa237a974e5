//! Commit pipeline.
//!
//! Stores may commit on another thread. They hand their `RawChange`s to a
//! `CommitSender`; the thread owning the `ObserverCenter` drains them in
//! order with `process_pending()`.

use ripple_core::{Error, RawChange, Result};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

/// Sending half of the pipeline. Cheap to clone and `Send`.
#[derive(Clone, Debug)]
pub struct CommitSender {
    tx: Sender<RawChange>,
}

impl CommitSender {
    /// Queues a commit for processing.
    ///
    /// Fails with `Error::ChannelClosed` once the receiving center is gone.
    pub fn send(&self, change: RawChange) -> Result<()> {
        self.tx.send(change).map_err(|_| Error::ChannelClosed)
    }
}

/// Receiving half, owned by the center.
#[derive(Debug)]
pub(crate) struct CommitQueue {
    tx: Sender<RawChange>,
    rx: Receiver<RawChange>,
}

impl CommitQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub(crate) fn sender(&self) -> CommitSender {
        CommitSender { tx: self.tx.clone() }
    }

    /// Next queued commit, if any.
    pub(crate) fn try_next(&self) -> Option<RawChange> {
        match self.rx.try_recv() {
            Ok(change) => Some(change),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }
}
