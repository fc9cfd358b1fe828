//! Push-driven download stream.
//!
//! A store produces a download by pushing chunks from its own task into a
//! bounded channel. The channel holds at most one chunk, so the producer is
//! paused whenever the consumer has not yet asked for the next one.

use std::future::Future;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::{StoreError, StoreResult};

/// Chunks buffered between producer and consumer.
const BUFFERED_CHUNKS: usize = 1;

/// Producer half of a download, held by the store.
pub struct DownloadFeed {
    tx: mpsc::Sender<StoreResult<Bytes>>,
}

impl DownloadFeed {
    /// Push the next chunk, waiting while the buffer is full.
    ///
    /// Returns `false` once the consumer has destroyed or dropped the stream;
    /// the producer should stop.
    pub async fn push(&self, chunk: Bytes) -> bool {
        self.tx.send(Ok(chunk)).await.is_ok()
    }

    /// Report a failure. The stream ends after the consumer receives it.
    pub async fn fail(self, err: StoreError) {
        let _ = self.tx.send(Err(err)).await;
    }

    /// Returns `true` once the consumer is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a download.
///
/// Yields chunks in the order the store pushed them, then `None` once the
/// producer finished. A failure is delivered as one `Err` item.
pub struct DownloadStream {
    rx: mpsc::Receiver<StoreResult<Bytes>>,
    producer: Option<AbortHandle>,
}

impl DownloadStream {
    /// Spawn `produce` on the runtime, feeding a new stream.
    pub fn spawn<F, Fut>(produce: F) -> Self
    where
        F: FnOnce(DownloadFeed) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(BUFFERED_CHUNKS);
        let task = tokio::spawn(produce(DownloadFeed { tx }));
        Self {
            rx,
            producer: Some(task.abort_handle()),
        }
    }

    /// A stream that yields `err` and ends, without a producer task.
    pub fn failed(err: StoreError) -> Self {
        let (tx, rx) = mpsc::channel(BUFFERED_CHUNKS);
        // Capacity is one and the channel is fresh, so this cannot fail.
        let _ = tx.try_send(Err(err));
        Self { rx, producer: None }
    }

    /// Wait for the next chunk.
    pub async fn next_chunk(&mut self) -> Option<StoreResult<Bytes>> {
        self.rx.recv().await
    }

    /// Tear the stream down: stop the producer and drop anything buffered.
    pub fn destroy(&mut self) {
        self.rx.close();
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
        while self.rx.try_recv().is_ok() {}
    }
}

impl Drop for DownloadStream {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl std::fmt::Debug for DownloadStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStream")
            .field("has_producer", &self.producer.is_some())
            .finish()
    }
}
