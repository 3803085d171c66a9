//! Debounced draft persistence.
//!
//! Edits are recorded in history one by one, but writes are coalesced: the
//! latest document is written once no newer one has arrived for the quiet
//! period. Only the most recent pending document is ever written.
//!
//! ```text
//! schedule(d1) ─ schedule(d2) ─ schedule(d3) ── quiet ──▶ save_draft(d3)
//! ```

use crate::notice::{emit, Notice, Notices};
use crate::persistence::Persistence;
use sitecraft_model::Document;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct Autosave {
    pending: watch::Sender<Option<Document>>,
    handle: JoinHandle<()>,
}

impl Autosave {
    /// Spawn the writer task on the current tokio runtime
    pub fn spawn(persistence: Persistence, quiet_period: Duration, notices: Notices) -> Self {
        let (pending, rx) = watch::channel(None);
        let handle = tokio::spawn(write_loop(persistence, quiet_period, notices, rx));

        Self { pending, handle }
    }

    /// Queue `doc` for writing, superseding anything not yet written
    pub fn schedule(&self, doc: &Document) {
        self.pending.send_replace(Some(doc.clone()));
    }

    /// Write whatever is still pending and stop the writer
    pub async fn shutdown(self) {
        drop(self.pending);
        if let Err(err) = self.handle.await {
            warn!(error = %err, "Autosave task ended abnormally");
        }
    }
}

async fn write_loop(
    persistence: Persistence,
    quiet_period: Duration,
    notices: Notices,
    mut rx: watch::Receiver<Option<Document>>,
) {
    loop {
        if rx.changed().await.is_err() {
            break;
        }

        // Wait for a full quiet period without newer documents
        let mut closed = false;
        loop {
            match tokio::time::timeout(quiet_period, rx.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => {
                    closed = true;
                    break;
                }
                Err(_) => break,
            }
        }

        let doc = rx.borrow_and_update().clone();
        if let Some(doc) = doc {
            match persistence.save_draft(&doc).await {
                Ok(()) => debug!("Autosaved draft"),
                Err(err) => {
                    warn!(error = %err, "Autosave failed");
                    emit(&notices, Notice::error(format!("Could not save your changes: {err}")));
                }
            }
        }

        if closed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StorageError;
    use crate::notice::{notice_channel, NoticeLevel};
    use crate::persistence::{MemoryStorage, Storage, StorageKeys};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl Storage for CountingStorage {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.put(key, value).await
        }
    }

    struct FailingStorage;

    #[async_trait]
    impl Storage for FailingStorage {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Backend("quota exceeded".to_string()))
        }
    }

    fn doc(title: &str) -> Document {
        let mut doc = Document::new("acme");
        doc.meta.title = title.to_string();
        doc
    }

    #[tokio::test(start_paused = true)]
    async fn test_coalesces_bursts() {
        let storage = Arc::new(CountingStorage::default());
        let persistence = Persistence::new(storage.clone(), StorageKeys::new("sc:", "acme"));
        let (notices, _rx) = notice_channel(4);
        let autosave = Autosave::spawn(persistence.clone(), Duration::from_millis(800), notices);

        for n in 0..5 {
            autosave.schedule(&doc(&format!("v{n}")));
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert_eq!(storage.writes.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let saved = persistence.load_draft().await.unwrap().unwrap();
        assert_eq!(saved.meta.title, "v4");

        // draft + legacy
        assert_eq!(storage.writes.load(Ordering::SeqCst), 2);
        autosave.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending() {
        let storage = Arc::new(MemoryStorage::new());
        let persistence = Persistence::new(storage, StorageKeys::new("sc:", "acme"));
        let (notices, _rx) = notice_channel(4);
        let autosave = Autosave::spawn(persistence.clone(), Duration::from_millis(800), notices);

        autosave.schedule(&doc("last"));
        autosave.shutdown().await;

        let saved = persistence.load_draft().await.unwrap().unwrap();
        assert_eq!(saved.meta.title, "last");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_becomes_notice() {
        let persistence = Persistence::new(Arc::new(FailingStorage), StorageKeys::new("sc:", "acme"));
        let (notices, mut rx) = notice_channel(4);
        let autosave = Autosave::spawn(persistence, Duration::from_millis(50), notices);

        autosave.schedule(&doc("x"));
        let notice = rx.recv().await.unwrap();

        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.message.contains("quota exceeded"));
        autosave.shutdown().await;
    }
}
