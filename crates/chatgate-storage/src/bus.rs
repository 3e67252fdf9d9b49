use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chatgate_provider_core::{AuditRecord, AuditSink};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::storage::AuditStore;

#[derive(Debug, Clone)]
pub struct AuditBusConfig {
    pub capacity: usize,
    pub drain_timeout: Duration,
}

impl Default for AuditBusConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            drain_timeout: Duration::from_secs(10),
        }
    }
}

/// Bounded queue in front of audit storage, drained by one writer task.
///
/// Writes never block the request path: a full queue drops the record.
/// Failed inserts are logged and not retried.
pub struct AuditBus {
    tx: mpsc::Sender<AuditRecord>,
    dropped: Arc<AtomicU64>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    drain_timeout: Duration,
}

impl AuditBus {
    pub fn spawn<S: AuditStore>(store: S, config: AuditBusConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.capacity.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(audit_writer(Arc::new(store), rx, shutdown_rx));
        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            shutdown_tx,
            handle,
            drain_timeout: config.drain_timeout,
        }
    }

    pub fn sink(&self) -> AuditBusSink {
        AuditBusSink {
            tx: self.tx.clone(),
            dropped: self.dropped.clone(),
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stops accepting records and waits, bounded by the drain timeout, for
    /// queued ones to be written. Returns `false` if the timeout expired.
    pub async fn shutdown(self) -> bool {
        let _ = self.shutdown_tx.send(());
        drop(self.tx);
        let mut handle = self.handle;
        match tokio::time::timeout(self.drain_timeout, &mut handle).await {
            Ok(_) => true,
            Err(_) => {
                warn!(
                    event = "audit_drain_timeout",
                    timeout_ms = self.drain_timeout.as_millis() as u64,
                    "audit queue not drained before timeout"
                );
                handle.abort();
                false
            }
        }
    }
}

async fn audit_writer<S: AuditStore>(
    store: Arc<S>,
    mut rx: mpsc::Receiver<AuditRecord>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            record = rx.recv() => match record {
                Some(record) => write_record(store.as_ref(), record).await,
                None => return,
            },
            _ = &mut shutdown_rx => break,
        }
    }
    // Senders may still be alive in detached tasks; closing lets recv drain
    // what is already queued and then end.
    rx.close();
    while let Some(record) = rx.recv().await {
        write_record(store.as_ref(), record).await;
    }
}

async fn write_record<S: AuditStore>(store: &S, record: AuditRecord) {
    let model = record.model.clone();
    match store.insert(record).await {
        Ok(()) => debug!(event = "audit_written", model = %model),
        Err(err) => warn!(event = "audit_write_failed", model = %model, error = %err),
    }
}

/// Request-path handle to the bus.
#[derive(Clone)]
pub struct AuditBusSink {
    tx: mpsc::Sender<AuditRecord>,
    dropped: Arc<AtomicU64>,
}

impl AuditSink for AuditBusSink {
    fn record(&self, record: AuditRecord) {
        match self.tx.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(record)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event = "audit_dropped", reason = "queue_full", model = %record.model);
            }
            Err(mpsc::error::TrySendError::Closed(record)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(event = "audit_dropped", reason = "closed", model = %record.model);
            }
        }
    }
}
