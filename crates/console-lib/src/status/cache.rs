//! Process-wide status cache with atomic snapshot replacement

use super::Probe;
use crate::models::{ServiceName, StatusSnapshot};
use crate::observability::{ConsoleMetrics, StructuredLogger};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Last known status of every managed service
///
/// Readers clone the current `Arc<StatusSnapshot>`; a refresh builds a
/// complete snapshot first and then swaps the pointer, so a reader sees
/// one probing pass in full or the previous one in full.
pub struct StatusCache {
    prober: Arc<dyn Probe>,
    current: RwLock<Arc<StatusSnapshot>>,
    /// Single-writer guard; also owns the generation counter
    writer: Mutex<u64>,
    metrics: ConsoleMetrics,
    logger: StructuredLogger,
}

impl StatusCache {
    pub fn new(prober: Arc<dyn Probe>, logger: StructuredLogger) -> Self {
        Self {
            prober,
            current: RwLock::new(Arc::new(StatusSnapshot::unknown())),
            writer: Mutex::new(0),
            metrics: ConsoleMetrics::new(),
            logger,
        }
    }

    /// Last committed snapshot, without probing
    pub async fn current(&self) -> StatusSnapshot {
        let snapshot = self.current.read().await.clone();
        (*snapshot).clone()
    }

    /// Probe every service and replace the cached snapshot
    pub async fn refresh(&self) -> StatusSnapshot {
        let mut generation = self.writer.lock().await;

        let (frontend, backend, datastore) = tokio::join!(
            self.prober.probe(ServiceName::Frontend),
            self.prober.probe(ServiceName::Backend),
            self.prober.probe(ServiceName::Datastore),
        );

        *generation += 1;
        let snapshot = StatusSnapshot::captured(
            *generation,
            [
                (ServiceName::Frontend, frontend),
                (ServiceName::Backend, backend),
                (ServiceName::Datastore, datastore),
            ],
        );

        *self.current.write().await = Arc::new(snapshot.clone());

        self.metrics.record_snapshot(&snapshot);
        self.logger.log_refresh(&snapshot);
        snapshot
    }
}
