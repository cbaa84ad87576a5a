use std::sync::Arc;
use tokio::sync::mpsc;

use crate::metrics::LOG_WRITE_FAILURES;
use crate::store::LogStore;
use crate::traffic::TrafficAggregator;

// Capacity 1 is enough: a pending signal already covers later hits
pub const LOG_SIGNAL_CAPACITY: usize = 1;

pub fn log_channel() -> (mpsc::Sender<()>, mpsc::Receiver<()>) {
    mpsc::channel(LOG_SIGNAL_CAPACITY)
}

/// Background writer -> persists the visit log whenever it changes.
/// Each signal writes the latest snapshot, so a burst of hits costs one write.
pub async fn log_writer(
    mut rx: mpsc::Receiver<()>,
    store: LogStore,
    traffic: Arc<TrafficAggregator>,
) {
    tracing::info!(path = %store.path().display(), "log writer started");

    while rx.recv().await.is_some() {
        let events = traffic.events();
        if let Err(e) = store.write(&events).await {
            LOG_WRITE_FAILURES.inc();
            tracing::error!(error = %e, "failed to write visit log");
        }
    }

    tracing::info!("log writer stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn writer_persists_latest_log() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("ip_logs.json"));
        let traffic = Arc::new(TrafficAggregator::new(Vec::new(), 180));
        let (tx, rx) = log_channel();

        let writer = tokio::spawn(log_writer(rx, store.clone(), traffic.clone()));

        traffic.record_hit("a", Utc::now());
        traffic.record_hit("b", Utc::now());
        tx.send(()).await.unwrap();
        drop(tx);
        writer.await.unwrap();

        let saved = store.load().await;
        assert_eq!(saved, traffic.events());
    }

    #[tokio::test]
    async fn write_failure_does_not_stop_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::new(dir.path().join("missing").join("ip_logs.json"));
        let traffic = Arc::new(TrafficAggregator::new(Vec::new(), 180));
        let (tx, rx) = log_channel();

        let writer = tokio::spawn(log_writer(rx, store, traffic.clone()));
        traffic.record_hit("a", Utc::now());
        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        writer.await.unwrap();
        assert_eq!(traffic.events().len(), 1);
    }
}
