//! Screenshot Indexer Worker
//!
//! Items arrive on a bounded channel and are coalesced per record, keeping only
//! the newest version, until the flush period elapses. A flushed batch is
//! rendered theme by theme and handed to the completion handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::indexer::{IndexCompletion, IndexKind, Indexer, ScreenShotItem, ScreenshotRenderer};
use crate::model::WorldData;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// How long items are coalesced before a flush.
    pub flush_period: Duration,
    /// Channel capacity. Items sent while full are dropped.
    pub queue_capacity: usize,
    /// Themes rendered for every item, in order.
    pub themes: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            flush_period: Duration::from_secs(5),
            queue_capacity: 1024,
            themes: vec!["default".to_string()],
        }
    }
}

/// Handle to a running indexer worker.
///
/// Dropping every clone closes the channel; the worker flushes what it holds
/// and exits.
#[derive(Clone)]
pub struct ScreenshotIndexer {
    tx: mpsc::Sender<ScreenShotItem>,
}

impl ScreenshotIndexer {
    /// Start the worker task.
    pub fn spawn(
        config: IndexerConfig,
        renderer: Arc<dyn ScreenshotRenderer>,
        completion: Arc<dyn IndexCompletion>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let handle = tokio::spawn(async move {
            run_worker(rx, config, renderer, completion).await;
        });
        (Self { tx }, handle)
    }
}

impl Indexer for ScreenshotIndexer {
    fn send(&self, kind: IndexKind, id: &str, version: i64, world_data: WorldData) {
        let item = ScreenShotItem::new(kind, id, version, world_data);
        match self.tx.try_send(item) {
            Ok(()) => debug!("Queued {} {} at version {}", kind, id, version),
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Indexer queue full, dropping {} {} at version {}", kind, id, version)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("Indexer stopped, dropping {} {}", kind, id)
            }
        }
    }
}

type PendingKey = (IndexKind, String);

fn coalesce(pending: &mut HashMap<PendingKey, ScreenShotItem>, item: ScreenShotItem) {
    let key = (item.kind, item.id.clone());
    match pending.get(&key) {
        Some(existing) if existing.version > item.version => {}
        _ => {
            pending.insert(key, item);
        }
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<ScreenShotItem>,
    config: IndexerConfig,
    renderer: Arc<dyn ScreenshotRenderer>,
    completion: Arc<dyn IndexCompletion>,
) {
    let mut pending = HashMap::new();
    let mut ticker = interval(config.flush_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(item) => coalesce(&mut pending, item),
                None => {
                    flush(&mut pending, &config.themes, renderer.as_ref(), completion.as_ref()).await;
                    info!("Screenshot indexer stopped");
                    break;
                }
            },
            _ = ticker.tick() => {
                flush(&mut pending, &config.themes, renderer.as_ref(), completion.as_ref()).await;
            }
        }
    }
}

async fn flush(
    pending: &mut HashMap<PendingKey, ScreenShotItem>,
    themes: &[String],
    renderer: &dyn ScreenshotRenderer,
    completion: &dyn IndexCompletion,
) {
    if pending.is_empty() {
        return;
    }

    let mut batch: Vec<ScreenShotItem> = pending.drain().map(|(_, item)| item).collect();
    batch.sort_by(|a, b| a.id.cmp(&b.id));

    for item in batch.iter_mut() {
        for theme in themes {
            if let Err(e) = renderer.render(item, theme).await {
                warn!("Screenshot for {} {} failed: {}", item.kind, item.id, e);
                item.theme_errors.push(e.to_string());
                break;
            }
        }
    }

    info!("Indexer flushing batch of {} items", batch.len());
    completion.on_complete(batch).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{NoopRenderer, RenderError};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        batches: Mutex<Vec<Vec<ScreenShotItem>>>,
    }

    #[async_trait]
    impl IndexCompletion for Recorder {
        async fn on_complete(&self, items: Vec<ScreenShotItem>) {
            self.batches.lock().await.push(items);
        }
    }

    struct FailingTheme(&'static str);

    #[async_trait]
    impl ScreenshotRenderer for FailingTheme {
        async fn render(&self, item: &ScreenShotItem, theme: &str) -> Result<(), RenderError> {
            if theme == self.0 {
                return Err(RenderError::Failed {
                    id: item.id.clone(),
                    theme: theme.to_string(),
                    reason: "boom".into(),
                });
            }
            Ok(())
        }
    }

    fn slow_config(themes: &[&str]) -> IndexerConfig {
        IndexerConfig {
            flush_period: Duration::from_secs(3600),
            queue_capacity: 16,
            themes: themes.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[test]
    fn test_coalesce_keeps_highest_version() {
        let mut pending = HashMap::new();
        coalesce(&mut pending, ScreenShotItem::new(IndexKind::Games, "g1", 4, WorldData::default()));
        coalesce(&mut pending, ScreenShotItem::new(IndexKind::Games, "g1", 6, WorldData::default()));
        coalesce(&mut pending, ScreenShotItem::new(IndexKind::Games, "g1", 5, WorldData::default()));
        coalesce(&mut pending, ScreenShotItem::new(IndexKind::Worlds, "g1", 1, WorldData::default()));

        assert_eq!(pending.len(), 2);
        assert_eq!(pending[&(IndexKind::Games, "g1".to_string())].version, 6);
    }

    #[tokio::test]
    async fn test_close_flushes_pending_items() {
        let recorder = Arc::new(Recorder::default());
        let (indexer, handle) =
            ScreenshotIndexer::spawn(slow_config(&["default"]), Arc::new(NoopRenderer), recorder.clone());

        indexer.send(IndexKind::Games, "g1", 1, WorldData::default());
        indexer.send(IndexKind::Games, "g1", 2, WorldData::default());
        indexer.send(IndexKind::Games, "g2", 7, WorldData::default());
        drop(indexer);
        handle.await.unwrap();

        let batches = recorder.batches.lock().await;
        assert_eq!(batches.len(), 1);
        let versions: Vec<_> = batches[0].iter().map(|i| (i.id.as_str(), i.version)).collect();
        assert_eq!(versions, vec![("g1", 2), ("g2", 7)]);
        assert!(batches[0].iter().all(|i| !i.has_errors()));
    }

    #[tokio::test]
    async fn test_first_theme_failure_stops_item() {
        let recorder = Arc::new(Recorder::default());
        let (indexer, handle) = ScreenshotIndexer::spawn(
            slow_config(&["dark", "light"]),
            Arc::new(FailingTheme("dark")),
            recorder.clone(),
        );

        indexer.send(IndexKind::Games, "g1", 3, WorldData::default());
        drop(indexer);
        handle.await.unwrap();

        let batches = recorder.batches.lock().await;
        assert_eq!(batches[0][0].theme_errors.len(), 1);
        assert!(batches[0][0].theme_errors[0].contains("dark"));
    }
}
