//! Version-gated indexing completion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};

use crate::indexer::{IndexCompletion, IndexKind, ScreenShotItem};
use crate::storage::GameStateUpdater;

/// Writes screenshot bookkeeping back to storage, unless the game changed since
/// the snapshot was taken.
pub struct VersionGatedCompletion {
    updater: Arc<dyn GameStateUpdater>,
}

impl VersionGatedCompletion {
    /// Create a handler over a version oracle.
    pub fn new(updater: Arc<dyn GameStateUpdater>) -> Self {
        Self { updater }
    }

    async fn complete_item(&self, item: &ScreenShotItem) {
        let current = match self.updater.get_game_state_version(&item.id).await {
            Ok(version) => version,
            Err(e) => {
                warn!("Could not read version for {}: {}", item.id, e);
                return;
            }
        };

        if current != item.version {
            info!(
                "Discarding stale screenshot for {} (snapshot v{}, stored v{})",
                item.id, item.version, current
            );
            return;
        }

        if let Err(e) = self
            .updater
            .update_game_state_screenshot_index_info(&item.id, item.version, Utc::now(), item.has_errors())
            .await
        {
            warn!("Screenshot index update for {} rejected: {}", item.id, e);
            return;
        }
        debug!("Recorded screenshot for {} at v{}", item.id, item.version);
    }
}

#[async_trait]
impl IndexCompletion for VersionGatedCompletion {
    async fn on_complete(&self, items: Vec<ScreenShotItem>) {
        for item in items.iter().filter(|i| i.kind == IndexKind::Games) {
            self.complete_item(item).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::DateTime;

    use crate::model::{GameState, WorldData};
    use crate::storage::{GameStorageProvider, MemoryStorage, StorageResult};

    /// Oracle that counts index writes.
    struct CountingOracle {
        inner: MemoryStorage,
        updates: AtomicUsize,
    }

    #[async_trait]
    impl GameStateUpdater for CountingOracle {
        async fn get_game_state_version(&self, id: &str) -> StorageResult<i64> {
            self.inner.get_game_state_version(id).await
        }

        async fn update_game_state_screenshot_index_info(
            &self,
            id: &str,
            expected_version: i64,
            last_indexed_at: DateTime<Utc>,
            needs_indexing: bool,
        ) -> StorageResult<()> {
            self.updates.fetch_add(1, Ordering::SeqCst);
            self.inner
                .update_game_state_screenshot_index_info(id, expected_version, last_indexed_at, needs_indexing)
                .await
        }
    }

    async fn oracle_at(version: i64) -> Arc<CountingOracle> {
        let inner = MemoryStorage::new();
        let mut state = GameState::new("g1");
        state.version = version;
        state.screenshot_index_info.needs_indexing = true;
        inner.save_game_state("g1", &state).await.unwrap();
        Arc::new(CountingOracle { inner, updates: AtomicUsize::new(0) })
    }

    #[tokio::test]
    async fn test_stale_item_never_updates() {
        let oracle = oracle_at(6).await;
        let completion = VersionGatedCompletion::new(oracle.clone());
        completion
            .on_complete(vec![ScreenShotItem::new(IndexKind::Games, "g1", 5, WorldData::default())])
            .await;

        assert_eq!(oracle.updates.load(Ordering::SeqCst), 0);
        let state = oracle.inner.load_game_state("g1").await.unwrap();
        assert!(state.screenshot_index_info.needs_indexing);
        assert!(state.screenshot_index_info.last_indexed_at.is_none());
    }

    #[tokio::test]
    async fn test_current_item_clears_flag() {
        let oracle = oracle_at(6).await;
        let completion = VersionGatedCompletion::new(oracle.clone());
        completion
            .on_complete(vec![ScreenShotItem::new(IndexKind::Games, "g1", 6, WorldData::default())])
            .await;

        let state = oracle.inner.load_game_state("g1").await.unwrap();
        assert_eq!(oracle.updates.load(Ordering::SeqCst), 1);
        assert_eq!(state.version, 6);
        assert!(!state.screenshot_index_info.needs_indexing);
    }

    #[tokio::test]
    async fn test_theme_errors_keep_flag_set() {
        let oracle = oracle_at(2).await;
        let completion = VersionGatedCompletion::new(oracle.clone());
        let mut item = ScreenShotItem::new(IndexKind::Games, "g1", 2, WorldData::default());
        item.theme_errors.push("dark: boom".into());
        completion.on_complete(vec![item]).await;

        let state = oracle.inner.load_game_state("g1").await.unwrap();
        assert!(state.screenshot_index_info.needs_indexing);
        assert!(state.screenshot_index_info.last_indexed_at.is_some());
    }

    #[tokio::test]
    async fn test_other_kinds_ignored() {
        let oracle = oracle_at(1).await;
        let completion = VersionGatedCompletion::new(oracle.clone());
        completion
            .on_complete(vec![ScreenShotItem::new(IndexKind::Worlds, "g1", 1, WorldData::default())])
            .await;
        assert_eq!(oracle.updates.load(Ordering::SeqCst), 0);
    }
}
