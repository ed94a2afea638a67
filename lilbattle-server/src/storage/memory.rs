//! In-memory storage provider.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::model::{Game, GameMoveGroup, GameMoveHistory, GameState};
use crate::storage::{
    check_version, GameStateUpdater, GameStorageProvider, StorageError, StorageResult,
};

#[derive(Default)]
struct Records {
    games: HashMap<String, Game>,
    states: HashMap<String, GameState>,
    histories: HashMap<String, GameMoveHistory>,
}

/// Storage provider backed by process memory.
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<Records>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of games with metadata stored.
    pub async fn game_count(&self) -> usize {
        self.records.read().await.games.len()
    }
}

fn not_found(kind: &'static str, id: &str) -> StorageError {
    StorageError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[async_trait]
impl GameStorageProvider for MemoryStorage {
    async fn load_game(&self, id: &str) -> StorageResult<Game> {
        let records = self.records.read().await;
        records.games.get(id).cloned().ok_or_else(|| not_found("game", id))
    }

    async fn load_game_state(&self, id: &str) -> StorageResult<GameState> {
        let records = self.records.read().await;
        records.states.get(id).cloned().ok_or_else(|| not_found("state", id))
    }

    async fn load_game_history(&self, id: &str) -> StorageResult<GameMoveHistory> {
        let records = self.records.read().await;
        records
            .histories
            .get(id)
            .cloned()
            .ok_or_else(|| not_found("history", id))
    }

    async fn save_game(&self, id: &str, game: &Game) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.games.insert(id.to_string(), game.clone());
        Ok(())
    }

    async fn save_game_state(&self, id: &str, state: &GameState) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.states.insert(id.to_string(), state.clone());
        Ok(())
    }

    async fn save_game_history(&self, id: &str, history: &GameMoveHistory) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.histories.insert(id.to_string(), history.clone());
        Ok(())
    }

    async fn save_moves(
        &self,
        game_id: &str,
        group: &GameMoveGroup,
        current_group_number: i64,
    ) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let history = records
            .histories
            .entry(game_id.to_string())
            .or_insert_with(|| GameMoveHistory::new(game_id));

        let dropped = history.drop_orphans(current_group_number);
        if dropped > 0 {
            debug!("Dropped {} orphan move groups for {}", dropped, game_id);
        }
        history.groups.push(group.clone());
        Ok(())
    }

    async fn delete_from_storage(&self, id: &str) -> StorageResult<()> {
        let mut records = self.records.write().await;
        records.games.remove(id);
        records.states.remove(id);
        records.histories.remove(id);
        Ok(())
    }
}

#[async_trait]
impl GameStateUpdater for MemoryStorage {
    async fn get_game_state_version(&self, id: &str) -> StorageResult<i64> {
        let records = self.records.read().await;
        records
            .states
            .get(id)
            .map(|s| s.version)
            .ok_or_else(|| not_found("state", id))
    }

    async fn update_game_state_screenshot_index_info(
        &self,
        id: &str,
        expected_version: i64,
        last_indexed_at: DateTime<Utc>,
        needs_indexing: bool,
    ) -> StorageResult<()> {
        let mut records = self.records.write().await;
        let state = records.states.get_mut(id).ok_or_else(|| not_found("state", id))?;
        check_version(id, expected_version, state.version)?;
        state.mark_indexed(last_indexed_at, needs_indexing);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameMove, MoveType};

    fn group(n: i64) -> GameMoveGroup {
        GameMoveGroup::new(n, vec![GameMove::new(1, MoveType::EndTurn)])
    }

    #[tokio::test]
    async fn test_missing_records_are_not_found() {
        let store = MemoryStorage::new();
        assert!(store.load_game("nope").await.unwrap_err().is_not_found());
        assert!(store.load_game_state("nope").await.unwrap_err().is_not_found());
        assert!(store.get_game_state_version("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_save_moves_drops_orphans() {
        let store = MemoryStorage::new();
        store.save_moves("g1", &group(1), 1).await.unwrap();
        store.save_moves("g1", &group(2), 2).await.unwrap();
        // retry of group 2 after a failed state write
        store.save_moves("g1", &group(2), 2).await.unwrap();

        let history = store.load_game_history("g1").await.unwrap();
        let numbers: Vec<_> = history.groups.iter().map(|g| g.group_number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_index_info_update_is_version_checked() {
        let store = MemoryStorage::new();
        let mut state = GameState::new("g1");
        state.version = 6;
        state.screenshot_index_info.needs_indexing = true;
        store.save_game_state("g1", &state).await.unwrap();

        let err = store
            .update_game_state_screenshot_index_info("g1", 5, Utc::now(), false)
            .await
            .unwrap_err();
        assert!(err.is_version_mismatch());
        assert!(store.load_game_state("g1").await.unwrap().screenshot_index_info.needs_indexing);

        store
            .update_game_state_screenshot_index_info("g1", 6, Utc::now(), false)
            .await
            .unwrap();
        let stored = store.load_game_state("g1").await.unwrap();
        assert_eq!(stored.version, 6);
        assert!(!stored.screenshot_index_info.needs_indexing);
    }

    #[tokio::test]
    async fn test_delete_removes_triad() {
        let store = MemoryStorage::new();
        store.save_game("g1", &Game::default()).await.unwrap();
        store.save_game_state("g1", &GameState::new("g1")).await.unwrap();
        store.save_moves("g1", &group(1), 1).await.unwrap();

        store.delete_from_storage("g1").await.unwrap();
        assert_eq!(store.game_count().await, 0);
        assert!(store.load_game_history("g1").await.is_err());
    }
}
