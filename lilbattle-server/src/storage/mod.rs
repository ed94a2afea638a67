//! Storage
//!
//! Durable persistence of the game triad (metadata, state, move history) and the
//! version oracle used by the screenshot indexing path.
//!
//! ## Module Structure
//!
//! - `memory`: In-process provider, used by tests and the demo binary
//! - `file`: One directory per game with JSON records and a binary move log

pub mod file;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{Game, GameMoveGroup, GameMoveHistory, GameState};

// Re-export key types
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Storage result alias.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors surfaced by storage providers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record of this kind for the id.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Record kind ("game", "state", "history").
        kind: &'static str,
        /// Game id.
        id: String,
    },

    /// Stored version moved past the expected one.
    #[error("version mismatch for {id}: expected {expected}, found {actual}")]
    VersionMismatch {
        /// Game id.
        id: String,
        /// Version the caller expected.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Record could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Any other backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Whether the error is a storage miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// Whether the error is an optimistic version conflict.
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, StorageError::VersionMismatch { .. })
    }
}

/// Durable store for games.
#[async_trait]
pub trait GameStorageProvider: Send + Sync {
    /// Load game metadata.
    async fn load_game(&self, id: &str) -> StorageResult<Game>;

    /// Load the state snapshot.
    async fn load_game_state(&self, id: &str) -> StorageResult<GameState>;

    /// Load the move history.
    async fn load_game_history(&self, id: &str) -> StorageResult<GameMoveHistory>;

    /// Replace game metadata.
    async fn save_game(&self, id: &str, game: &Game) -> StorageResult<()>;

    /// Replace the state snapshot.
    async fn save_game_state(&self, id: &str, state: &GameState) -> StorageResult<()>;

    /// Replace the whole move history.
    async fn save_game_history(&self, id: &str, history: &GameMoveHistory) -> StorageResult<()>;

    /// Durably append one move group.
    ///
    /// `current_group_number` is the group number the accompanying state will
    /// reflect. Groups at or above it are leftovers of an earlier commit that never
    /// reached its state write and are dropped before appending. Once this returns,
    /// `load_game_history` includes `group`.
    async fn save_moves(
        &self,
        game_id: &str,
        group: &GameMoveGroup,
        current_group_number: i64,
    ) -> StorageResult<()>;

    /// Remove every record of a game.
    async fn delete_from_storage(&self, id: &str) -> StorageResult<()>;
}

/// Authoritative version reads and version-checked index bookkeeping writes.
#[async_trait]
pub trait GameStateUpdater: Send + Sync {
    /// Current stored version.
    async fn get_game_state_version(&self, id: &str) -> StorageResult<i64>;

    /// Record a screenshot pass if the stored version still equals `expected_version`.
    ///
    /// Fails with [`StorageError::VersionMismatch`] otherwise. Never changes the version.
    async fn update_game_state_screenshot_index_info(
        &self,
        id: &str,
        expected_version: i64,
        last_indexed_at: DateTime<Utc>,
        needs_indexing: bool,
    ) -> StorageResult<()>;
}

/// Shared version check for the oracle implementations.
pub(crate) fn check_version(id: &str, expected: i64, actual: i64) -> StorageResult<()> {
    if expected != actual {
        return Err(StorageError::VersionMismatch {
            id: id.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let miss = StorageError::NotFound { kind: "game", id: "g1".into() };
        assert!(miss.is_not_found());
        assert_eq!(miss.to_string(), "game not found: g1");

        let conflict = check_version("g1", 5, 6).unwrap_err();
        assert!(conflict.is_version_mismatch());
        assert!(!conflict.is_not_found());
        assert!(check_version("g1", 6, 6).is_ok());
    }
}
