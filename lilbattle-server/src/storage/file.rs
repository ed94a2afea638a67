//! File-backed storage provider.
//!
//! Each game lives in its own directory:
//!
//! ```text
//! {base_dir}/{game_id}/metadata.json
//! {base_dir}/{game_id}/state.json
//! {base_dir}/{game_id}/moves.log      [u32 length][bincode GameMoveGroup]...
//! ```
//!
//! JSON records are replaced atomically through a temp file and rename. The move
//! log is append-only; it is only rewritten when orphan groups must be dropped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::model::{Game, GameMoveGroup, GameMoveHistory, GameState};
use crate::storage::{
    check_version, GameStateUpdater, GameStorageProvider, StorageError, StorageResult,
};

const METADATA_FILE: &str = "metadata.json";
const STATE_FILE: &str = "state.json";
const MOVES_FILE: &str = "moves.log";

/// Storage provider writing one directory per game.
pub struct FileStorage {
    base_dir: PathBuf,
    /// Serializes read-modify-write cycles on the log and state files.
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Open (creating if needed) a store rooted at `base_dir`.
    pub async fn new(base_dir: impl AsRef<Path>) -> StorageResult<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    fn game_dir(&self, id: &str) -> StorageResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(StorageError::Backend(format!("invalid game id: {:?}", id)));
        }
        Ok(self.base_dir.join(id))
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        id: &str,
        file: &str,
        kind: &'static str,
    ) -> StorageResult<T> {
        let path = self.game_dir(id)?.join(file);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound {
                    kind,
                    id: id.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn write_json<T: Serialize>(&self, id: &str, file: &str, value: &T) -> StorageResult<()> {
        let dir = self.game_dir(id)?;
        fs::create_dir_all(&dir).await?;
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        write_atomic(&dir.join(file), &bytes).await
    }

    async fn read_log(&self, id: &str) -> StorageResult<Vec<GameMoveGroup>> {
        let dir = self.game_dir(id)?;
        match fs::read(dir.join(MOVES_FILE)).await {
            Ok(bytes) => decode_frames(&bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if fs::try_exists(&dir).await? {
                    Ok(Vec::new())
                } else {
                    Err(StorageError::NotFound {
                        kind: "history",
                        id: id.to_string(),
                    })
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn rewrite_log(&self, id: &str, groups: &[GameMoveGroup]) -> StorageResult<()> {
        let dir = self.game_dir(id)?;
        fs::create_dir_all(&dir).await?;
        let mut bytes = Vec::new();
        for group in groups {
            bytes.extend(encode_frame(group)?);
        }
        write_atomic(&dir.join(MOVES_FILE), &bytes).await
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes).await?;
    fs::rename(&temp_path, path).await?;
    Ok(())
}

fn encode_frame(group: &GameMoveGroup) -> StorageResult<Vec<u8>> {
    let payload =
        bincode::serialize(group).map_err(|e| StorageError::Serialization(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| StorageError::Serialization("move group too large".into()))?;

    let mut frame = Vec::with_capacity(4 + payload.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

fn decode_frames(bytes: &[u8]) -> StorageResult<Vec<GameMoveGroup>> {
    let mut groups = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let header = bytes
            .get(offset..offset + 4)
            .ok_or_else(|| StorageError::Serialization(format!("truncated header at {}", offset)))?;
        let len = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let start = offset + 4;
        let payload = bytes
            .get(start..start + len)
            .ok_or_else(|| StorageError::Serialization(format!("truncated frame at {}", offset)))?;
        let group = bincode::deserialize(payload)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        groups.push(group);
        offset = start + len;
    }
    Ok(groups)
}

#[async_trait]
impl GameStorageProvider for FileStorage {
    async fn load_game(&self, id: &str) -> StorageResult<Game> {
        let mut game: Game = self.read_json(id, METADATA_FILE, "game").await?;
        if game.preview_urls.is_empty() {
            game.preview_urls = vec![format!("/screenshots/games/{}/default.png", id)];
        }
        Ok(game)
    }

    async fn load_game_state(&self, id: &str) -> StorageResult<GameState> {
        self.read_json(id, STATE_FILE, "state").await
    }

    async fn load_game_history(&self, id: &str) -> StorageResult<GameMoveHistory> {
        let groups = self.read_log(id).await?;
        Ok(GameMoveHistory {
            game_id: id.to_string(),
            groups,
        })
    }

    async fn save_game(&self, id: &str, game: &Game) -> StorageResult<()> {
        self.write_json(id, METADATA_FILE, game).await
    }

    async fn save_game_state(&self, id: &str, state: &GameState) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.write_json(id, STATE_FILE, state).await
    }

    async fn save_game_history(&self, id: &str, history: &GameMoveHistory) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        self.rewrite_log(id, &history.groups).await
    }

    async fn save_moves(
        &self,
        game_id: &str,
        group: &GameMoveGroup,
        current_group_number: i64,
    ) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let dir = self.game_dir(game_id)?;
        fs::create_dir_all(&dir).await?;

        let mut history = GameMoveHistory {
            game_id: game_id.to_string(),
            groups: match self.read_log(game_id).await {
                Ok(groups) => groups,
                Err(e) if e.is_not_found() => Vec::new(),
                Err(e) => return Err(e),
            },
        };

        let dropped = history.drop_orphans(current_group_number);
        if dropped > 0 {
            debug!("Rewriting move log for {} without {} orphan groups", game_id, dropped);
            history.groups.push(group.clone());
            return self.rewrite_log(game_id, &history.groups).await;
        }

        let frame = encode_frame(group)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(MOVES_FILE))
            .await?;
        file.write_all(&frame).await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn delete_from_storage(&self, id: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_dir_all(self.game_dir(id)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl GameStateUpdater for FileStorage {
    async fn get_game_state_version(&self, id: &str) -> StorageResult<i64> {
        Ok(self.load_game_state(id).await?.version)
    }

    async fn update_game_state_screenshot_index_info(
        &self,
        id: &str,
        expected_version: i64,
        last_indexed_at: DateTime<Utc>,
        needs_indexing: bool,
    ) -> StorageResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut state: GameState = self.read_json(id, STATE_FILE, "state").await?;
        check_version(id, expected_version, state.version)?;
        state.mark_indexed(last_indexed_at, needs_indexing);
        self.write_json(id, STATE_FILE, &state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameMove, MoveType, Position};

    fn group(n: i64) -> GameMoveGroup {
        let mut group = GameMoveGroup::new(
            n,
            vec![
                GameMove::new(1, MoveType::MoveUnit { from: Position::new(0, 0), to: Position::new(1, 0) }),
                GameMove::new(1, MoveType::EndTurn),
            ],
        );
        group.started_at = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .ok()
            .map(|t| t.with_timezone(&Utc));
        group.number_moves();
        group
    }

    #[tokio::test]
    async fn test_metadata_roundtrip_with_default_preview() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let game = Game { id: "g1".into(), name: "Isles".into(), ..Default::default() };
        store.save_game("g1", &game).await.unwrap();

        let loaded = store.load_game("g1").await.unwrap();
        assert_eq!(loaded.name, "Isles");
        assert_eq!(loaded.preview_urls, vec!["/screenshots/games/g1/default.png".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_game_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        assert!(store.load_game("ghost").await.unwrap_err().is_not_found());
        assert!(store.load_game_state("ghost").await.unwrap_err().is_not_found());
        assert!(store.load_game_history("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_move_log_appends_and_drops_orphans() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        store.save_game("g1", &Game::default()).await.unwrap();
        assert!(store.load_game_history("g1").await.unwrap().groups.is_empty());

        store.save_moves("g1", &group(1), 1).await.unwrap();
        store.save_moves("g1", &group(2), 2).await.unwrap();
        store.save_moves("g1", &group(3), 3).await.unwrap();
        // group 3's state write never landed; retry it
        store.save_moves("g1", &group(3), 3).await.unwrap();

        let history = store.load_game_history("g1").await.unwrap();
        let numbers: Vec<_> = history.groups.iter().map(|g| g.group_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(history.groups[0], group(1));
    }

    #[tokio::test]
    async fn test_index_info_update_keeps_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        let mut state = GameState::new("g1");
        state.version = 3;
        store.save_game_state("g1", &state).await.unwrap();

        assert!(store
            .update_game_state_screenshot_index_info("g1", 2, Utc::now(), false)
            .await
            .unwrap_err()
            .is_version_mismatch());
        store
            .update_game_state_screenshot_index_info("g1", 3, Utc::now(), true)
            .await
            .unwrap();
        assert_eq!(store.get_game_state_version("g1").await.unwrap(), 3);
        assert!(store.load_game_state("g1").await.unwrap().screenshot_index_info.needs_indexing);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        store.save_game("g1", &Game::default()).await.unwrap();
        store.delete_from_storage("g1").await.unwrap();
        store.delete_from_storage("g1").await.unwrap();
        assert!(store.load_game("g1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::new(dir.path()).await.unwrap();
        assert!(store.load_game("../etc").await.is_err());
    }
}
