//! Game Cache
//!
//! In-memory mirror of the game triad plus derived runtime games, behind one
//! reader/writer lock. Entries are never authoritative. Callers must not do
//! storage I/O while holding the lock, so every method takes and releases it
//! within the call.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::model::{Game, GameMoveHistory, GameState};
use crate::rules::RuntimeGame;
use crate::service::GameSnapshot;

#[derive(Default)]
struct CacheMaps {
    games: HashMap<String, Game>,
    states: HashMap<String, GameState>,
    histories: HashMap<String, GameMoveHistory>,
    runtimes: HashMap<String, Arc<RuntimeGame>>,
}

/// Cache of games, states, histories and runtime games.
pub struct GameCache {
    enabled: bool,
    maps: RwLock<CacheMaps>,
}

impl GameCache {
    /// Create a cache. A disabled cache stores nothing and always misses.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            maps: RwLock::new(CacheMaps::default()),
        }
    }

    /// Whether caching is on.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The full triad, if all three parts are cached.
    pub async fn get(&self, id: &str) -> Option<GameSnapshot> {
        if !self.enabled {
            return None;
        }
        let maps = self.maps.read().await;
        Some(GameSnapshot {
            game: maps.games.get(id)?.clone(),
            state: maps.states.get(id)?.clone(),
            history: maps.histories.get(id)?.clone(),
        })
    }

    /// Cached history alone.
    pub async fn get_history(&self, id: &str) -> Option<GameMoveHistory> {
        if !self.enabled {
            return None;
        }
        self.maps.read().await.histories.get(id).cloned()
    }

    /// Store the given parts. Storing a state drops the cached runtime game.
    pub async fn put(
        &self,
        id: &str,
        game: Option<&Game>,
        state: Option<&GameState>,
        history: Option<&GameMoveHistory>,
    ) {
        if !self.enabled {
            return;
        }
        let mut maps = self.maps.write().await;
        if let Some(game) = game {
            maps.games.insert(id.to_string(), game.clone());
        }
        if let Some(history) = history {
            maps.histories.insert(id.to_string(), history.clone());
        }
        if let Some(state) = state {
            maps.states.insert(id.to_string(), state.clone());
            maps.runtimes.remove(id);
        }
    }

    /// Store a triad loaded by a read.
    ///
    /// Nothing is stored when a newer state is already cached: a commit landed
    /// while the read was loading. Returns whether the triad was stored.
    pub async fn populate(
        &self,
        id: &str,
        game: &Game,
        state: &GameState,
        history: &GameMoveHistory,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        let mut maps = self.maps.write().await;
        if maps.states.get(id).is_some_and(|cached| cached.version > state.version) {
            return false;
        }
        maps.games.insert(id.to_string(), game.clone());
        maps.states.insert(id.to_string(), state.clone());
        maps.histories.insert(id.to_string(), history.clone());
        maps.runtimes.remove(id);
        true
    }

    /// Drop the cached history alone.
    pub async fn invalidate_history(&self, id: &str) {
        if !self.enabled {
            return;
        }
        self.maps.write().await.histories.remove(id);
    }

    /// Cached runtime game, if it was built from `version`.
    pub async fn get_runtime(&self, id: &str, version: i64) -> Option<Arc<RuntimeGame>> {
        if !self.enabled {
            return None;
        }
        let maps = self.maps.read().await;
        maps.runtimes.get(id).filter(|rt| rt.version == version).cloned()
    }

    /// Store a runtime game.
    pub async fn put_runtime(&self, id: &str, runtime: Arc<RuntimeGame>) {
        if !self.enabled {
            return;
        }
        self.maps.write().await.runtimes.insert(id.to_string(), runtime);
    }

    /// Drop every entry for a game.
    pub async fn invalidate(&self, id: &str) {
        if !self.enabled {
            return;
        }
        let mut maps = self.maps.write().await;
        maps.games.remove(id);
        maps.states.remove(id);
        maps.histories.remove(id);
        maps.runtimes.remove(id);
    }
}
