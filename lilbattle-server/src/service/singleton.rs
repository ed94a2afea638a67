//! In-process games service holding exactly one game.
//!
//! Used by embedded and offline clients. There is no storage, no cache and no
//! locking: the single owner mutates the held triad directly. Whatever id a
//! caller passes, the held game answers.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::model::{Game, GameMoveGroup, GameMoveHistory, GameState, WorldData};
use crate::rules::{migrate_world_data, RuntimeGame, UnitRules};
use crate::service::{
    GameSnapshot, GamesService, ListMovesRequest, ListMovesResponse, ServiceError, ServiceResult,
    UpdateGameRequest, UpdateGameResponse,
};

/// Single-game service.
#[derive(Default)]
pub struct SingletonGamesService {
    game: Option<Game>,
    state: Option<GameState>,
    history: Option<GameMoveHistory>,
    runtime_game: Option<Arc<RuntimeGame>>,
    rules: Arc<UnitRules>,
}

impl SingletonGamesService {
    /// Empty service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held triad from JSON documents.
    pub fn load(&mut self, game_json: &[u8], state_json: &[u8], history_json: &[u8]) -> ServiceResult<()> {
        let game: Game = serde_json::from_slice(game_json)
            .map_err(|e| ServiceError::InvalidArgument(format!("game json: {}", e)))?;
        let state: GameState = serde_json::from_slice(state_json)
            .map_err(|e| ServiceError::InvalidArgument(format!("state json: {}", e)))?;
        let history: GameMoveHistory = serde_json::from_slice(history_json)
            .map_err(|e| ServiceError::InvalidArgument(format!("history json: {}", e)))?;

        self.save_game(game, state, history);
        Ok(())
    }

    /// Replace the held triad.
    pub fn save_game(&mut self, game: Game, mut state: GameState, history: GameMoveHistory) {
        migrate_world_data(&mut state.world_data);
        debug!("Holding game {} at version {}", game.id, state.version);
        self.game = Some(game);
        self.state = Some(state);
        self.history = Some(history);
        self.runtime_game = None;
    }

    /// World of the held state.
    pub fn world_data(&self) -> Option<&WorldData> {
        self.state.as_ref().map(|s| &s.world_data)
    }

    fn snapshot(&self) -> ServiceResult<GameSnapshot> {
        let game = self
            .game
            .clone()
            .ok_or_else(|| ServiceError::NotFound("no game loaded".into()))?;
        Ok(GameSnapshot {
            state: self.state.clone().unwrap_or_else(|| GameState::new(&game.id)),
            history: self.history.clone().unwrap_or_else(|| GameMoveHistory::new(&game.id)),
            game,
        })
    }
}

#[async_trait]
impl GamesService for SingletonGamesService {
    async fn get_game(&self, _id: &str) -> ServiceResult<GameSnapshot> {
        self.snapshot()
    }

    /// Replaces each supplied part wholesale. The runtime game is kept.
    async fn update_game(&mut self, request: UpdateGameRequest) -> ServiceResult<UpdateGameResponse> {
        let mut response = UpdateGameResponse::default();

        if let Some(patch) = request.new_game {
            let id = self
                .game
                .as_ref()
                .map(|g| g.id.clone())
                .unwrap_or(request.game_id);
            let game = patch.into_game(id);
            response.game = Some(game.clone());
            self.game = Some(game);
        }
        if let Some(state) = request.new_state {
            self.state = Some(state);
        }
        if let Some(history) = request.new_history {
            self.history = Some(history);
        }

        Ok(response)
    }

    async fn delete_game(&mut self, _id: &str) -> ServiceResult<()> {
        Err(ServiceError::Unsupported("delete_game on a single-game service"))
    }

    async fn save_move_group(
        &mut self,
        _game_id: &str,
        _state: GameState,
        _group: GameMoveGroup,
    ) -> ServiceResult<()> {
        Ok(())
    }

    async fn list_moves(&self, request: ListMovesRequest) -> ServiceResult<ListMovesResponse> {
        let Some(history) = &self.history else {
            return Ok(ListMovesResponse::default());
        };
        let (move_groups, has_more) = history.range(request.from_group, request.to_group);
        Ok(ListMovesResponse {
            move_groups,
            has_more,
        })
    }

    async fn get_runtime_game(&mut self, _game_id: &str) -> ServiceResult<Arc<RuntimeGame>> {
        if let Some(runtime) = &self.runtime_game {
            return Ok(runtime.clone());
        }
        let snapshot = self.snapshot()?;
        let runtime = Arc::new(RuntimeGame::new(&snapshot.game, &snapshot.state, self.rules.clone()));
        self.runtime_game = Some(runtime.clone());
        Ok(runtime)
    }
}
