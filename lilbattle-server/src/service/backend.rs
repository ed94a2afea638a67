//! Storage-Backed Games Service
//!
//! Cache-aside reads, version-bumped state writes and the move commit protocol.
//!
//! ## Move commit order
//!
//! ```text
//! load game + current state ──► migrate ──► top up units ──► version = old + 1
//!        │
//!        ▼
//! save_moves(group)            durable, replayable if we stop here
//!        │
//!        ▼
//! save_game_state(state)       commit point
//!        │
//!        ▼
//! cache update ──► indexer.send ──► post-commit hook (logged, never rolled back)
//! ```
//!
//! Concurrent writers to the same game are not serialized here: each reads the
//! stored version and writes `old + 1`, so the later write wins.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::indexer::{IndexKind, Indexer};
use crate::model::{Game, GameMoveGroup, GameMoveHistory, GameState};
use crate::rules::{migrate_world_data, RuntimeGame, UnitRules};
use crate::service::cache::GameCache;
use crate::service::create::{initialize_player_states, validate_create_game_request};
use crate::service::{
    require_id, GameSnapshot, GamesService, ListMovesRequest, ListMovesResponse, ServiceError,
    ServiceResult, UpdateGameRequest, UpdateGameResponse,
};
use crate::storage::GameStorageProvider;
use crate::sync::PostCommitHook;

/// Games service over a storage provider.
///
/// Clones share storage, cache, indexer and hook.
#[derive(Clone)]
pub struct BackendGamesService {
    storage: Option<Arc<dyn GameStorageProvider>>,
    cache: Arc<GameCache>,
    indexer: Option<Arc<dyn Indexer>>,
    post_commit: Option<Arc<dyn PostCommitHook>>,
    rules: Arc<UnitRules>,
}

impl BackendGamesService {
    /// Create a service with no collaborators wired in.
    pub fn new(cache_enabled: bool) -> Self {
        Self {
            storage: None,
            cache: Arc::new(GameCache::new(cache_enabled)),
            indexer: None,
            post_commit: None,
            rules: Arc::new(UnitRules::default()),
        }
    }

    /// Use a storage provider.
    pub fn with_storage(mut self, storage: Arc<dyn GameStorageProvider>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Queue screenshots of committed states.
    pub fn with_indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer = Some(indexer);
        self
    }

    /// Notify a hook after each committed move group.
    pub fn with_post_commit_hook(mut self, hook: Arc<dyn PostCommitHook>) -> Self {
        self.post_commit = Some(hook);
        self
    }

    /// Replace the unit rules used for top-up and runtime games.
    pub fn with_unit_rules(mut self, rules: Arc<UnitRules>) -> Self {
        self.rules = rules;
        self
    }

    /// The shared cache.
    pub fn cache(&self) -> &GameCache {
        &self.cache
    }

    fn storage(&self) -> ServiceResult<Arc<dyn GameStorageProvider>> {
        self.storage.clone().ok_or(ServiceError::StorageNotConfigured)
    }

    fn enqueue_screenshot(&self, game_id: &str, state: &GameState) {
        if let Some(indexer) = &self.indexer {
            indexer.send(IndexKind::Games, game_id, state.version, state.world_data.clone());
        }
    }

    /// Shared pre-commit pass for every state write.
    async fn prepare_state(
        &self,
        storage: &Arc<dyn GameStorageProvider>,
        game_id: &str,
        mut state: GameState,
    ) -> ServiceResult<GameState> {
        let game = storage
            .load_game(game_id)
            .await
            .map_err(ServiceError::storage("load_game", game_id))?;
        let current = storage
            .load_game_state(game_id)
            .await
            .map_err(ServiceError::storage("load_game_state", game_id))?;

        migrate_world_data(&mut state.world_data);

        let runtime = RuntimeGame::new(&game, &state, self.rules.clone());
        for e in runtime.top_up_units(&mut state.world_data) {
            warn!("Skipping unit top-up in {}: {}", game_id, e);
        }

        state.game_id = game_id.to_string();
        state.mark_committed(current.version, Utc::now());
        Ok(state)
    }

    /// Create a game from metadata and an initial state.
    ///
    /// An empty id gets a fresh UUID. The stored state starts at version 1 with
    /// no move groups and every configured player initialized.
    #[instrument(skip(self, game, state), fields(game_id = %game.id))]
    pub async fn create_game(&self, mut game: Game, mut state: GameState) -> ServiceResult<GameSnapshot> {
        let storage = self.storage()?;

        migrate_world_data(&mut state.world_data);
        validate_create_game_request(&game, Some(&state.world_data))?;

        if game.id.is_empty() {
            game.id = Uuid::new_v4().to_string();
        } else {
            match storage.load_game(&game.id).await {
                Ok(_) => return Err(ServiceError::AlreadyExists(game.id)),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(ServiceError::storage("load_game", &game.id)(e)),
            }
        }
        let id = game.id.clone();

        let now = Utc::now();
        game.created_at = Some(now);
        game.updated_at = Some(now);

        state.game_id = id.clone();
        if state.current_player == 0 {
            state.current_player = 1;
        }
        if state.turn_counter == 0 {
            state.turn_counter = 1;
        }
        initialize_player_states(&mut state, &game.config);
        state.current_group_number = 0;
        state.mark_committed(0, now);

        let history = GameMoveHistory::new(&id);

        storage
            .save_game(&id, &game)
            .await
            .map_err(ServiceError::storage("save_game", &id))?;
        storage
            .save_game_state(&id, &state)
            .await
            .map_err(ServiceError::storage("save_game_state", &id))?;
        storage
            .save_game_history(&id, &history)
            .await
            .map_err(ServiceError::storage("save_game_history", &id))?;

        self.cache.put(&id, Some(&game), Some(&state), Some(&history)).await;
        self.enqueue_screenshot(&id, &state);
        info!("Created game {} with {} players", id, game.config.players.len());

        Ok(GameSnapshot { game, state, history })
    }
}

#[async_trait]
impl GamesService for BackendGamesService {
    #[instrument(skip(self))]
    async fn get_game(&self, id: &str) -> ServiceResult<GameSnapshot> {
        require_id(id)?;

        if let Some(snapshot) = self.cache.get(id).await {
            debug!("Cache hit for {}", id);
            return Ok(snapshot);
        }
        debug!("Cache miss for {}", id);

        let storage = self.storage()?;
        let game = storage
            .load_game(id)
            .await
            .map_err(ServiceError::storage("load_game", id))?;
        let mut state = storage
            .load_game_state(id)
            .await
            .map_err(ServiceError::storage("load_game_state", id))?;
        let history = storage
            .load_game_history(id)
            .await
            .map_err(ServiceError::storage("load_game_history", id))?;

        migrate_world_data(&mut state.world_data);
        if !self.cache.populate(id, &game, &state, &history).await && self.cache.is_enabled() {
            debug!("Newer state of {} cached during load, not caching v{}", id, state.version);
        }

        Ok(GameSnapshot { game, state, history })
    }

    #[instrument(skip(self, request), fields(game_id = %request.game_id))]
    async fn update_game(&mut self, request: UpdateGameRequest) -> ServiceResult<UpdateGameResponse> {
        let UpdateGameRequest {
            game_id,
            new_game,
            new_state,
            new_history,
        } = request;
        require_id(&game_id)?;
        let storage = self.storage()?;
        let id = game_id.as_str();
        let mut response = UpdateGameResponse::default();

        if let Some(patch) = new_game {
            let mut game = storage
                .load_game(id)
                .await
                .map_err(ServiceError::storage("load_game", id))?;
            patch.apply_to(&mut game);
            game.updated_at = Some(Utc::now());
            storage
                .save_game(id, &game)
                .await
                .map_err(ServiceError::storage("save_game", id))?;
            self.cache.put(id, Some(&game), None, None).await;
            response.game = Some(game);
        }

        if let Some(state) = new_state {
            let state = self.prepare_state(&storage, id, state).await?;
            storage
                .save_game_state(id, &state)
                .await
                .map_err(ServiceError::storage("save_game_state", id))?;
            info!("Game {} state written at version {}", id, state.version);
            self.cache.put(id, None, Some(&state), None).await;
            self.enqueue_screenshot(id, &state);
        }

        if let Some(history) = new_history {
            storage
                .save_game_history(id, &history)
                .await
                .map_err(ServiceError::storage("save_game_history", id))?;
            self.cache.put(id, None, None, Some(&history)).await;
        }

        Ok(response)
    }

    #[instrument(skip(self))]
    async fn delete_game(&mut self, id: &str) -> ServiceResult<()> {
        require_id(id)?;
        let storage = self.storage()?;
        storage
            .delete_from_storage(id)
            .await
            .map_err(ServiceError::storage("delete_from_storage", id))?;
        self.cache.invalidate(id).await;
        info!("Deleted game {}", id);
        Ok(())
    }

    #[instrument(skip(self, state, group), fields(group_number = group.group_number))]
    async fn save_move_group(
        &mut self,
        game_id: &str,
        state: GameState,
        mut group: GameMoveGroup,
    ) -> ServiceResult<()> {
        require_id(game_id)?;
        let storage = self.storage()?;
        let state = self.prepare_state(&storage, game_id, state).await?;
        group.number_moves();

        storage
            .save_moves(game_id, &group, state.current_group_number)
            .await
            .map_err(ServiceError::storage("save_moves", game_id))?;
        storage
            .save_game_state(game_id, &state)
            .await
            .map_err(ServiceError::storage("save_game_state", game_id))?;
        info!(
            "Committed group {} for {} at version {}",
            group.group_number, game_id, state.version
        );

        let history = match storage.load_game_history(game_id).await {
            Ok(history) => Some(history),
            Err(e) => {
                warn!("Could not reload history for {}: {}", game_id, e);
                self.cache.invalidate_history(game_id).await;
                None
            }
        };
        self.cache.put(game_id, None, Some(&state), history.as_ref()).await;
        self.enqueue_screenshot(game_id, &state);

        if let Some(hook) = &self.post_commit {
            if let Err(e) = hook.on_moves_saved(game_id, &group).await {
                warn!("Failed to broadcast moves for {}: {}", game_id, e);
            }
        }

        Ok(())
    }

    #[instrument(skip(self, request), fields(game_id = %request.game_id))]
    async fn list_moves(&self, request: ListMovesRequest) -> ServiceResult<ListMovesResponse> {
        let snapshot = self.get_game(&request.game_id).await?;
        let (move_groups, has_more) = snapshot.history.range(request.from_group, request.to_group);
        Ok(ListMovesResponse {
            move_groups,
            has_more,
        })
    }

    async fn get_runtime_game(&mut self, game_id: &str) -> ServiceResult<Arc<RuntimeGame>> {
        let snapshot = self.get_game(game_id).await?;
        if let Some(runtime) = self.cache.get_runtime(game_id, snapshot.state.version).await {
            return Ok(runtime);
        }

        let runtime = Arc::new(RuntimeGame::new(&snapshot.game, &snapshot.state, self.rules.clone()));
        self.cache.put_runtime(game_id, runtime.clone()).await;
        Ok(runtime)
    }
}

// =============================================================================
// TESTS
// =============================================================================
