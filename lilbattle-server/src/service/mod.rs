//! Games Service
//!
//! The read/write surface over games. Two implementations share one trait:
//!
//! - [`BackendGamesService`]: storage-backed, cache-aside, many concurrent callers
//! - [`SingletonGamesService`]: one game held in process, single writer
//!
//! ## Module Structure
//!
//! - `cache`: Cache of the game triad plus derived runtime games
//! - `create`: Creation validation and player initialization
//! - `backend`: Storage-backed implementation and the move commit protocol
//! - `singleton`: Embedded single-game implementation

pub mod backend;
pub mod cache;
pub mod create;
pub mod singleton;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Game, GameMoveGroup, GameMoveHistory, GamePatch, GameState};
use crate::rules::RuntimeGame;
use crate::storage::StorageError;

// Re-export key types
pub use backend::BackendGamesService;
pub use cache::GameCache;
pub use create::{initialize_player_states, validate_create_game_request, ValidationError};
pub use singleton::SingletonGamesService;

/// Service result alias.
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Errors returned by the games service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Request is missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Game creation checks failed.
    #[error("invalid game: {0}")]
    Validation(#[from] ValidationError),

    /// A game with this id already exists.
    #[error("game already exists: {0}")]
    AlreadyExists(String),

    /// No storage provider was wired in.
    #[error("storage provider not configured")]
    StorageNotConfigured,

    /// A storage call failed.
    #[error("{op} failed for {id}: {source}")]
    Storage {
        /// Storage operation.
        op: &'static str,
        /// Game id.
        id: String,
        /// Underlying failure.
        #[source]
        source: StorageError,
    },

    /// Nothing loaded for this id.
    #[error("game not found: {0}")]
    NotFound(String),

    /// The implementation does not offer this operation.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl ServiceError {
    /// Whether the failure is a missing game.
    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Storage { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub(crate) fn storage(op: &'static str, id: &str) -> impl FnOnce(StorageError) -> ServiceError {
        let id = id.to_string();
        move |source| ServiceError::Storage { op, id, source }
    }
}

/// Everything known about a game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    /// Metadata.
    pub game: Game,
    /// State snapshot.
    pub state: GameState,
    /// Move history.
    pub history: GameMoveHistory,
}

/// UpdateGame request. Each present part is written; absent parts are untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateGameRequest {
    /// Target game.
    pub game_id: String,
    /// Metadata fields to change.
    pub new_game: Option<GamePatch>,
    /// Replacement state.
    pub new_state: Option<GameState>,
    /// Replacement history.
    pub new_history: Option<GameMoveHistory>,
}

/// UpdateGame response.
#[derive(Debug, Clone, Default)]
pub struct UpdateGameResponse {
    /// Metadata after the write, when metadata was part of the request.
    pub game: Option<Game>,
}

/// ListMoves request. A bound of zero is open.
#[derive(Debug, Clone, Default)]
pub struct ListMovesRequest {
    /// Target game.
    pub game_id: String,
    /// Lowest group number, inclusive.
    pub from_group: i64,
    /// Highest group number, inclusive.
    pub to_group: i64,
}

/// ListMoves response.
#[derive(Debug, Clone, Default)]
pub struct ListMovesResponse {
    /// Groups in range, oldest first.
    pub move_groups: Vec<GameMoveGroup>,
    /// Older groups exist before `from_group`.
    pub has_more: bool,
}

/// Read/write surface over games.
///
/// Writes take `&mut self` so [`SingletonGamesService`] can own its game
/// without locking. [`BackendGamesService`] is cheap to clone and its clones
/// share storage, cache, indexer and hook, so concurrent handlers each work on
/// their own clone.
#[async_trait]
pub trait GamesService: Send + Sync {
    /// Metadata, state and history of a game.
    async fn get_game(&self, id: &str) -> ServiceResult<GameSnapshot>;

    /// Write any of metadata, state and history.
    async fn update_game(&mut self, request: UpdateGameRequest) -> ServiceResult<UpdateGameResponse>;

    /// Remove a game.
    async fn delete_game(&mut self, id: &str) -> ServiceResult<()>;

    /// Commit a move group together with the state it produced.
    async fn save_move_group(
        &mut self,
        game_id: &str,
        state: GameState,
        group: GameMoveGroup,
    ) -> ServiceResult<()>;

    /// Move groups within a range.
    async fn list_moves(&self, request: ListMovesRequest) -> ServiceResult<ListMovesResponse>;

    /// Runtime game for the current state.
    async fn get_runtime_game(&mut self, game_id: &str) -> ServiceResult<Arc<RuntimeGame>>;
}

pub(crate) fn require_id(id: &str) -> ServiceResult<()> {
    if id.is_empty() {
        return Err(ServiceError::InvalidArgument("game id is required".into()));
    }
    Ok(())
}
