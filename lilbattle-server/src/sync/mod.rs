//! Live Sync
//!
//! Fan-out of committed moves to viewers of a game. Delivery is best effort:
//! the commit path logs broadcast failures and carries on.
//!
//! ## Module Structure
//!
//! - `protocol`: Update messages sent to viewers
//! - `service`: In-process per-game broadcaster
//! - `hook`: Post-commit hook that feeds the broadcaster

pub mod hook;
pub mod protocol;
pub mod service;

use async_trait::async_trait;
use thiserror::Error;

// Re-export key types
pub use hook::{PostCommitHook, SyncBroadcastHook};
pub use protocol::{GameUpdate, UpdatePayload};
pub use service::{GameSyncService, Subscription};

/// Broadcast failures.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Update could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// The broadcaster cannot accept updates.
    #[error("broadcaster unavailable: {0}")]
    Unavailable(String),
}

/// Request to fan an update out to a game's viewers.
#[derive(Debug, Clone)]
pub struct BroadcastRequest {
    /// Target game.
    pub game_id: String,
    /// Update to deliver. A zero sequence is assigned by the broadcaster.
    pub update: GameUpdate,
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastResponse {
    /// Viewers the update was handed to.
    pub subscriber_count: usize,
    /// Sequence the update went out with (0 when nobody was listening).
    pub sequence: u64,
}

/// Delivers updates to live viewers.
#[async_trait]
pub trait SyncBroadcaster: Send + Sync {
    /// Fan an update out.
    async fn broadcast(&self, request: BroadcastRequest) -> Result<BroadcastResponse, SyncError>;
}
