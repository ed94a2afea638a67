//! Post-commit hook.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::model::GameMoveGroup;
use crate::sync::{BroadcastRequest, GameUpdate, SyncBroadcaster, SyncError, UpdatePayload};

/// Called after a move group has been committed.
///
/// Errors are reported to the caller, which logs them; the commit stands.
#[async_trait]
pub trait PostCommitHook: Send + Sync {
    /// A move group was durably committed.
    async fn on_moves_saved(&self, game_id: &str, group: &GameMoveGroup) -> Result<(), SyncError>;
}

/// Forwards committed moves to a [`SyncBroadcaster`] as `MovesPublished`.
pub struct SyncBroadcastHook {
    broadcaster: Arc<dyn SyncBroadcaster>,
}

impl SyncBroadcastHook {
    /// Create a hook over a broadcaster.
    pub fn new(broadcaster: Arc<dyn SyncBroadcaster>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl PostCommitHook for SyncBroadcastHook {
    async fn on_moves_saved(&self, game_id: &str, group: &GameMoveGroup) -> Result<(), SyncError> {
        let update = GameUpdate::new(UpdatePayload::MovesPublished {
            player: group.player().unwrap_or_default(),
            moves: group.moves.clone(),
            group_number: group.group_number,
        });
        let response = self
            .broadcaster
            .broadcast(BroadcastRequest {
                game_id: game_id.to_string(),
                update,
            })
            .await?;
        debug!(
            "Published group {} of {} to {} viewers",
            group.group_number, game_id, response.subscriber_count
        );
        Ok(())
    }
}
