//! Game Sync Service
//!
//! In-process fan-out: one `tokio::sync::broadcast` channel per watched game,
//! with a per-game sequence counter.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use crate::sync::{
    BroadcastRequest, BroadcastResponse, GameUpdate, SyncBroadcaster, SyncError, UpdatePayload,
};

/// Default per-game channel capacity.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

struct GameChannel {
    tx: broadcast::Sender<GameUpdate>,
    sequence: u64,
}

impl GameChannel {
    fn publish(&mut self, mut update: GameUpdate) -> BroadcastResponse {
        if update.sequence == 0 {
            update.sequence = self.sequence + 1;
        }
        self.sequence = self.sequence.max(update.sequence);
        let sequence = update.sequence;
        // send only fails when nobody is listening
        let subscriber_count = self.tx.send(update).unwrap_or(0);
        BroadcastResponse {
            subscriber_count,
            sequence,
        }
    }
}

/// A viewer's live feed.
pub struct Subscription {
    /// Sequence of the last update sent before this subscription started.
    pub sequence: u64,
    /// First message for the viewer, carrying `sequence`.
    pub initial: GameUpdate,
    /// Update stream.
    pub receiver: broadcast::Receiver<GameUpdate>,
}

/// Per-game broadcaster.
pub struct GameSyncService {
    channels: RwLock<HashMap<String, GameChannel>>,
    capacity: usize,
}

impl GameSyncService {
    /// Create a service whose channels buffer `capacity` updates per viewer.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Start watching a game. Other viewers are told about the newcomer.
    pub async fn subscribe(&self, game_id: &str, viewer_id: &str) -> Subscription {
        let mut channels = self.channels.write().await;
        let channel = channels.entry(game_id.to_string()).or_insert_with(|| GameChannel {
            tx: broadcast::channel(self.capacity).0,
            sequence: 0,
        });

        let sequence = channel.sequence;
        let receiver = channel.tx.subscribe();
        channel.publish(GameUpdate::new(UpdatePayload::PlayerJoined {
            viewer_id: viewer_id.to_string(),
        }));
        info!("Viewer {} watching game {}", viewer_id, game_id);

        Subscription {
            sequence,
            initial: GameUpdate {
                sequence,
                payload: UpdatePayload::InitialState {
                    game_id: game_id.to_string(),
                },
            },
            receiver,
        }
    }

    /// Stop watching a game. Drop the subscription's receiver before calling.
    pub async fn unsubscribe(&self, game_id: &str, viewer_id: &str) {
        let mut channels = self.channels.write().await;
        let Some(channel) = channels.get_mut(game_id) else {
            return;
        };

        channel.publish(GameUpdate::new(UpdatePayload::PlayerLeft {
            viewer_id: viewer_id.to_string(),
        }));
        if channel.tx.receiver_count() == 0 {
            channels.remove(game_id);
            debug!("Closed sync channel for {}", game_id);
        }
        info!("Viewer {} left game {}", viewer_id, game_id);
    }

    /// Number of viewers of a game.
    pub async fn subscriber_count(&self, game_id: &str) -> usize {
        let channels = self.channels.read().await;
        channels.get(game_id).map(|c| c.tx.receiver_count()).unwrap_or(0)
    }
}

impl Default for GameSyncService {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl SyncBroadcaster for GameSyncService {
    async fn broadcast(&self, request: BroadcastRequest) -> Result<BroadcastResponse, SyncError> {
        let mut channels = self.channels.write().await;
        let Some(channel) = channels.get_mut(&request.game_id) else {
            debug!("No viewers for {}, update dropped", request.game_id);
            return Ok(BroadcastResponse {
                subscriber_count: 0,
                sequence: 0,
            });
        };

        let response = channel.publish(request.update);
        debug!(
            "Broadcast seq {} to {} viewers of {}",
            response.sequence, response.subscriber_count, request.game_id
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameMove, MoveType};

    fn moves_update(group_number: i64) -> GameUpdate {
        GameUpdate::new(UpdatePayload::MovesPublished {
            player: 1,
            moves: vec![GameMove::new(1, MoveType::EndTurn)],
            group_number,
        })
    }

    #[tokio::test]
    async fn test_subscribers_receive_sequenced_updates() {
        let sync = GameSyncService::default();
        let mut alice = sync.subscribe("g1", "alice").await;
        assert_eq!(alice.sequence, 0);
        assert_eq!(alice.initial.payload, UpdatePayload::InitialState { game_id: "g1".into() });

        let joined = alice.receiver.recv().await.unwrap();
        assert_eq!(joined.sequence, 1);

        let response = sync
            .broadcast(BroadcastRequest { game_id: "g1".into(), update: moves_update(3) })
            .await
            .unwrap();
        assert_eq!(response, BroadcastResponse { subscriber_count: 1, sequence: 2 });

        let update = alice.receiver.recv().await.unwrap();
        assert_eq!(update.sequence, 2);
        assert!(matches!(update.payload, UpdatePayload::MovesPublished { group_number: 3, .. }));
    }

    #[tokio::test]
    async fn test_join_and_leave_are_announced() {
        let sync = GameSyncService::default();
        let mut alice = sync.subscribe("g1", "alice").await;
        let bob = sync.subscribe("g1", "bob").await;
        assert_eq!(bob.sequence, 1);
        assert_eq!(sync.subscriber_count("g1").await, 2);

        drop(bob);
        sync.unsubscribe("g1", "bob").await;

        let mut seen = Vec::new();
        while let Ok(update) = alice.receiver.try_recv() {
            seen.push(update.payload);
        }
        assert_eq!(
            seen,
            vec![
                UpdatePayload::PlayerJoined { viewer_id: "alice".into() },
                UpdatePayload::PlayerJoined { viewer_id: "bob".into() },
                UpdatePayload::PlayerLeft { viewer_id: "bob".into() },
            ]
        );
    }

    #[tokio::test]
    async fn test_broadcast_without_viewers() {
        let sync = GameSyncService::default();
        let response = sync
            .broadcast(BroadcastRequest { game_id: "quiet".into(), update: moves_update(1) })
            .await
            .unwrap();
        assert_eq!(response.subscriber_count, 0);

        let alice = sync.subscribe("quiet", "alice").await;
        drop(alice);
        sync.unsubscribe("quiet", "alice").await;
        assert_eq!(sync.subscriber_count("quiet").await, 0);
    }
}
