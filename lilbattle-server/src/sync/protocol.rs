//! Sync Protocol Messages
//!
//! Updates are JSON objects tagged by `type`, with the per-game sequence
//! alongside the payload fields.

use serde::{Deserialize, Serialize};

use crate::model::GameMove;
use crate::sync::SyncError;

/// Update payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdatePayload {
    /// First message on a new subscription.
    InitialState {
        /// Game being watched.
        game_id: String,
    },

    /// A viewer joined.
    PlayerJoined {
        /// Viewer id.
        viewer_id: String,
    },

    /// A viewer left.
    PlayerLeft {
        /// Viewer id.
        viewer_id: String,
    },

    /// A move group was committed.
    MovesPublished {
        /// Player who made the moves.
        player: i32,
        /// Moves in the group.
        moves: Vec<GameMove>,
        /// Committed group number.
        group_number: i64,
    },
}

/// Sequenced update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameUpdate {
    /// Per-game sequence (0 = not yet assigned).
    #[serde(default)]
    pub sequence: u64,
    /// Payload.
    #[serde(flatten)]
    pub payload: UpdatePayload,
}

impl GameUpdate {
    /// Unsequenced update.
    pub fn new(payload: UpdatePayload) -> Self {
        Self { sequence: 0, payload }
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Encode(e.to_string()))
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        serde_json::from_str(json).map_err(|e| SyncError::Encode(e.to_string()))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MoveType;

    #[test]
    fn test_moves_published_json_shape() {
        let update = GameUpdate {
            sequence: 4,
            payload: UpdatePayload::MovesPublished {
                player: 2,
                moves: vec![GameMove::new(2, MoveType::EndTurn)],
                group_number: 9,
            },
        };
        let json = update.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], "moves_published");
        assert_eq!(value["sequence"], 4);
        assert_eq!(value["group_number"], 9);
        assert_eq!(GameUpdate::from_json(&json).unwrap(), update);
    }

    #[test]
    fn test_missing_sequence_defaults_to_zero() {
        let update = GameUpdate::from_json(r#"{"type":"player_left","viewer_id":"v1"}"#).unwrap();
        assert_eq!(update.sequence, 0);
        assert_eq!(update.payload, UpdatePayload::PlayerLeft { viewer_id: "v1".into() });
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(GameUpdate::from_json(r#"{"type":"teleport"}"#).is_err());
    }
}
