//! Move History
//!
//! Append-only log of move groups. A group is committed once and never edited;
//! group numbers increase strictly within a game.
//!
//! These types are written to the binary move log, so they avoid serde attributes
//! that a non-self-describing format cannot honour (internal tagging, skipped fields).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Axial map position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Axial Q coordinate.
    pub q: i32,
    /// Axial R coordinate.
    pub r: i32,
}

impl Position {
    /// Create a position.
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }
}

/// What a move does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveType {
    /// Move a unit.
    MoveUnit {
        /// Origin.
        from: Position,
        /// Destination.
        to: Position,
    },
    /// Attack another unit.
    AttackUnit {
        /// Attacking unit position.
        attacker: Position,
        /// Defending unit position.
        defender: Position,
    },
    /// Build a unit on an owned base.
    BuildUnit {
        /// Base position.
        pos: Position,
        /// Unit type to build.
        unit_type: i32,
    },
    /// Start capturing a building.
    CaptureBuilding {
        /// Building position.
        pos: Position,
    },
    /// End the current player's turn.
    EndTurn,
}

/// A single player move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMove {
    /// Player who made the move.
    pub player: i32,
    /// Group this move was committed in.
    pub group_number: i64,
    /// Position inside the group.
    pub move_number: i64,
    /// When the move was submitted.
    pub timestamp: Option<DateTime<Utc>>,
    /// Move payload.
    pub move_type: MoveType,
}

impl GameMove {
    /// Unnumbered move for a player.
    pub fn new(player: i32, move_type: MoveType) -> Self {
        Self {
            player,
            group_number: 0,
            move_number: 0,
            timestamp: None,
            move_type,
        }
    }
}

/// A batch of moves committed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMoveGroup {
    /// Strictly increasing per game.
    pub group_number: i64,
    /// When processing started.
    pub started_at: Option<DateTime<Utc>>,
    /// When processing finished.
    pub ended_at: Option<DateTime<Utc>>,
    /// Moves in submission order.
    pub moves: Vec<GameMove>,
}

impl GameMoveGroup {
    /// Group with the given number and moves.
    pub fn new(group_number: i64, moves: Vec<GameMove>) -> Self {
        Self {
            group_number,
            started_at: None,
            ended_at: None,
            moves,
        }
    }

    /// Stamp every move with this group's number and its index.
    pub fn number_moves(&mut self) {
        for (i, mv) in self.moves.iter_mut().enumerate() {
            mv.group_number = self.group_number;
            mv.move_number = i as i64;
        }
    }

    /// Player who submitted the group (all moves in a group share one player).
    pub fn player(&self) -> Option<i32> {
        self.moves.first().map(|m| m.player)
    }
}

/// Ordered move groups of one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMoveHistory {
    /// Owning game.
    pub game_id: String,
    /// Groups in commit order.
    pub groups: Vec<GameMoveGroup>,
}

impl GameMoveHistory {
    /// Empty history for a game.
    pub fn new(game_id: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            groups: Vec::new(),
        }
    }

    /// Highest committed group number.
    pub fn last_group_number(&self) -> Option<i64> {
        self.groups.last().map(|g| g.group_number)
    }

    /// Drop groups numbered at or above `current_group_number`.
    ///
    /// Such groups were written by a commit whose state write never landed.
    /// Returns how many groups were dropped.
    pub fn drop_orphans(&mut self, current_group_number: i64) -> usize {
        let before = self.groups.len();
        self.groups.retain(|g| g.group_number < current_group_number);
        before - self.groups.len()
    }

    /// Groups within an inclusive range and whether older groups exist before it.
    ///
    /// A bound of zero or less is open. `has_more` compares the oldest retained
    /// group against the lower bound.
    pub fn range(&self, from_group: i64, to_group: i64) -> (Vec<GameMoveGroup>, bool) {
        let mut groups = Vec::new();
        for group in &self.groups {
            if from_group > 0 && group.group_number < from_group {
                continue;
            }
            if to_group > 0 && group.group_number > to_group {
                break;
            }
            groups.push(group.clone());
        }

        let has_more = from_group > 0
            && self
                .groups
                .first()
                .map(|g| g.group_number < from_group)
                .unwrap_or(false);

        (groups, has_more)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn history_with(numbers: &[i64]) -> GameMoveHistory {
        let mut history = GameMoveHistory::new("g1");
        for n in numbers {
            history
                .groups
                .push(GameMoveGroup::new(*n, vec![GameMove::new(1, MoveType::EndTurn)]));
        }
        history
    }

    #[test]
    fn test_number_moves() {
        let mut group = GameMoveGroup::new(
            7,
            vec![
                GameMove::new(2, MoveType::CaptureBuilding { pos: Position::new(0, 1) }),
                GameMove::new(2, MoveType::EndTurn),
            ],
        );
        group.number_moves();

        assert_eq!(group.moves[0].group_number, 7);
        assert_eq!(group.moves[1].move_number, 1);
        assert_eq!(group.player(), Some(2));
    }

    #[test]
    fn test_drop_orphans() {
        let mut history = history_with(&[1, 2, 3, 4]);
        assert_eq!(history.drop_orphans(3), 2);
        assert_eq!(history.last_group_number(), Some(2));
    }

    #[test]
    fn test_range_open_bounds() {
        let history = history_with(&[1, 2, 3]);
        let (groups, has_more) = history.range(0, 0);
        assert_eq!(groups.len(), 3);
        assert!(!has_more);
    }

    #[test]
    fn test_range_reports_older_groups() {
        let history = history_with(&[1, 2, 3, 4, 5]);
        let (groups, has_more) = history.range(3, 4);
        let numbers: Vec<_> = groups.iter().map(|g| g.group_number).collect();
        assert_eq!(numbers, vec![3, 4]);
        assert!(has_more);
    }

    #[test]
    fn test_range_empty_history() {
        let history = GameMoveHistory::new("g1");
        let (groups, has_more) = history.range(2, 0);
        assert!(groups.is_empty());
        assert!(!has_more);
    }

    proptest! {
        #[test]
        fn prop_range_stays_within_bounds(len in 0usize..30, from in 0i64..35, to in 0i64..35) {
            let numbers: Vec<i64> = (1..=len as i64).collect();
            let history = history_with(&numbers);
            let (groups, has_more) = history.range(from, to);

            for g in &groups {
                prop_assert!(from <= 0 || g.group_number >= from);
                prop_assert!(to <= 0 || g.group_number <= to);
            }
            prop_assert_eq!(has_more, from > 1 && len > 0);
        }
    }
}
