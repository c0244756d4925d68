//! Game event types published to subscribers and kept in the event history.

use serde::{Deserialize, Serialize};

use crate::game::{FrameSnapshot, FrameState, GameKind};

/// Notable moments in a game's life, plus calibration changes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum GameEvent {
    Created {
        game_id: String,
        game_type: GameKind,
    },
    Started {
        game_id: String,
    },
    Ended {
        game_id: String,
        score: u64,
        level: u32,
        duration_secs: f64,
    },
    LevelUp {
        game_id: String,
        level: u32,
    },
    Burst {
        game_id: String,
        score: u64,
    },
    FullBonus {
        game_id: String,
        score: u64,
    },
    Calibrated {
        baseline_level: f64,
        games_updated: usize,
    },
}

impl GameEvent {
    /// Events implied by one processed frame (usually none)
    pub fn from_frame(frame: &FrameSnapshot) -> Vec<GameEvent> {
        let game_id = frame.game_id.to_string();
        let mut events = Vec::new();
        match &frame.state {
            FrameState::Boat(boat) => {
                if boat.leveled_up {
                    events.push(GameEvent::LevelUp {
                        game_id,
                        level: frame.level,
                    });
                }
            }
            FrameState::Balloon(balloon) => {
                if balloon.is_popped {
                    events.push(GameEvent::Burst {
                        game_id: game_id.clone(),
                        score: frame.score,
                    });
                }
                if balloon.full_bonus_awarded {
                    events.push(GameEvent::FullBonus {
                        game_id,
                        score: frame.score,
                    });
                }
            }
        }
        events
    }
}
