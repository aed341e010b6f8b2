//! Server-originated event names.
//!
//! The bridge only listens for a closed set of event names. Anything else
//! the server emits is dropped; the outbound direction is not restricted.
//!
//! | Event | Meaning |
//! |-------|---------|
//! | `joined_room` | Room joined, board dimensions and player names |
//! | `updata_board` | Board update (sic, the server's spelling) |
//! | `new_board` | Fresh board |
//! | `game_result` | Game over |
//! | `get_ready_rec` .. `search_rec` | Replies to player actions |
//! | `match_init_rec`, `match_start_check_rec` | Match setup replies |
//! | `error`, `connect_error` | Transport errors |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// ServerEvent
// ============================================================================

/// An event name the bridge subscribes to and forwards to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerEvent {
    /// `joined_room`
    JoinedRoom,
    /// `updata_board`
    UpdataBoard,
    /// `new_board`
    NewBoard,
    /// `game_result`
    GameResult,
    /// `get_ready_rec`
    GetReadyRec,
    /// `move_rec`
    MoveRec,
    /// `put_rec`
    PutRec,
    /// `look_rec`
    LookRec,
    /// `search_rec`
    SearchRec,
    /// `match_init_rec`
    MatchInitRec,
    /// `match_start_check_rec`
    MatchStartCheckRec,
    /// `error`
    Error,
    /// `connect_error`
    ConnectError,
}

impl ServerEvent {
    /// Every forwarded event, in subscription order.
    pub const ALL: [Self; 13] = [
        Self::JoinedRoom,
        Self::UpdataBoard,
        Self::NewBoard,
        Self::GameResult,
        Self::GetReadyRec,
        Self::MoveRec,
        Self::PutRec,
        Self::LookRec,
        Self::SearchRec,
        Self::MatchInitRec,
        Self::MatchStartCheckRec,
        Self::Error,
        Self::ConnectError,
    ];

    /// Returns the wire name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::JoinedRoom => "joined_room",
            Self::UpdataBoard => "updata_board",
            Self::NewBoard => "new_board",
            Self::GameResult => "game_result",
            Self::GetReadyRec => "get_ready_rec",
            Self::MoveRec => "move_rec",
            Self::PutRec => "put_rec",
            Self::LookRec => "look_rec",
            Self::SearchRec => "search_rec",
            Self::MatchInitRec => "match_init_rec",
            Self::MatchStartCheckRec => "match_start_check_rec",
            Self::Error => "error",
            Self::ConnectError => "connect_error",
        }
    }

    /// The full set, `connect_error` included.
    #[must_use]
    pub fn standard() -> Vec<Self> {
        Self::ALL.to_vec()
    }

    /// The reduced set without `connect_error`.
    #[must_use]
    pub fn reduced() -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|event| *event != Self::ConnectError)
            .collect()
    }
}

impl fmt::Display for ServerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServerEvent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| Error::config(format!("unknown server event: {s}")))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_unique() {
        let mut names: Vec<_> = ServerEvent::ALL.iter().map(|e| e.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ServerEvent::ALL.len());
    }

    #[test]
    fn test_from_str_round_trips_all() {
        for event in ServerEvent::ALL {
            assert_eq!(event.as_str().parse::<ServerEvent>().ok(), Some(event));
        }
    }

    #[test]
    fn test_from_str_rejects_client_events() {
        assert!("move".parse::<ServerEvent>().is_err());
        assert!("update_board".parse::<ServerEvent>().is_err());
    }

    #[test]
    fn test_reduced_omits_connect_error() {
        let reduced = ServerEvent::reduced();
        assert_eq!(reduced.len(), 12);
        assert!(!reduced.contains(&ServerEvent::ConnectError));
        assert!(ServerEvent::standard().contains(&ServerEvent::ConnectError));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ServerEvent::MatchStartCheckRec.to_string(),
            "match_start_check_rec"
        );
    }
}
