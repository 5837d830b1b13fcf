//! Lifecycle of the single live socket.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::StateMachine;

/// State of the connection owned by the connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No socket and no reconnect pending.
    #[default]
    Disconnected,

    /// Handshake in flight.
    Connecting,

    /// Socket open; frames may be sent.
    Connected,

    /// Last socket failed; a reconnect timer is armed.
    Reconnecting,
}

impl LinkState {
    /// True only when outbound frames can be written.
    pub fn can_send(&self) -> bool {
        matches!(self, LinkState::Connected)
    }
}

impl StateMachine for LinkState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use LinkState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Reconnecting)
                | (Connecting, Disconnected)
                | (Connected, Reconnecting)
                | (Connected, Disconnected)
                | (Reconnecting, Connecting)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use LinkState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Reconnecting, Disconnected],
            Connected => vec![Reconnecting, Disconnected],
            Reconnecting => vec![Connecting, Disconnected],
        }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
            LinkState::Reconnecting => "reconnecting",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [LinkState; 4] = [
        LinkState::Disconnected,
        LinkState::Connecting,
        LinkState::Connected,
        LinkState::Reconnecting,
    ];

    #[test]
    fn default_is_disconnected() {
        assert_eq!(LinkState::default(), LinkState::Disconnected);
    }

    #[test]
    fn only_connected_can_send() {
        for state in ALL {
            assert_eq!(state.can_send(), state == LinkState::Connected);
        }
    }

    #[test]
    fn disconnected_cannot_jump_to_connected() {
        assert!(LinkState::Disconnected
            .transition_to(LinkState::Connected)
            .is_err());
    }

    #[test]
    fn no_state_is_terminal() {
        for state in ALL {
            assert!(!state.is_terminal(), "{state} should have outgoing moves");
        }
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&LinkState::Reconnecting).unwrap(),
            "\"reconnecting\""
        );
        assert_eq!(LinkState::Connected.to_string(), "connected");
    }
}
