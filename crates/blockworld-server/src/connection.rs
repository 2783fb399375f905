//! Connection lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConnectionError;

/// Lifecycle state of a player connection.
///
/// States only ever move forward: `Handshaking → Login → Play →
/// Disconnected`. Any live state may jump straight to `Disconnected`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Handshaking,
    Login,
    Play,
    Disconnected,
}

impl ConnectionState {
    /// The state following this one, if any.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Handshaking => Some(Self::Login),
            Self::Login => Some(Self::Play),
            Self::Play => Some(Self::Disconnected),
            Self::Disconnected => None,
        }
    }

    /// Whether the connection is still open.
    pub const fn is_live(self) -> bool {
        !matches!(self, Self::Disconnected)
    }

    /// Whether the tick loop simulates this connection's player.
    pub const fn receives_physics(self) -> bool {
        matches!(self, Self::Play)
    }

    /// Move one step forward.
    pub fn advance(&mut self) -> Result<Self, ConnectionError> {
        let next = self.next().ok_or(ConnectionError::Closed)?;
        *self = next;
        Ok(next)
    }

    /// Move to `to`, which must be the next state or `Disconnected`.
    pub fn transition(&mut self, to: Self) -> Result<(), ConnectionError> {
        if !self.is_live() {
            return Err(ConnectionError::Closed);
        }
        if self.next() == Some(to) || to == Self::Disconnected {
            *self = to;
            Ok(())
        } else {
            Err(ConnectionError::InvalidTransition { from: *self, to })
        }
    }

    /// Close the connection. Returns false if it was already closed.
    pub fn disconnect(&mut self) -> bool {
        let was_live = self.is_live();
        *self = Self::Disconnected;
        was_live
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Handshaking => "handshaking",
            Self::Login => "login",
            Self::Play => "play",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}
