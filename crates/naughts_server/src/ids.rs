//! Opaque identifiers for connections and sessions.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Identifies one peer connection for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display("conn-{}", _0)]
pub struct ConnectionId(u64);

/// Identifies one game session.
///
/// Generated at match time, independently of either participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[display("session-{}", _0)]
pub struct SessionId(u64);

/// Hands out identifiers that are never reused.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next_connection: u64,
    next_session: u64,
}

impl IdAllocator {
    /// Creates an allocator starting at 1 for both kinds.
    pub fn new() -> Self {
        Self {
            next_connection: 1,
            next_session: 1,
        }
    }

    /// Allocates the next connection id.
    pub fn connection(&mut self) -> ConnectionId {
        let id = ConnectionId(self.next_connection);
        self.next_connection += 1;
        id
    }

    /// Allocates the next session id.
    pub fn session(&mut self) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        id
    }
}
