//! Process-wide table of live connections.

use crate::ids::{ConnectionId, IdAllocator, SessionId};
use crate::protocol::ServerMessage;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

/// Channel a connection's transport drains to deliver outbound messages.
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;

/// Everything the server tracks about one peer.
#[derive(Debug)]
struct ConnectionState {
    outbox: Outbox,
    disconnected: bool,
    session: Option<SessionId>,
}

/// Maps connection handles to liveness and session assignment.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, ConnectionState>,
}

impl ConnectionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new peer and returns its handle.
    #[instrument(skip(self, ids, outbox))]
    pub fn connect(&mut self, ids: &mut IdAllocator, outbox: Outbox) -> ConnectionId {
        let conn = ids.connection();
        self.connections.insert(
            conn,
            ConnectionState {
                outbox,
                disconnected: false,
                session: None,
            },
        );
        info!(%conn, live = self.connections.len(), "Connection registered");
        conn
    }

    /// Flags a peer whose transport is gone.
    #[instrument(skip(self))]
    pub fn mark_disconnected(&mut self, conn: ConnectionId) {
        if let Some(state) = self.connections.get_mut(&conn) {
            state.disconnected = true;
        }
    }

    /// True when the peer is flagged disconnected or no longer registered.
    pub fn is_disconnected(&self, conn: ConnectionId) -> bool {
        self.connections
            .get(&conn)
            .is_none_or(|state| state.disconnected)
    }

    /// Returns the session the peer was last assigned to.
    pub fn session_of(&self, conn: ConnectionId) -> Option<SessionId> {
        self.connections.get(&conn).and_then(|state| state.session)
    }

    /// Records the peer's session.
    #[instrument(skip(self))]
    pub fn assign_session(&mut self, conn: ConnectionId, session: SessionId) {
        if let Some(state) = self.connections.get_mut(&conn) {
            state.session = Some(session);
        }
    }

    /// Forgets the peer's session assignment.
    #[instrument(skip(self))]
    pub fn clear_session(&mut self, conn: ConnectionId) {
        if let Some(state) = self.connections.get_mut(&conn) {
            state.session = None;
        }
    }

    /// Drops the peer entirely.
    #[instrument(skip(self))]
    pub fn remove(&mut self, conn: ConnectionId) -> bool {
        let removed = self.connections.remove(&conn).is_some();
        debug!(removed, live = self.connections.len(), "Connection removed");
        removed
    }

    /// Number of registered peers.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True when no peers are registered.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Delivers a message to a live peer.
    ///
    /// Messages to disconnected or unknown peers are skipped.
    #[instrument(skip(self, message))]
    pub fn send(&self, conn: ConnectionId, message: ServerMessage) {
        match self.connections.get(&conn) {
            Some(state) if !state.disconnected => {
                debug!(?message, "Sending");
                if state.outbox.send(message).is_err() {
                    debug!("Outbox closed, transport already gone");
                }
            }
            _ => debug!(?message, "Skipping send to disconnected peer"),
        }
    }
}
