//! Tearing down queue entries and sessions when a peer goes away.

use crate::ids::ConnectionId;
use crate::queue::MatchQueue;
use crate::registry::ConnectionRegistry;
use crate::session::SessionIndex;
use tracing::{debug, info, instrument};

/// Borrows the shared tables for one cleanup pass.
///
/// Survivors keep their stale session id, so anything they send for the
/// destroyed session is answered with `opponent_disconnect`.
#[derive(Debug)]
pub struct CleanupSupervisor<'a> {
    registry: &'a mut ConnectionRegistry,
    queue: &'a mut MatchQueue,
    sessions: &'a mut SessionIndex,
}

impl<'a> CleanupSupervisor<'a> {
    /// Creates a supervisor over the given tables.
    pub fn new(
        registry: &'a mut ConnectionRegistry,
        queue: &'a mut MatchQueue,
        sessions: &'a mut SessionIndex,
    ) -> Self {
        Self {
            registry,
            queue,
            sessions,
        }
    }

    /// Handles a transport loss.
    ///
    /// Marks the peer disconnected, drops its queue entry, ends its session
    /// and finally forgets the peer.
    #[instrument(skip(self))]
    pub fn on_disconnect(mut self, conn: ConnectionId) {
        self.registry.mark_disconnected(conn);
        self.queue.remove_if_pending(conn);
        self.end_session(conn);
        self.registry.remove(conn);
        info!("Disconnect cleanup complete");
    }

    /// Withdraws a live peer from matchmaking and from its session.
    ///
    /// Runs on `leave_game` and before every matchmaking request.
    #[instrument(skip(self))]
    pub fn abandon(mut self, conn: ConnectionId) {
        self.queue.remove_if_pending(conn);
        self.end_session(conn);
        self.registry.clear_session(conn);
    }

    fn end_session(&mut self, conn: ConnectionId) {
        let Some(id) = self.registry.session_of(conn) else {
            return;
        };
        match self.sessions.remove(id) {
            Some(session) => {
                session.terminate_for_disconnect(conn, &*self.registry);
            }
            None => debug!(session_id = %id, "Session already gone"),
        }
    }
}
