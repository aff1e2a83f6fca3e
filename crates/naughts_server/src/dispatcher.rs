//! Routes decoded client messages to matchmaking and sessions.

use crate::cleanup::CleanupSupervisor;
use crate::ids::{ConnectionId, IdAllocator};
use crate::invite::{InviteCode, InviteCodeGenerator};
use crate::protocol::{ClientMessage, PrivateRequest, ServerMessage, wire_result};
use crate::queue::{MatchQueue, PrivateOutcome, PublicOutcome};
use crate::registry::{ConnectionRegistry, Outbox};
use crate::session::{GameSession, MoveRejected, SessionIndex};
use naughts_rules::Mark;
use tracing::{debug, info, instrument};

/// All matchmaking and session state, mutated by one owner at a time.
#[derive(Debug)]
pub struct Lobby {
    ids: IdAllocator,
    registry: ConnectionRegistry,
    queue: MatchQueue,
    sessions: SessionIndex,
    codes: InviteCodeGenerator,
    public_url: Option<String>,
}

impl Lobby {
    /// Creates an empty lobby.
    ///
    /// When `public_url` is set, private hosts also receive a shareable link.
    pub fn new(codes: InviteCodeGenerator, public_url: Option<String>) -> Self {
        Self {
            ids: IdAllocator::new(),
            registry: ConnectionRegistry::new(),
            queue: MatchQueue::new(),
            sessions: SessionIndex::new(),
            codes,
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
        }
    }

    /// Registered connections.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Pending matchmaking entries.
    pub fn queue(&self) -> &MatchQueue {
        &self.queue
    }

    /// Live sessions.
    pub fn sessions(&self) -> &SessionIndex {
        &self.sessions
    }

    /// Registers a new peer.
    pub fn connect(&mut self, outbox: Outbox) -> ConnectionId {
        self.registry.connect(&mut self.ids, outbox)
    }

    /// Handles a transport loss.
    #[instrument(skip(self))]
    pub fn disconnect(&mut self, conn: ConnectionId) {
        self.cleanup().on_disconnect(conn);
    }

    /// Handles one inbound message to completion.
    #[instrument(skip(self))]
    pub fn dispatch(&mut self, conn: ConnectionId, message: ClientMessage) {
        if self.registry.is_disconnected(conn) {
            debug!("Dropping message from disconnected peer");
            return;
        }
        match message {
            ClientMessage::FindGame => self.find_game(conn),
            ClientMessage::FindGamePrivate(request) => self.find_game_private(conn, request),
            ClientMessage::SetBoard { index } => self.set_board(conn, index),
            ClientMessage::LeaveGame => self.cleanup().abandon(conn),
            ClientMessage::ReplayGame => self.replay_game(conn),
        }
    }

    fn cleanup(&mut self) -> CleanupSupervisor<'_> {
        CleanupSupervisor::new(&mut self.registry, &mut self.queue, &mut self.sessions)
    }

    fn find_game(&mut self, conn: ConnectionId) {
        self.cleanup().abandon(conn);
        match self.queue.enqueue_public(conn) {
            PublicOutcome::Matched { host } => self.start_session(host, conn),
            PublicOutcome::Waiting => self.registry.send(
                conn,
                ServerMessage::WaitForPlayer {
                    private_id: None,
                    invite_url: None,
                },
            ),
        }
    }

    fn find_game_private(&mut self, conn: ConnectionId, request: PrivateRequest) {
        self.cleanup().abandon(conn);
        let code = match request {
            PrivateRequest::Host => None,
            PrivateRequest::Join(code) => Some(code),
            PrivateRequest::Unreadable => {
                self.registry.send(conn, ServerMessage::InvalidPrivateId);
                return;
            }
        };
        match self.queue.enqueue_private(conn, code, &mut self.codes) {
            PrivateOutcome::Waiting(code) => {
                let invite_url = self.invite_url(&code);
                self.registry.send(
                    conn,
                    ServerMessage::WaitForPlayer {
                        private_id: Some(code),
                        invite_url,
                    },
                );
            }
            PrivateOutcome::Matched { host } => self.start_session(host, conn),
            PrivateOutcome::InvalidCode => {
                self.registry.send(conn, ServerMessage::InvalidPrivateId);
            }
        }
    }

    fn invite_url(&self, code: &InviteCode) -> Option<String> {
        self.public_url
            .as_ref()
            .map(|base| format!("{}/#{}", base, code))
    }

    fn start_session(&mut self, host: ConnectionId, guest: ConnectionId) {
        let id = self.ids.session();
        let session = GameSession::new(id, host, guest);
        self.registry.assign_session(host, id);
        self.registry.assign_session(guest, id);
        self.announce_start(&session);
        self.sessions.insert(session);
        info!(session_id = %id, live = self.sessions.len(), "Session started");
    }

    fn announce_start(&self, session: &GameSession) {
        // Joiner hears first, then the host.
        for (conn, player) in session.participants().into_iter().rev() {
            self.registry.send(
                conn,
                ServerMessage::StartGame {
                    player,
                    turn: Mark::X,
                },
            );
        }
    }

    fn set_board(&mut self, conn: ConnectionId, index: usize) {
        let Some(id) = self.registry.session_of(conn) else {
            debug!("Move without a session, dropped");
            return;
        };
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(session_id = %id, "Move for a destroyed session");
            self.registry.send(conn, ServerMessage::OpponentDisconnect);
            return;
        };

        match session.submit_move(conn, index, &self.registry) {
            Ok(accepted) => self.registry.send(
                accepted.opponent,
                ServerMessage::GameUpdate {
                    result: wire_result(accepted.outcome, accepted.mover),
                    turn: accepted.turn,
                    index: accepted.index,
                },
            ),
            Err(MoveRejected::OpponentDisconnected) => {
                self.registry.send(conn, ServerMessage::OpponentDisconnect);
            }
            Err(reason) => debug!(%reason, index, "Move dropped"),
        }
    }

    fn replay_game(&mut self, conn: ConnectionId) {
        let Some(id) = self.registry.session_of(conn) else {
            debug!("Replay without a session, dropped");
            return;
        };
        let Some(session) = self.sessions.get_mut(id) else {
            debug!(session_id = %id, "Replay for a destroyed session, dropped");
            return;
        };

        let [(a, _), (b, _)] = session.participants();
        if self.registry.is_disconnected(a) || self.registry.is_disconnected(b) {
            self.registry.send(conn, ServerMessage::OpponentDisconnect);
            self.sessions.remove(id);
            return;
        }

        match session.replay() {
            Ok(()) => {
                // Host hears first on replay.
                for (participant, player) in session.participants() {
                    self.registry.send(
                        participant,
                        ServerMessage::StartGame {
                            player,
                            turn: Mark::X,
                        },
                    );
                }
            }
            Err(reason) => debug!(%reason, "Replay dropped"),
        }
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new(InviteCodeGenerator::from_entropy(), None)
    }
}
