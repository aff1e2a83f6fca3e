//! Two-player game sessions and the live-session index.

use crate::ids::{ConnectionId, SessionId};
use crate::protocol::ServerMessage;
use crate::registry::ConnectionRegistry;
use derive_more::{Display, Error};
use derive_getters::Getters;
use naughts_rules::{Board, Mark, Outcome, PlaceError, evaluate};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Why a move was not applied. The session is unchanged in every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum MoveRejected {
    /// The session already has a result.
    #[display("Game is already over")]
    Ended,
    /// The sender is not one of the two participants.
    #[display("Not a participant in this session")]
    NotParticipant,
    /// The other participant is to move.
    #[display("It's {}'s turn", _0)]
    WrongTurn(#[error(not(source))] Mark),
    /// Index is not a board cell.
    #[display("Cell {} is out of range", _0)]
    OutOfRange(#[error(not(source))] usize),
    /// Target cell already holds a mark.
    #[display("Cell {} is already occupied", _0)]
    Occupied(#[error(not(source))] usize),
    /// A participant has gone away.
    #[display("Opponent disconnected")]
    OpponentDisconnected,
}

impl From<PlaceError> for MoveRejected {
    fn from(err: PlaceError) -> Self {
        match err {
            PlaceError::OutOfRange(index) => MoveRejected::OutOfRange(index),
            PlaceError::Occupied(index) => MoveRejected::Occupied(index),
        }
    }
}

/// Replay requested while the session is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Game is still in progress")]
pub struct ReplayRejected;

/// An applied move, ready to be reported to the opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveAccepted {
    /// Participant who should hear about the move.
    pub opponent: ConnectionId,
    /// Mark that moved.
    pub mover: Mark,
    /// Mark to move next.
    pub turn: Mark,
    /// Board evaluation after the move.
    pub outcome: Outcome,
    /// Cell that was played.
    pub index: usize,
}

/// Authoritative state of one two-player game.
///
/// `player_a` owned the queue entry and always plays X, moving first;
/// `player_b` joined it and plays O.
#[derive(Debug, Clone, Getters)]
pub struct GameSession {
    /// Session id, stable for the session's lifetime.
    id: SessionId,
    /// Queue owner, plays X.
    player_a: ConnectionId,
    /// Joiner, plays O.
    player_b: ConnectionId,
    /// Current board.
    board: Board,
    /// Mark to move.
    turn: Mark,
    /// Set once the board has a result; cleared only by replay.
    ended: bool,
}

impl GameSession {
    /// Starts a session between the queue owner and the joiner.
    #[instrument]
    pub fn new(id: SessionId, player_a: ConnectionId, player_b: ConnectionId) -> Self {
        info!(%id, %player_a, %player_b, "Creating game session");
        Self {
            id,
            player_a,
            player_b,
            board: Board::new(),
            turn: Mark::X,
            ended: false,
        }
    }

    /// True once the session has a winner or a draw.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The mark `conn` plays, if it is a participant.
    pub fn mark_of(&self, conn: ConnectionId) -> Option<Mark> {
        if conn == self.player_a {
            Some(Mark::X)
        } else if conn == self.player_b {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// The other participant, if `conn` is one.
    pub fn opponent_of(&self, conn: ConnectionId) -> Option<ConnectionId> {
        if conn == self.player_a {
            Some(self.player_b)
        } else if conn == self.player_b {
            Some(self.player_a)
        } else {
            None
        }
    }

    /// Both participants with their marks.
    pub fn participants(&self) -> [(ConnectionId, Mark); 2] {
        [(self.player_a, Mark::X), (self.player_b, Mark::O)]
    }

    /// Applies a move by `conn` at `index`.
    ///
    /// Checks run in a fixed order: participant, range, both participants
    /// connected, session not over, turn, then cell occupancy.
    #[instrument(skip(self, registry), fields(session_id = %self.id))]
    pub fn submit_move(
        &mut self,
        conn: ConnectionId,
        index: usize,
        registry: &ConnectionRegistry,
    ) -> Result<MoveAccepted, MoveRejected> {
        let (mark, opponent) = self
            .mark_of(conn)
            .zip(self.opponent_of(conn))
            .ok_or(MoveRejected::NotParticipant)?;

        if index >= naughts_rules::CELL_COUNT {
            return Err(MoveRejected::OutOfRange(index));
        }
        if registry.is_disconnected(self.player_a) || registry.is_disconnected(self.player_b) {
            return Err(MoveRejected::OpponentDisconnected);
        }
        if self.ended {
            return Err(MoveRejected::Ended);
        }
        if self.turn != mark {
            return Err(MoveRejected::WrongTurn(self.turn));
        }

        self.board.place(index, mark)?;
        let outcome = evaluate(&self.board, mark);
        self.turn = mark.opponent();
        if outcome.is_terminal() {
            self.ended = true;
            info!(%outcome, %mark, "Session ended");
        }
        debug!(index, %mark, %outcome, "Move accepted");

        Ok(MoveAccepted {
            opponent,
            mover: mark,
            turn: self.turn,
            outcome,
            index,
        })
    }

    /// Ends the session because `leaving` is gone.
    ///
    /// Consumes the session and sends exactly one `opponent_disconnect` to
    /// the survivor, if the survivor is still connected. Returns the survivor.
    #[instrument(skip(self, registry), fields(session_id = %self.id))]
    pub fn terminate_for_disconnect(
        self,
        leaving: ConnectionId,
        registry: &ConnectionRegistry,
    ) -> Option<ConnectionId> {
        let survivor = self.opponent_of(leaving)?;
        if registry.is_disconnected(survivor) {
            debug!(%survivor, "Both participants gone");
        } else {
            registry.send(survivor, ServerMessage::OpponentDisconnect);
            info!(%survivor, "Notified survivor");
        }
        Some(survivor)
    }

    /// Resets a finished session to a fresh board with X to move.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn replay(&mut self) -> Result<(), ReplayRejected> {
        if !self.ended {
            return Err(ReplayRejected);
        }
        self.board = Board::new();
        self.turn = Mark::X;
        self.ended = false;
        info!("Session replayed");
        Ok(())
    }
}

/// Live sessions by id.
#[derive(Debug, Default)]
pub struct SessionIndex {
    sessions: HashMap<SessionId, GameSession>,
}

impl SessionIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a freshly matched session.
    pub fn insert(&mut self, session: GameSession) {
        self.sessions.insert(session.id, session);
    }

    /// Looks up a live session.
    pub fn get(&self, id: SessionId) -> Option<&GameSession> {
        self.sessions.get(&id)
    }

    /// Looks up a live session for mutation.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut GameSession> {
        self.sessions.get_mut(&id)
    }

    /// Destroys a session. Its id is never handed out again.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: SessionId) -> Option<GameSession> {
        let removed = self.sessions.remove(&id);
        if removed.is_some() {
            info!(live = self.sessions.len(), "Session removed");
        }
        removed
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when no session is live.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdAllocator;
    use tokio::sync::mpsc;

    struct Fixture {
        registry: ConnectionRegistry,
        session: GameSession,
        a: ConnectionId,
        b: ConnectionId,
    }

    fn fixture() -> Fixture {
        let mut ids = IdAllocator::new();
        let mut registry = ConnectionRegistry::new();
        let a = registry.connect(&mut ids, mpsc::unbounded_channel().0);
        let b = registry.connect(&mut ids, mpsc::unbounded_channel().0);
        let session = GameSession::new(ids.session(), a, b);
        Fixture {
            registry,
            session,
            a,
            b,
        }
    }

    #[test]
    fn test_turns_alternate_strictly() {
        let Fixture {
            registry,
            mut session,
            a,
            b,
        } = fixture();
        let moves = [(a, 0), (b, 4), (a, 8), (b, 2)];
        for (conn, index) in moves {
            let before = *session.turn();
            let accepted = session.submit_move(conn, index, &registry).unwrap();
            assert_eq!(accepted.turn, before.opponent());
            assert_eq!(*session.turn(), before.opponent());
        }
    }

    #[test]
    fn test_wrong_turn_leaves_state_untouched() {
        let Fixture {
            registry,
            mut session,
            b,
            ..
        } = fixture();
        assert_eq!(
            session.submit_move(b, 0, &registry),
            Err(MoveRejected::WrongTurn(Mark::X))
        );
        assert_eq!(session.board(), &Board::new());
        assert_eq!(*session.turn(), Mark::X);
    }

    #[test]
    fn test_cell_is_written_once() {
        let Fixture {
            registry,
            mut session,
            a,
            b,
        } = fixture();
        session.submit_move(a, 4, &registry).unwrap();
        assert_eq!(
            session.submit_move(b, 4, &registry),
            Err(MoveRejected::Occupied(4))
        );
        assert_eq!(*session.turn(), Mark::O);
    }

    #[test]
    fn test_rejects_outsiders_and_out_of_range() {
        let Fixture {
            registry,
            mut session,
            a,
            ..
        } = fixture();
        let mut ids = IdAllocator::new();
        let stranger = (0..10).map(|_| ids.connection()).last().unwrap();
        assert_eq!(
            session.submit_move(stranger, 0, &registry),
            Err(MoveRejected::NotParticipant)
        );
        assert_eq!(
            session.submit_move(a, 9, &registry),
            Err(MoveRejected::OutOfRange(9))
        );
    }

    #[test]
    fn test_win_ends_session_and_blocks_moves() {
        let Fixture {
            registry,
            mut session,
            a,
            b,
        } = fixture();
        for (conn, index) in [(a, 0), (b, 3), (a, 1), (b, 4)] {
            session.submit_move(conn, index, &registry).unwrap();
        }
        let last = session.submit_move(a, 2, &registry).unwrap();
        assert_eq!(last.outcome, Outcome::Won);
        assert_eq!(last.opponent, b);
        assert!(session.is_ended());
        assert_eq!(
            session.submit_move(b, 5, &registry),
            Err(MoveRejected::Ended)
        );
    }

    #[test]
    fn test_disconnected_participant_blocks_moves() {
        let Fixture {
            mut registry,
            mut session,
            a,
            b,
        } = fixture();
        registry.mark_disconnected(b);
        assert_eq!(
            session.submit_move(a, 0, &registry),
            Err(MoveRejected::OpponentDisconnected)
        );
    }

    #[test]
    fn test_terminate_notifies_connected_survivor_once() {
        let mut ids = IdAllocator::new();
        let mut registry = ConnectionRegistry::new();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = registry.connect(&mut ids, tx_a);
        let b = registry.connect(&mut ids, tx_b);
        let session = GameSession::new(ids.session(), a, b);

        registry.mark_disconnected(a);
        assert_eq!(session.terminate_for_disconnect(a, &registry), Some(b));
        assert_eq!(rx_b.try_recv().unwrap(), ServerMessage::OpponentDisconnect);
        assert!(rx_b.try_recv().is_err());
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn test_replay_gating() {
        let Fixture {
            registry,
            mut session,
            a,
            b,
        } = fixture();
        assert_eq!(session.replay(), Err(ReplayRejected));

        for (conn, index) in [(a, 0), (b, 3), (a, 1), (b, 4), (a, 2)] {
            session.submit_move(conn, index, &registry).unwrap();
        }
        assert!(session.is_ended());
        assert_eq!(session.replay(), Ok(()));
        assert_eq!(session.board(), &Board::new());
        assert_eq!(*session.turn(), Mark::X);
        assert!(!session.is_ended());
        assert_eq!(*session.player_a(), a);
    }
}
