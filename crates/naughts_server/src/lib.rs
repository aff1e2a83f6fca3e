//! Naughts Server library - real-time matchmaking for naughts and crosses
//!
//! Pairs remote participants into two-player sessions, enforces turn order
//! and move legality, and cleans up when a participant goes away.
//!
//! # Architecture
//!
//! - **Queue**: FIFO public matchmaking plus invite-code private pairing
//! - **Registry**: live connections, their liveness and session assignment
//! - **Session**: the authoritative two-player state machine
//! - **Cleanup**: tears down queue entries and sessions on leave/disconnect
//! - **Dispatcher**: routes decoded protocol messages (the [`Lobby`])
//! - **Hub**: single task owning the lobby; every message runs to completion
//! - **Transport**: WebSocket front end built on axum
//!
//! # Example
//!
//! ```
//! use naughts_server::{ClientMessage, InviteCodeGenerator, Lobby, ServerMessage};
//! use tokio::sync::mpsc;
//!
//! let mut lobby = Lobby::new(InviteCodeGenerator::seeded(1), None);
//! let (tx_a, mut rx_a) = mpsc::unbounded_channel();
//! let (tx_b, mut rx_b) = mpsc::unbounded_channel();
//! let a = lobby.connect(tx_a);
//! let b = lobby.connect(tx_b);
//!
//! lobby.dispatch(a, ClientMessage::FindGame);
//! lobby.dispatch(b, ClientMessage::FindGame);
//!
//! assert!(matches!(rx_a.try_recv(), Ok(ServerMessage::WaitForPlayer { .. })));
//! assert!(matches!(rx_a.try_recv(), Ok(ServerMessage::StartGame { .. })));
//! assert!(matches!(rx_b.try_recv(), Ok(ServerMessage::StartGame { .. })));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod cleanup;
mod config;
mod dispatcher;
mod hub;
mod ids;
mod invite;
mod protocol;
mod queue;
mod registry;
mod session;
mod transport;

// Crate-level exports - Configuration
pub use config::{ConfigError, ServerConfig};

// Crate-level exports - Identifiers
pub use ids::{ConnectionId, IdAllocator, SessionId};

// Crate-level exports - Matchmaking
pub use invite::{ALPHABET, CODE_LENGTH, InviteCode, InviteCodeGenerator};
pub use queue::{MatchQueue, PrivateOutcome, PublicOutcome, QueueEntry, Visibility};

// Crate-level exports - Connections and sessions
pub use cleanup::CleanupSupervisor;
pub use registry::{ConnectionRegistry, Outbox};
pub use session::{GameSession, MoveAccepted, MoveRejected, ReplayRejected, SessionIndex};

// Crate-level exports - Protocol and dispatch
pub use dispatcher::Lobby;
pub use hub::{HubClosed, HubCommand, HubHandle, spawn as spawn_hub};
pub use protocol::{ClientMessage, PrivateRequest, ProtocolError, ServerMessage, event, wire_result};
pub use transport::{ConnectParams, router};

// Crate-level exports - Game types
pub use naughts_rules::{Board, Cell, Mark, Outcome};
