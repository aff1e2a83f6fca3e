//! Single task that owns the [`Lobby`].
//!
//! Transports never touch lobby state directly; they send [`HubCommand`]s
//! and the hub applies them one at a time, each to completion.

use crate::dispatcher::Lobby;
use crate::ids::ConnectionId;
use crate::invite::InviteCode;
use crate::protocol::{ClientMessage, PrivateRequest, ServerMessage};
use derive_more::{Display, Error};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Work for the hub.
#[derive(Debug)]
pub enum HubCommand {
    /// Register a new peer; an invite code joins that private entry at once.
    Connect {
        /// Where the peer's outbound messages go.
        outbox: mpsc::UnboundedSender<ServerMessage>,
        /// Code taken from an invite link, if any.
        invite: Option<InviteCode>,
        /// Receives the new connection id.
        reply: oneshot::Sender<ConnectionId>,
    },
    /// A decoded message from a peer.
    Inbound {
        /// Sender.
        conn: ConnectionId,
        /// Message.
        message: ClientMessage,
    },
    /// The peer's transport closed.
    Disconnect {
        /// Departed peer.
        conn: ConnectionId,
    },
}

/// The hub task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
#[display("Hub is not running")]
pub struct HubClosed;

/// Cloneable front end to the hub task.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<HubCommand>,
}

impl HubHandle {
    /// Registers a peer and returns its id.
    #[instrument(skip(self, outbox))]
    pub async fn connect(
        &self,
        outbox: mpsc::UnboundedSender<ServerMessage>,
        invite: Option<InviteCode>,
    ) -> Result<ConnectionId, HubClosed> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(HubCommand::Connect {
                outbox,
                invite,
                reply,
            })
            .map_err(|_| HubClosed)?;
        rx.await.map_err(|_| HubClosed)
    }

    /// Forwards a decoded message.
    pub fn inbound(&self, conn: ConnectionId, message: ClientMessage) -> Result<(), HubClosed> {
        self.commands
            .send(HubCommand::Inbound { conn, message })
            .map_err(|_| HubClosed)
    }

    /// Reports a closed transport.
    pub fn disconnect(&self, conn: ConnectionId) -> Result<(), HubClosed> {
        self.commands
            .send(HubCommand::Disconnect { conn })
            .map_err(|_| HubClosed)
    }
}

/// Spawns the hub task. It runs until every [`HubHandle`] is dropped and
/// returns the lobby so callers can inspect final state.
#[instrument(skip(lobby))]
pub fn spawn(lobby: Lobby) -> (HubHandle, JoinHandle<Lobby>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run(lobby, rx));
    (HubHandle { commands: tx }, task)
}

async fn run(mut lobby: Lobby, mut commands: mpsc::UnboundedReceiver<HubCommand>) -> Lobby {
    info!("Hub started");
    while let Some(command) = commands.recv().await {
        apply(&mut lobby, command);
    }
    info!("All handles dropped, hub stopping");
    lobby
}

fn apply(lobby: &mut Lobby, command: HubCommand) {
    match command {
        HubCommand::Connect {
            outbox,
            invite,
            reply,
        } => {
            let conn = lobby.connect(outbox);
            if reply.send(conn).is_err() {
                warn!(%conn, "Transport gave up before registration finished");
                lobby.disconnect(conn);
                return;
            }
            if let Some(code) = invite {
                debug!(%conn, %code, "Joining from invite link");
                lobby.dispatch(conn, ClientMessage::FindGamePrivate(PrivateRequest::Join(code)));
            }
        }
        HubCommand::Inbound { conn, message } => lobby.dispatch(conn, message),
        HubCommand::Disconnect { conn } => lobby.disconnect(conn),
    }
}
