//! Waiting list of connections looking for an opponent.

use crate::ids::ConnectionId;
use crate::invite::{InviteCode, InviteCodeGenerator};
use derive_new::new;
use std::collections::VecDeque;
use tracing::{debug, info, instrument};

/// Whether an entry can be matched by anyone or only by invite code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    /// Matched with the next public requester.
    Public,
    /// Matched only by a requester presenting this code.
    Private(InviteCode),
}

/// One connection waiting to be matched.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct QueueEntry {
    /// Owner of the entry; becomes X when matched.
    pub connection: ConnectionId,
    /// Public or private.
    pub visibility: Visibility,
}

/// Result of a public matchmaking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicOutcome {
    /// Nobody was waiting; the requester is now queued.
    Waiting,
    /// Paired with the oldest public entry, owned by `host`.
    Matched {
        /// Owner of the consumed entry.
        host: ConnectionId,
    },
}

/// Result of a private matchmaking request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateOutcome {
    /// Queued under a fresh code to share.
    Waiting(InviteCode),
    /// Paired with the entry holding the presented code.
    Matched {
        /// Owner of the consumed entry.
        host: ConnectionId,
    },
    /// No pending entry holds the presented code.
    InvalidCode,
}

/// FIFO queue of pending matchmaking entries.
///
/// Holds at most one entry per connection; callers run
/// [`MatchQueue::remove_if_pending`] before every new request.
#[derive(Debug, Default)]
pub struct MatchQueue {
    entries: VecDeque<QueueEntry>,
}

impl MatchQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs with the oldest public entry or queues the requester.
    #[instrument(skip(self))]
    pub fn enqueue_public(&mut self, connection: ConnectionId) -> PublicOutcome {
        self.remove_if_pending(connection);
        let oldest_public = self
            .entries
            .iter()
            .position(|entry| entry.visibility == Visibility::Public);

        match oldest_public.and_then(|pos| self.entries.remove(pos)) {
            Some(entry) => {
                info!(host = %entry.connection, guest = %connection, "Public match");
                PublicOutcome::Matched {
                    host: entry.connection,
                }
            }
            None => {
                self.entries
                    .push_back(QueueEntry::new(connection, Visibility::Public));
                debug!(pending = self.entries.len(), "Queued public entry");
                PublicOutcome::Waiting
            }
        }
    }

    /// Hosts a private entry under a fresh code, or joins one by code.
    #[instrument(skip(self, codes))]
    pub fn enqueue_private(
        &mut self,
        connection: ConnectionId,
        code: Option<InviteCode>,
        codes: &mut InviteCodeGenerator,
    ) -> PrivateOutcome {
        self.remove_if_pending(connection);
        match code {
            None => {
                let code = codes.generate(|candidate| self.holds_code(candidate));
                self.entries
                    .push_back(QueueEntry::new(connection, Visibility::Private(code.clone())));
                info!(%code, "Queued private entry");
                PrivateOutcome::Waiting(code)
            }
            Some(code) => {
                let found = self
                    .entries
                    .iter()
                    .position(|entry| matches!(&entry.visibility, Visibility::Private(c) if *c == code));
                match found.and_then(|pos| self.entries.remove(pos)) {
                    Some(entry) => {
                        info!(%code, host = %entry.connection, guest = %connection, "Private match");
                        PrivateOutcome::Matched {
                            host: entry.connection,
                        }
                    }
                    None => {
                        debug!(%code, "No pending entry for invite code");
                        PrivateOutcome::InvalidCode
                    }
                }
            }
        }
    }

    /// Removes any entry owned by `connection`. Safe to call repeatedly.
    #[instrument(skip(self))]
    pub fn remove_if_pending(&mut self, connection: ConnectionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.connection != connection);
        let removed = self.entries.len() != before;
        if removed {
            debug!("Removed pending entry");
        }
        removed
    }

    /// True when `connection` owns a pending entry.
    pub fn contains(&self, connection: ConnectionId) -> bool {
        self.entries.iter().any(|entry| entry.connection == connection)
    }

    /// Codes of all pending private entries, oldest first.
    pub fn pending_codes(&self) -> Vec<&InviteCode> {
        self.entries
            .iter()
            .filter_map(|entry| match &entry.visibility {
                Visibility::Private(code) => Some(code),
                Visibility::Public => None,
            })
            .collect()
    }

    /// Pending entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn holds_code(&self, code: &InviteCode) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(&entry.visibility, Visibility::Private(c) if c == code))
    }
}
