//! Session struct definition
//!
//! Represents one named, connected client: its outbound channel and the
//! set of senders it has blocked.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::error::SendError;
use crate::types::SessionId;

/// Lines queued per client before further deliveries are dropped
pub const OUTBOUND_BUFFER_SIZE: usize = 32;

/// Connected client state shared between its connection task and the relay
///
/// Cloning is cheap and every clone refers to the same client: the
/// connection task keeps one to edit the block list, the relay keeps one
/// in its registry to deliver lines and ask [`Session::is_blocking`].
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque connection handle
    id: SessionId,
    /// Display name, fixed once claimed
    name: String,
    /// Relay → Client line channel
    sender: mpsc::Sender<String>,
    /// Names whose chat lines this client does not want
    blocked: Arc<RwLock<HashSet<String>>>,
}

impl Session {
    /// Create a session proposing `name`, writing into `sender`
    pub fn new(id: SessionId, name: String, sender: mpsc::Sender<String>) -> Self {
        Self {
            id,
            name,
            sender,
            blocked: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    pub fn identity(&self) -> SessionId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a line for this client
    ///
    /// Never waits. A client that is not reading fast enough loses the line
    /// once [`OUTBOUND_BUFFER_SIZE`] lines are pending. Relay delivery paths
    /// ignore the error.
    pub fn send(&self, text: impl Into<String>) -> Result<(), SendError> {
        match self.sender.try_send(text.into()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                debug!("Outbound queue full for '{}', line dropped", self.name);
                Err(SendError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(SendError::ChannelClosed),
        }
    }

    /// Block chat lines from `name` (idempotent)
    pub fn block(&self, name: &str) {
        self.blocked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string());
    }

    /// Unblock `name` (idempotent)
    pub fn unblock(&self, name: &str) {
        self.blocked
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
    }

    /// Check whether chat lines from `name` are blocked
    pub fn is_blocking(&self, name: &str) -> bool {
        self.blocked
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}
