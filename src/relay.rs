//! Relay actor implementation
//!
//! The central actor that owns the name registry and the membership list.
//! Every read or write of either goes through a [`RelayCommand`] handled one
//! at a time by [`Relay::run`], so no operation ever observes another one
//! half-applied.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::error::AppError;
use crate::message::Notice;
use crate::session::Session;
use crate::types::SessionId;

/// Commands sent from connection handlers to the Relay actor
#[derive(Debug)]
pub enum RelayCommand {
    /// Reserve `session.name()` if no live session holds it
    Claim {
        session: Session,
        respond: oneshot::Sender<bool>,
    },
    /// Session disconnected
    Release { id: SessionId },
    /// Deliver a raw line to every member
    Broadcast { text: String },
    /// Chat line, filtered by each recipient's block list
    BroadcastFrom { sender: String, text: String },
    /// Direct message to one named session
    SendPrivate {
        sender: String,
        receiver: String,
        text: String,
    },
    /// Snapshot of claimed names
    ListOnline { respond: oneshot::Sender<Vec<String>> },
    /// Broadcast the roster as one line
    BroadcastRoster,
}

/// The Relay actor
///
/// `registry` and `members` always hold the same sessions; `members` keeps
/// join order for the roster while `registry` gives O(1) lookup by name.
pub struct Relay {
    /// Claimed names: name -> Session
    registry: HashMap<String, Session>,
    /// Active sessions in join order
    members: Vec<Session>,
    /// Command receiver channel
    receiver: mpsc::Receiver<RelayCommand>,
}

impl Relay {
    /// Create a new Relay with the given command receiver
    pub fn new(receiver: mpsc::Receiver<RelayCommand>) -> Self {
        Self {
            registry: HashMap::new(),
            members: Vec::new(),
            receiver,
        }
    }

    /// Run the Relay event loop
    ///
    /// Continuously receives and processes commands until all handles are dropped.
    pub async fn run(mut self) {
        info!("Relay started");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!("Relay shutting down");
    }

    fn handle_command(&mut self, cmd: RelayCommand) {
        match cmd {
            RelayCommand::Claim { session, respond } => self.handle_claim(session, respond),
            RelayCommand::Release { id } => self.handle_release(id),
            RelayCommand::Broadcast { text } => self.broadcast(&text),
            RelayCommand::BroadcastFrom { sender, text } => {
                self.handle_broadcast_from(&sender, text)
            }
            RelayCommand::SendPrivate {
                sender,
                receiver,
                text,
            } => self.handle_send_private(sender, &receiver, text),
            RelayCommand::ListOnline { respond } => {
                let _ = respond.send(self.list_online());
            }
            RelayCommand::BroadcastRoster => {
                let roster = Notice::Roster {
                    names: self.list_online(),
                };
                self.broadcast(&roster.to_string());
            }
        }
    }

    /// Handle a name claim
    ///
    /// The reply goes out before registration: a handler that gave up
    /// waiting never ends up holding a name it cannot release.
    fn handle_claim(&mut self, session: Session, respond: oneshot::Sender<bool>) {
        if self.registry.contains_key(session.name()) {
            debug!("Name '{}' is taken", session.name());
            let _ = respond.send(false);
            return;
        }

        if respond.send(true).is_err() {
            debug!("Session {} left before its claim completed", session.identity());
            return;
        }

        let name = session.name().to_string();
        info!("Session {} claimed '{}'", session.identity(), name);
        self.registry.insert(name.clone(), session.clone());
        self.members.push(session);

        self.broadcast(&Notice::Joined { name }.to_string());
        debug!("Total sessions: {}", self.members.len());
    }

    /// Handle session release
    ///
    /// Keyed by id, so a repeated or stale release never evicts a later
    /// holder of the same name.
    fn handle_release(&mut self, id: SessionId) {
        let Some(pos) = self.members.iter().position(|s| s.identity() == id) else {
            debug!("Release of unknown session {} ignored", id);
            return;
        };

        let session = self.members.remove(pos);
        if self
            .registry
            .get(session.name())
            .is_some_and(|held| held.identity() == id)
        {
            self.registry.remove(session.name());
        }

        info!("Session {} released '{}'", id, session.name());
        debug!("Total sessions: {}", self.members.len());
    }

    /// Deliver `text` to every member, best-effort per recipient
    fn broadcast(&self, text: &str) {
        let delivered = self
            .members
            .iter()
            .filter(|member| member.send(text).is_ok())
            .count();
        debug!("Broadcast delivered to {}/{}", delivered, self.members.len());
    }

    fn handle_broadcast_from(&self, sender: &str, text: String) {
        let line = Notice::Chat {
            from: sender.to_string(),
            text,
        }
        .to_string();

        let mut delivered = 0;
        for member in &self.members {
            if member.is_blocking(sender) {
                continue;
            }
            if member.send(line.as_str()).is_ok() {
                delivered += 1;
            }
        }
        debug!("Chat from '{}' delivered to {}", sender, delivered);
    }

    fn handle_send_private(&self, sender: String, receiver: &str, text: String) {
        let Some(session) = self.registry.get(receiver) else {
            debug!("Private message from '{}' to unknown '{}' dropped", sender, receiver);
            return;
        };

        let _ = session.send(Notice::Private { from: sender, text }.to_string());
    }

    fn list_online(&self) -> Vec<String> {
        self.members.iter().map(|s| s.name().to_string()).collect()
    }
}

/// Cloneable front door to a running [`Relay`]
///
/// Each method enqueues one command; the ones with a result wait for the
/// actor's reply. All of them fail with [`AppError::RelayClosed`] once the
/// actor has stopped.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    sender: mpsc::Sender<RelayCommand>,
}

impl RelayHandle {
    pub fn new(sender: mpsc::Sender<RelayCommand>) -> Self {
        Self { sender }
    }

    /// Try to reserve `session.name()`; `Ok(false)` means it is taken
    pub async fn claim(&self, session: Session) -> Result<bool, AppError> {
        let (respond, reply) = oneshot::channel();
        self.dispatch(RelayCommand::Claim { session, respond }).await?;
        reply.await.map_err(|_| AppError::RelayClosed)
    }

    /// Deregister a session; safe to repeat, no-op for unknown ids
    pub async fn release(&self, id: SessionId) -> Result<(), AppError> {
        self.dispatch(RelayCommand::Release { id }).await
    }

    pub async fn broadcast(&self, text: impl Into<String>) -> Result<(), AppError> {
        self.dispatch(RelayCommand::Broadcast { text: text.into() }).await
    }

    /// Broadcast `"<sender>: <text>"` to members not blocking `sender`
    pub async fn broadcast_from(
        &self,
        sender: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), AppError> {
        self.dispatch(RelayCommand::BroadcastFrom {
            sender: sender.into(),
            text: text.into(),
        })
        .await
    }

    /// Direct message; silently dropped when `receiver` is not online
    pub async fn send_private(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<(), AppError> {
        self.dispatch(RelayCommand::SendPrivate {
            sender: sender.into(),
            receiver: receiver.into(),
            text: text.into(),
        })
        .await
    }

    /// Names of all active sessions, in join order
    pub async fn list_online(&self) -> Result<Vec<String>, AppError> {
        let (respond, reply) = oneshot::channel();
        self.dispatch(RelayCommand::ListOnline { respond }).await?;
        reply.await.map_err(|_| AppError::RelayClosed)
    }

    pub async fn broadcast_roster(&self) -> Result<(), AppError> {
        self.dispatch(RelayCommand::BroadcastRoster).await
    }

    async fn dispatch(&self, cmd: RelayCommand) -> Result<(), AppError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| AppError::RelayClosed)
    }
}
