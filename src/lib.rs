//! Line-oriented TCP Chat Relay Library
//!
//! Clients connect over a plain text stream, claim a unique display name,
//! and exchange broadcast or private messages through a central relay.
//!
//! # Features
//! - Unique username claim with re-prompt on collision
//! - Broadcast chat with per-recipient block lists
//! - Private messages
//! - Online roster
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Relay` is the central actor owning the name registry and membership
//! - Each connection runs `handle_connection` and talks to the relay through
//!   a cloneable `RelayHandle`
//! - The only state shared outside the actor is each session's block list
//!
//! # Protocol
//! One command per line: `/block <name>`, `/unblock <name>`, `/online`,
//! `/private <name> <text...>`. Any other line is chat.
//!
//! # Example
//! ```no_run
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use chat_relay::{handle_connection, Relay, RelayHandle};
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:9000").await?;
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(Relay::new(cmd_rx).run());
//!     let relay = RelayHandle::new(cmd_tx);
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         tokio::spawn(handle_connection(stream, relay.clone()));
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod handler;
pub mod message;
pub mod relay;
pub mod session;
pub mod types;

// Re-export main types for convenience
pub use error::{AppError, SendError};
pub use handler::handle_connection;
pub use message::{Command, Notice};
pub use relay::{Relay, RelayCommand, RelayHandle};
pub use session::Session;
pub use types::SessionId;
