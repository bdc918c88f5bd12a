//! Error types for the chat relay
//!
//! Defines connection-level errors and outbound delivery errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// Every variant is fatal for the connection that hit it and never
/// for the relay or any other session.
#[derive(Debug, Error)]
pub enum AppError {
    /// IO error on the client stream (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The relay actor is no longer receiving commands (fatal)
    #[error("Relay closed")]
    RelayClosed,
}

/// Message send errors
///
/// Occurs when delivering a line to a session that cannot take it.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The client is not draining its queue; the line was dropped
    #[error("Outbound queue full")]
    QueueFull,
}
