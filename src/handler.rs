//! Client connection handler
//!
//! Drives one connection from the username prompt to disconnect: claims a
//! unique name, then reads one command per line and forwards it to the
//! relay. The session is released exactly once however the loop ends.

use tokio::io::{AsyncBufRead, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, WriteHalf};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::AppError;
use crate::message::{read_line, write_line, Command, Notice};
use crate::relay::RelayHandle;
use crate::session::{Session, OUTBOUND_BUFFER_SIZE};
use crate::types::SessionId;

/// Handle a new client stream
///
/// Works over any bidirectional byte stream (a `TcpStream` in the server,
/// an in-memory duplex in tests). Returns once the client has gone away.
pub async fn handle_connection<S>(stream: S, relay: RelayHandle) -> Result<(), AppError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (reader, writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);

    let id = SessionId::new();
    debug!("Session {} opened", id);

    // Relay -> client lines; the writer task ends once every sender is dropped
    let (msg_tx, msg_rx) = mpsc::channel::<String>(OUTBOUND_BUFFER_SIZE);
    tokio::spawn(write_task(id, writer, msg_rx));

    let Some(session) = claim_name(id, &mut reader, &msg_tx, &relay).await? else {
        info!("Session {} closed before choosing a name", id);
        return Ok(());
    };
    drop(msg_tx);

    let result = read_loop(&session, &mut reader, &relay).await;
    if let Err(e) = &result {
        debug!("Session {} read loop ended with error: {}", id, e);
    }

    // Released on every exit path of the read loop
    let released = relay.release(id).await;
    info!("Session {} ('{}') disconnected", id, session.name());

    result.and(released)
}

/// Prompt for names until the relay accepts one
///
/// Returns `None` if the stream ends first. Retries are unbounded.
async fn claim_name<R>(
    id: SessionId,
    reader: &mut R,
    outbound: &mpsc::Sender<String>,
    relay: &RelayHandle,
) -> Result<Option<Session>, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let mut prompt = Notice::UsernamePrompt;
    loop {
        // Waits only on this client's own writer
        let _ = outbound.send(prompt.to_string()).await;

        let Some(name) = read_line(reader).await? else {
            return Ok(None);
        };

        let session = Session::new(id, name, outbound.clone());
        if relay.claim(session.clone()).await? {
            return Ok(Some(session));
        }

        debug!("Session {} proposed taken name '{}'", id, session.name());
        prompt = Notice::UsernameTaken;
    }
}

async fn read_loop<R>(
    session: &Session,
    reader: &mut R,
    relay: &RelayHandle,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = read_line(reader).await? {
        dispatch(session, &line, relay).await?;
    }
    Ok(())
}

/// Apply one client line
async fn dispatch(session: &Session, line: &str, relay: &RelayHandle) -> Result<(), AppError> {
    match Command::parse(line) {
        Command::Block(name) => {
            debug!("'{}' blocks '{}'", session.name(), name);
            session.block(&name);
        }
        Command::Unblock(name) => {
            debug!("'{}' unblocks '{}'", session.name(), name);
            session.unblock(&name);
        }
        Command::Online => relay.broadcast_roster().await?,
        Command::Private { to, text } => relay.send_private(session.name(), to, text).await?,
        Command::Broadcast(text) => relay.broadcast_from(session.name(), text).await?,
    }
    Ok(())
}

/// Drain the session's outbound channel into the client stream
async fn write_task<S>(
    id: SessionId,
    mut writer: WriteHalf<S>,
    mut msg_rx: mpsc::Receiver<String>,
) where
    S: AsyncWrite,
{
    while let Some(line) = msg_rx.recv().await {
        if let Err(e) = write_line(&mut writer, &line).await {
            debug!("Write to session {} failed: {}", id, e);
            break;
        }
    }

    let _ = writer.shutdown().await;
    debug!("Write task ended for {}", id);
}
