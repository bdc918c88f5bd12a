//! chat_relay binary
//!
//! Usage: `chat_relay [ADDR]` (default `127.0.0.1:9000`). Log verbosity
//! follows `RUST_LOG`.

use std::env;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_relay::{handle_connection, Relay, RelayHandle};

const DEFAULT_ADDR: &str = "127.0.0.1:9000";

/// Relay command queue depth
const CHANNEL_BUFFER_SIZE: usize = 256;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn spawn_connection(stream: TcpStream, peer: std::net::SocketAddr, relay: RelayHandle) {
    tokio::spawn(async move {
        if let Err(e) = handle_connection(stream, relay).await {
            error!("Connection {} ended with error: {}", peer, e);
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let addr = env::args().nth(1).unwrap_or_else(|| DEFAULT_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("Chat relay listening on {}", listener.local_addr()?);

    let (cmd_tx, cmd_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    tokio::spawn(Relay::new(cmd_rx).run());
    let relay = RelayHandle::new(cmd_tx);

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!("Accepted {}", peer);
                spawn_connection(stream, peer, relay.clone());
            }
            Err(e) => error!("Accept failed: {}", e),
        }
    }
}
