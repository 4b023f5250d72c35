// Connection management: a thin newline-delimited JSON wire over TCP.
// Delivery guarantees live on the server side; this layer only serializes
// outbound events and parses inbound ones in arrival order. There is no
// reconnect logic, a dropped connection surfaces as a single notice.

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use super::events::{InboundEvent, OutboundEvent};
use crate::notify::Notifier;

pub struct TransportHandle {
    pub outbound: mpsc::UnboundedSender<OutboundEvent>,
    pub inbound: mpsc::UnboundedReceiver<InboundEvent>,
}

/// Connect to the chat server and spawn the read/write halves. Events sent
/// into `outbound` are serialized one per line; parsed inbound events arrive
/// on `inbound` in the order the server delivered them.
pub async fn connect(addr: &str, notifier: Notifier) -> Result<TransportHandle> {
    info!("Connecting to chat server at {}", addr);
    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("Cannot connect to server {}", addr))?;
    let (read_half, write_half) = stream.into_split();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundEvent>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<InboundEvent>();

    // Write half: drain the outbound queue onto the socket.
    let write_notifier = notifier.clone();
    tokio::spawn(async move {
        let mut writer = write_half;
        while let Some(event) = outbound_rx.recv().await {
            let mut line = match serde_json::to_string(&event) {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to serialize outbound event: {}", e);
                    continue;
                }
            };
            line.push('\n');
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                error!("Connection write failed: {}", e);
                write_notifier.error("Connection Error", "Lost connection to server");
                break;
            }
        }
        debug!("Transport write task finished");
    });

    // Read half: parse server lines into inbound events.
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<InboundEvent>(&line) {
                        Ok(event) => {
                            if inbound_tx.send(event).is_err() {
                                debug!("Inbound receiver dropped, stopping read task");
                                break;
                            }
                        }
                        // Unknown events are skipped, not fatal: the server
                        // may be newer than this client.
                        Err(e) => warn!("Ignoring unparseable server line: {}", e),
                    }
                }
                Ok(None) => {
                    info!("Server closed the connection");
                    notifier.error("Connection Error", "Disconnected from server");
                    break;
                }
                Err(e) => {
                    error!("Connection read failed: {}", e);
                    notifier.error("Connection Error", "Lost connection to server");
                    break;
                }
            }
        }
    });

    Ok(TransportHandle {
        outbound: outbound_tx,
        inbound: inbound_rx,
    })
}
