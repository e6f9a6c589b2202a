// Connection handling module
// Writes the cached payload to one client and closes the connection

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::cache::CacheSlot;
use crate::logger;
use crate::observer::{ConnectionReport, ServerObserver};

/// Serve an accepted connection in its own task.
///
/// The payload is whatever the slot holds at this moment, even if no
/// refresh has completed yet (then it is empty). The observer is told
/// afterwards, so reporting never delays or fails the response.
pub fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    slot: Arc<CacheSlot>,
    observer: Arc<dyn ServerObserver>,
) {
    let accepted_at = Local::now();
    let started = Instant::now();

    tokio::spawn(async move {
        let cached = slot.load().await;

        match send_payload(stream, &cached.payload).await {
            Ok(()) => {
                observer.on_connection(&ConnectionReport {
                    peer_addr,
                    accepted_at,
                    bytes_sent: cached.payload.len(),
                    latency: started.elapsed(),
                });
            }
            Err(err) => logger::log_connection_error(&peer_addr, &err),
        }
    });
}

async fn send_payload(mut stream: TcpStream, payload: &[u8]) -> std::io::Result<()> {
    stream.write_all(payload).await?;
    stream.shutdown().await
}
