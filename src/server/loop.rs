// Accept loop module
// Accepts connections until shutdown, handing each one to its own task

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::handle_connection;
use super::signal::Shutdown;
use crate::cache::CacheSlot;
use crate::logger;
use crate::observer::ServerObserver;

/// Pause after an accept error that is not about a single connection
/// (e.g. EMFILE), so a persistent failure is not retried in a tight loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Configuration for accept loop behavior
pub struct AcceptLoopConfig {
    /// Upper bound on one accept wait, so shutdown is noticed promptly
    pub poll_interval: Duration,
    pub slot: Arc<CacheSlot>,
    pub observer: Arc<dyn ServerObserver>,
}

/// Accept until `shutdown` is requested, then hand the listener back so
/// the owner decides when the socket is closed.
pub async fn run_accept_loop(
    listener: TcpListener,
    config: AcceptLoopConfig,
    shutdown: Arc<Shutdown>,
) -> TcpListener {
    while !shutdown.is_requested() {
        tokio::select! {
            accept_result = tokio::time::timeout(config.poll_interval, listener.accept()) => {
                match accept_result {
                    // Poll timeout: loop around and re-check the stop flag
                    Err(_) => {}
                    Ok(Ok((stream, peer_addr))) => {
                        handle_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&config.slot),
                            Arc::clone(&config.observer),
                        );
                    }
                    Ok(Err(e)) if is_transient(&e) => {}
                    Ok(Err(e)) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        back_off(&shutdown).await;
                    }
                }
            }

            () = shutdown.wait() => break,
        }
    }

    listener
}

/// Sleep for the accept error backoff, cut short by shutdown.
async fn back_off(shutdown: &Shutdown) {
    tokio::select! {
        () = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
        () = shutdown.wait() => {}
    }
}

/// Errors that only concern the one connection being accepted.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
