// Server lifecycle module
// Owns the listening socket and both background tasks: Idle → Running → Stopping → Stopped

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::listener::bind_reusable;
use super::server_loop::{run_accept_loop, AcceptLoopConfig};
use super::signal::Shutdown;
use crate::cache::{CacheRefresher, CacheSlot, RefreshTrigger, SnapshotSource};
use crate::error::ServerError;
use crate::logger;
use crate::observer::ServerObserver;

/// Slack added to each join deadline in `stop`.
const JOIN_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    Stopping,
    Stopped,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Stopping => write!(f, "stopping"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Network and timing settings for [`StatusServer`].
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub backlog: i32,
    pub poll_interval: Duration,
    pub refresh_interval: Duration,
}

/// Caching status server: one refresher task keeps the payload fresh, one
/// acceptor task hands it to every client that connects.
pub struct StatusServer<S> {
    settings: ServerSettings,
    phase: Phase,
    source: Option<S>,
    slot: Arc<CacheSlot>,
    observer: Arc<dyn ServerObserver>,
    trigger: RefreshTrigger,
    shutdown: Arc<Shutdown>,
    acceptor: Option<JoinHandle<TcpListener>>,
    refresher: Option<JoinHandle<()>>,
}

impl<S: SnapshotSource> StatusServer<S> {
    pub fn new(settings: ServerSettings, source: S, observer: Arc<dyn ServerObserver>) -> Self {
        Self {
            settings,
            phase: Phase::Idle,
            source: Some(source),
            slot: Arc::new(CacheSlot::new()),
            observer,
            trigger: RefreshTrigger::new(),
            shutdown: Arc::new(Shutdown::new()),
            acceptor: None,
            refresher: None,
        }
    }

    /// Bind the socket and launch the refresher and acceptor tasks.
    ///
    /// Must be called from within a Tokio runtime. Returns the bound
    /// address (useful when the configured port is 0).
    pub fn start(&mut self) -> Result<SocketAddr, ServerError> {
        if self.phase != Phase::Idle {
            return Err(ServerError::InvalidPhase {
                action: "start",
                phase: self.phase,
            });
        }
        let Some(source) = self.source.take() else {
            return Err(ServerError::InvalidPhase {
                action: "start",
                phase: self.phase,
            });
        };

        let addr = self.settings.addr;
        let listener = bind_reusable(addr, self.settings.backlog)
            .map_err(|source| ServerError::Bind { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ServerError::Bind { addr, source })?;

        let refresher = CacheRefresher::new(
            source,
            Arc::clone(&self.slot),
            self.settings.refresh_interval,
            self.trigger.clone(),
            Arc::clone(&self.observer),
        );
        self.refresher = Some(tokio::spawn(refresher.run(Arc::clone(&self.shutdown))));

        let config = AcceptLoopConfig {
            poll_interval: self.settings.poll_interval,
            slot: Arc::clone(&self.slot),
            observer: Arc::clone(&self.observer),
        };
        self.acceptor = Some(tokio::spawn(run_accept_loop(
            listener,
            config,
            Arc::clone(&self.shutdown),
        )));

        self.phase = Phase::Running;
        logger::log_server_start(&local_addr, &self.settings);
        Ok(local_addr)
    }

    /// Signal both tasks, wait for them and close the socket.
    ///
    /// The acceptor is given one poll interval, the refresher one refresh
    /// interval (it finishes an in-flight snapshot first). A refresher that
    /// is still busy after that is left to finish on its own. Calling stop
    /// again, or on a server that never started, is a no-op.
    pub async fn stop(&mut self) -> Result<(), ServerError> {
        match self.phase {
            Phase::Running => {}
            Phase::Idle => {
                self.phase = Phase::Stopped;
                return Ok(());
            }
            Phase::Stopping | Phase::Stopped => return Ok(()),
        }

        self.phase = Phase::Stopping;
        self.shutdown.request();
        logger::write_info("[SHUTDOWN] Stopping status server");

        let mut first_error = None;

        if let Some(acceptor) = self.acceptor.take() {
            let deadline = self.settings.poll_interval + JOIN_GRACE;
            if let Err(e) = join_acceptor(acceptor, deadline).await {
                first_error.get_or_insert(e);
            }
        }

        if let Some(mut refresher) = self.refresher.take() {
            let deadline = self.settings.refresh_interval + self.settings.poll_interval + JOIN_GRACE;
            match tokio::time::timeout(deadline, &mut refresher).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    logger::log_error(&format!("Refresher task failed: {e}"));
                    first_error.get_or_insert(ServerError::Join(e));
                }
                Err(_) => {
                    logger::log_warning(
                        "Refresher still computing a snapshot, leaving it to finish in the background",
                    );
                }
            }
        }

        self.phase = Phase::Stopped;
        logger::write_info("[SHUTDOWN] Status server stopped");

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub fn slot(&self) -> Arc<CacheSlot> {
        Arc::clone(&self.slot)
    }

    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    /// Cancellation signal shared with both tasks; requesting it from
    /// outside (e.g. a signal handler) makes the tasks wind down.
    pub fn shutdown(&self) -> Arc<Shutdown> {
        Arc::clone(&self.shutdown)
    }
}

/// Wait for the acceptor to hand back the listener, aborting it after
/// `deadline`. The listening socket is closed when this returns.
async fn join_acceptor(
    mut acceptor: JoinHandle<TcpListener>,
    deadline: Duration,
) -> Result<(), ServerError> {
    match tokio::time::timeout(deadline, &mut acceptor).await {
        // Dropping the listener closes the socket
        Ok(Ok(listener)) => {
            drop(listener);
            Ok(())
        }
        Ok(Err(e)) => {
            logger::log_error(&format!("Acceptor task failed: {e}"));
            Err(ServerError::Join(e))
        }
        Err(_) => {
            logger::log_warning("Acceptor did not stop in time, aborting it");
            acceptor.abort();
            // Cancellation drops the task's future and the listener with it
            drop(acceptor.await);
            Ok(())
        }
    }
}
