// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)
// - SIGHUP:  Refresh the cached payload immediately

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::cache::RefreshTrigger;
use crate::logger;

/// Shared cancellation signal observed by every background task.
///
/// Once requested it stays requested; [`Shutdown::wait`] returns
/// immediately for any caller that arrives late.
#[derive(Debug, Default)]
pub struct Shutdown {
    requested: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent request is not missed
        notified.as_mut().enable();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

/// Start signal handlers (Unix only)
///
/// | Signal  | Action            |
/// |---------|-------------------|
/// | SIGTERM | Graceful stop     |
/// | SIGINT  | Graceful stop     |
/// | SIGHUP  | Refresh now       |
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Shutdown>, trigger: RefreshTrigger) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    logger::write_info(&format!(
        "[SIGNAL] Handlers registered (pid {}): SIGTERM/SIGINT stop, SIGHUP refresh",
        std::process::id()
    ));

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = sighup.recv() => {
                    logger::write_info("[SIGNAL] SIGHUP received, refreshing payload");
                    trigger.refresh_now();
                }

                _ = sigterm.recv() => {
                    logger::write_info("[SIGNAL] SIGTERM received, initiating graceful shutdown");
                    shutdown.request();
                    break;
                }

                _ = sigint.recv() => {
                    logger::write_info("[SIGNAL] SIGINT received (Ctrl+C), initiating graceful shutdown");
                    shutdown.request();
                    break;
                }

                () = shutdown.wait() => break,
            }
        }
    });

    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Shutdown>, _trigger: RefreshTrigger) -> std::io::Result<()> {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if result.is_ok() {
                    logger::write_info("[SIGNAL] Ctrl+C received, initiating shutdown");
                    shutdown.request();
                }
            }
            () = shutdown.wait() => {}
        }
    });
    Ok(())
}
