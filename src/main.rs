use std::sync::Arc;
use std::time::Duration;

mod cache;
mod client;
mod config;
mod console;
mod error;
mod logger;
mod observer;
mod server;
mod status;
mod tail;

#[cfg(test)]
mod test_support;

use console::Console;
use observer::AccessLogObserver;
use server::StatusServer;
use status::{NoteStore, ProcessProbe, StatusSnapshot};
use tail::{LineClassifier, LogEvents, LogTracker};

/// Address queried by `craftinfo fetch` when none is given
const DEFAULT_FETCH_ADDR: &str = "127.0.0.1:5001";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let first = args.next();

    if first.as_deref() == Some("fetch") {
        let addr = args.next().unwrap_or_else(|| DEFAULT_FETCH_ADDR.to_string());
        return fetch(&addr);
    }

    let config_path = first.unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Create the Tokio runtime, sized by the workers setting
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
        logger::write_info(&format!("[CONFIG] Using {workers} worker threads"));
    } else {
        logger::write_info("[CONFIG] Using default worker threads (CPU cores)");
    }

    let runtime = runtime_builder.build()?;
    let result = runtime.block_on(async_main(cfg));

    // The console may still be parked on a blocking stdin read
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

/// Query a running daemon and print what it reports
fn fetch(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let doc = runtime.block_on(client::fetch_status(addr, client::FETCH_TIMEOUT))?;
    println!("{}", client::summary(&doc));
    Ok(())
}

async fn async_main(cfg: config::Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::log_config(&cfg);

    let notes = Arc::new(NoteStore::open(cfg.notes.store_path()).await?);

    let events = LogEvents::new()
        .on_login(|player, at| logger::write_info(&format!("[PLAYER] {player} logged in at {at}")))
        .on_logout(|player, at| logger::write_info(&format!("[PLAYER] {player} left at {at}")))
        .on_start(|version, at| {
            logger::write_info(&format!(
                "[PLAYER] Game server {} started at {at}, player list cleared",
                version.unwrap_or("(unknown version)")
            ));
        });
    let tracker = LogTracker::new(&cfg.log.path, LineClassifier::new(&cfg.log.marker), events);
    let probe = ProcessProbe::new(&cfg.process.proc_root, cfg.process.patterns.clone());
    let snapshot = StatusSnapshot::new(
        tracker,
        probe,
        Arc::clone(&notes),
        cfg.notes.limit,
        cfg.payload.format,
    );
    let rescan = snapshot.rescan_flag();

    let observer = Arc::new(AccessLogObserver::new(
        cfg.logging.access_log,
        cfg.logging.access_log_format.clone(),
    ));
    let access_log = observer.toggle();

    let mut srv = StatusServer::new(cfg.server_settings()?, snapshot, observer);
    let shutdown = srv.shutdown();
    server::start_signal_handler(Arc::clone(&shutdown), srv.trigger())?;

    srv.start()?;
    logger::write_info("started");

    let console = Console::new(notes, srv.slot(), access_log, rescan, srv.trigger());
    console.run(&shutdown).await;
    srv.stop().await?;

    logger::write_info(&format!("[SERVER] {}, goodbye", srv.phase()));
    Ok(())
}
