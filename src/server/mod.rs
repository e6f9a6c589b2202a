// Server module entry point
// Listener setup, accept loop, connection handling and lifecycle control

pub mod connection;
pub mod lifecycle;
pub mod listener;
pub mod signal;

// Rust does not allow `loop` as a module name (keyword), use server_loop instead
#[path = "loop.rs"]
pub mod server_loop;

pub use lifecycle::{Phase, ServerSettings, StatusServer};
pub use signal::{start_signal_handler, Shutdown};
