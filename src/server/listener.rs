// Reusable listener module
// Binds the status socket with SO_REUSEADDR and a configurable backlog

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

/// Bind `addr` with `SO_REUSEADDR` so a restarted daemon is not blocked by
/// sockets left in `TIME_WAIT`, and listen with `backlog` pending slots.
///
/// Must be called from within a Tokio runtime.
pub fn bind_reusable(addr: SocketAddr, backlog: i32) -> std::io::Result<TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;

    TcpListener::from_std(socket.into())
}
