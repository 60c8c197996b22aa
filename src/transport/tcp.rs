// src/transport/tcp.rs

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::protocol::MAX_MESSAGE_SIZE;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::os::fd::AsRawFd;
use std::thread;

/// Creates a listening socket on the configured address.
///
/// SO_REUSEADDR is required so repeated same-port restarts do not trip over
/// a prior instance's TIME_WAIT state. SO_REUSEPORT and SO_DONTROUTE are
/// best effort, as on the platforms this daemon historically ran on: a
/// kernel that refuses them gets a warning, not a failed startup.
fn bind_listener(config: &BridgeConfig) -> Result<TcpListener, BridgeError> {
  let addr = config.socket_addr();
  let endpoint = config.endpoint();

  let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
    .map_err(|e| BridgeError::from_io_endpoint(e, &endpoint))?;
  socket
    .set_reuse_address(true)
    .map_err(|e| BridgeError::from_io_endpoint(e, &endpoint))?;
  if let Err(e) = socket.set_reuse_port(true) {
    tracing::warn!(uri = %endpoint, error = %e, "SO_REUSEPORT not applied");
  }
  if let Err(e) = set_dontroute(&socket) {
    tracing::warn!(uri = %endpoint, error = %e, "SO_DONTROUTE not applied");
  }

  socket
    .bind(&addr.into())
    .map_err(|e| BridgeError::from_io_endpoint(e, &endpoint))?;
  socket
    .listen(config.backlog)
    .map_err(|e| BridgeError::from_io_endpoint(e, &endpoint))?;

  Ok(socket.into())
}

// socket2 does not surface SO_DONTROUTE; set it through libc.
fn set_dontroute(socket: &Socket) -> io::Result<()> {
  let enable: libc::c_int = 1;
  let rc = unsafe {
    libc::setsockopt(
      socket.as_raw_fd(),
      libc::SOL_SOCKET,
      libc::SO_DONTROUTE,
      &enable as *const libc::c_int as *const libc::c_void,
      std::mem::size_of::<libc::c_int>() as libc::socklen_t,
    )
  };
  if rc != 0 {
    return Err(io::Error::last_os_error());
  }
  Ok(())
}

/// Binds the listener, retrying up to the configured bound.
///
/// Transient contention from a just-exited prior instance resolves within a
/// few attempts; exhausting the bound is fatal.
pub(crate) fn bind_with_retry(config: &BridgeConfig) -> Result<TcpListener, BridgeError> {
  let endpoint = config.endpoint();
  let mut last_error = None;

  for attempt in 1..=config.bind_retries {
    match bind_listener(config) {
      Ok(listener) => {
        let local_addr = listener.local_addr()?;
        tracing::info!(?local_addr, uri = %endpoint, attempt, "listener bound");
        return Ok(listener);
      }
      Err(e) => {
        tracing::warn!(uri = %endpoint, attempt, error = %e, "bind failed, will retry");
        last_error = Some(e);
        thread::sleep(config.bind_backoff);
      }
    }
  }

  let exhausted = BridgeError::BindExhausted {
    endpoint,
    attempts: config.bind_retries,
  };
  tracing::error!(error = %exhausted, last = ?last_error, "giving up on bind");
  Err(exhausted)
}

/// One blocking read of at most [`MAX_MESSAGE_SIZE`] bytes.
///
/// Each read corresponds to exactly one simulated event. A zero-byte read
/// means the peer died mid-session, which the protocol cannot recover from.
pub(crate) fn recv_message(stream: &mut TcpStream) -> Result<Vec<u8>, BridgeError> {
  let mut buffer = [0u8; MAX_MESSAGE_SIZE];
  let nbytes = stream.read(&mut buffer)?;
  if nbytes == 0 {
    return Err(BridgeError::ConnectionClosed);
  }
  tracing::debug!(peer = stream.as_raw_fd(), nbytes, "received event message");
  Ok(buffer[..nbytes].to_vec())
}

/// One blocking write of the whole payload.
pub(crate) fn send_message(stream: &mut TcpStream, payload: &[u8]) -> Result<(), BridgeError> {
  stream.write_all(payload)?;
  stream.flush()?;
  tracing::debug!(peer = stream.as_raw_fd(), nbytes = payload.len(), "sent event message");
  Ok(())
}
