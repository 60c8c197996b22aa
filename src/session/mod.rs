// src/session/mod.rs

//! Ownership of the listening socket and the per-event accept cycle.
//!
//! The peer driver opens a fresh connection for most events and decides on
//! its own when to reconnect, so the session keeps exactly two slots: the
//! connection being serviced now and the one serviced last event. The old
//! connection is retired only after the reply for the new one has gone out,
//! never before, so a socket the peer might still read from is never closed
//! under it. Together with the listener that caps the daemon at three open
//! descriptors.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::transport::tcp;
use std::net::{TcpListener, TcpStream};
use std::os::fd::{AsRawFd, RawFd};

/// Lifecycle of the session.
///
/// Unbound, Bound and Listening are traversed once during construction;
/// Accepting and Servicing alternate once per event; Closed is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
  Listening,
  Accepting,
  Servicing,
  Closed,
}

#[derive(Debug)]
pub(crate) struct Session {
  listener: Option<TcpListener>,
  current: Option<TcpStream>,
  previous: Option<TcpStream>,
  state: SessionState,
  endpoint: String,
}

impl Session {
  /// Binds the listener (with bounded retry) and enters Listening.
  pub fn bind(config: &BridgeConfig) -> Result<Self, BridgeError> {
    let listener = tcp::bind_with_retry(config)?;
    Ok(Self {
      listener: Some(listener),
      current: None,
      previous: None,
      state: SessionState::Listening,
      endpoint: config.endpoint(),
    })
  }

  /// Blocking accept of the connection for the next event.
  ///
  /// The connection serviced last event moves to the retirement slot. If a
  /// send was abandoned and the slot is still occupied, the stale socket is
  /// dropped here so no more than two peer sockets ever stay open.
  pub fn accept(&mut self) -> Result<RawFd, BridgeError> {
    let listener = self
      .listener
      .as_ref()
      .ok_or(BridgeError::InvalidState("accept on a closed session"))?;
    Self::transition(&mut self.state, SessionState::Accepting);

    let (stream, peer_addr) = listener.accept()?;
    let fd = stream.as_raw_fd();
    tracing::info!(listener = listener.as_raw_fd(), peer = fd, %peer_addr, "new peer connection");

    if let Some(stale) = self.previous.take() {
      tracing::debug!(peer = stale.as_raw_fd(), "dropping unretired peer socket");
    }
    self.previous = self.current.take();
    self.current = Some(stream);
    Self::transition(&mut self.state, SessionState::Servicing);
    Ok(fd)
  }

  /// Receives one event message from the current peer.
  pub fn receive(&mut self) -> Result<Vec<u8>, BridgeError> {
    let stream = self
      .current
      .as_mut()
      .ok_or(BridgeError::InvalidState("receive without an accepted peer"))?;
    tcp::recv_message(stream)
  }

  /// Sends the reply for this event on the current peer, then retires the
  /// previous one. Retirement must not happen earlier; see the module
  /// comment.
  pub fn reply(&mut self, payload: &[u8]) -> Result<(), BridgeError> {
    let stream = self
      .current
      .as_mut()
      .ok_or(BridgeError::InvalidState("send without an accepted peer"))?;
    tcp::send_message(stream, payload)?;
    self.retire_previous();
    Ok(())
  }

  /// Closes the previous peer socket, exactly once per connection.
  fn retire_previous(&mut self) {
    if let Some(prev) = self.previous.take() {
      tracing::info!(peer = prev.as_raw_fd(), "retiring previous peer connection");
    }
  }

  /// Releases every socket. Idempotent.
  pub fn close(&mut self) {
    if self.state == SessionState::Closed {
      return;
    }
    self.previous.take();
    self.current.take();
    if let Some(listener) = self.listener.take() {
      tracing::info!(listener = listener.as_raw_fd(), uri = %self.endpoint, "closing listener");
    }
    Self::transition(&mut self.state, SessionState::Closed);
  }

  pub fn state(&self) -> SessionState {
    self.state
  }

  fn transition(state: &mut SessionState, next: SessionState) {
    if *state != next {
      tracing::debug!(from = ?*state, to = ?next, "session state change");
      *state = next;
    }
  }
}

impl Drop for Session {
  fn drop(&mut self) {
    self.close();
  }
}
