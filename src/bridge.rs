// src/bridge.rs

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::lifecycle::process::{self, PidRecord, ProcessScanner, ProcfsScanner};
use crate::lifecycle::{self, ShutdownReason, ShutdownToken};
use crate::protocol::codec;
use crate::registry::PortRegistry;
use crate::session::{Session, SessionState};
use crate::store::PortStore;
use std::io;
use std::thread;

/// What one `listen` call produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
  /// An event message was received and decoded into the store.
  Received,
  /// A termination trigger fired; the link is closed. The host should exit
  /// with [`ShutdownReason::exit_code`].
  Shutdown(ShutdownReason),
}

// The host drives one event as listen, then value accessors, then send.
// The phase makes an out-of-order call a reported error instead of
// undefined behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventPhase {
  Idle,
  Received,
}

/// One daemon instance: the store, the registry, the session and the
/// termination state, owned together and driven by the host's callbacks.
///
/// The host calls [`Bridge::initialize`] once, then per simulated event
/// [`Bridge::listen`], the value accessors, and [`Bridge::send`]. All calls
/// must come from one thread; the daemon is strictly sequential.
#[derive(Debug)]
pub struct Bridge {
  registry: PortRegistry,
  store: PortStore,
  session: Session,
  token: ShutdownToken,
  phase: EventPhase,
  record: PidRecord,
}

impl Bridge {
  /// One-time setup: installs signal handlers, binds the listener with
  /// bounded retry, loads the output-port registry, waits out the settle
  /// delay and records the process identity. Any failure here is fatal.
  pub fn initialize(config: BridgeConfig) -> Result<Self, BridgeError> {
    Self::initialize_with_scanner(config, &ProcfsScanner)
  }

  /// As [`Bridge::initialize`], with an explicit process-table seam.
  pub fn initialize_with_scanner(
    config: BridgeConfig,
    scanner: &dyn ProcessScanner,
  ) -> Result<Self, BridgeError> {
    let token = lifecycle::install_signal_handlers()?;
    let session = Session::bind(&config)?;
    let registry = PortRegistry::load(&config.descriptor_path)?;

    // Give the peer process time to appear in the process table before
    // looking it up.
    if !config.settle_delay.is_zero() {
      thread::sleep(config.settle_delay);
    }
    let record = process::create_pid_record(&config, scanner)?;

    Ok(Self {
      registry,
      store: PortStore::new(),
      session,
      token,
      phase: EventPhase::Idle,
      record,
    })
  }

  /// Blocks until one event's inbound message is received and decoded, or a
  /// termination trigger fires.
  ///
  /// Accept and receive failures are fatal; an interrupted call re-checks
  /// the shutdown token and either resumes waiting or terminates cleanly.
  pub fn listen(&mut self) -> Result<EventOutcome, BridgeError> {
    if self.phase == EventPhase::Received {
      return Err(BridgeError::InvalidState("listen called again before send"));
    }
    if self.session.state() == SessionState::Closed {
      return Err(BridgeError::InvalidState("listen on a closed link"));
    }
    if self.token.triggered() {
      return Ok(self.finish(self.token.reason()));
    }

    let peer_fd = loop {
      match self.session.accept() {
        Ok(fd) => break fd,
        Err(BridgeError::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {
          if self.token.triggered() {
            return Ok(self.finish(self.token.reason()));
          }
        }
        Err(e) => return Err(self.fatal(e)),
      }
    };

    let payload = loop {
      match self.session.receive() {
        Ok(payload) => break payload,
        Err(BridgeError::Io(ref e)) if e.kind() == io::ErrorKind::Interrupted => {
          if self.token.triggered() {
            return Ok(self.finish(self.token.reason()));
          }
        }
        Err(e) => return Err(self.fatal(e)),
      }
    };

    if codec::is_end(&payload) {
      tracing::info!(peer = peer_fd, "close request received");
      return Ok(self.finish(ShutdownReason::EndOfSession));
    }

    let text = String::from_utf8_lossy(&payload);
    let pairs = codec::decode_event(&text);
    tracing::debug!(peer = peer_fd, entries = pairs.len(), "decoded event message");
    for (name, value) in pairs {
      self.store.set(&name, &value);
    }
    self.store.record_peer_socket(peer_fd);
    self.store.trace_contents();

    self.phase = EventPhase::Received;
    Ok(EventOutcome::Received)
  }

  /// Host pushes a value into the store. Allowed at any phase.
  pub fn set_port_value(&mut self, name: &str, value: &str) {
    self.store.set(name, value);
  }

  /// Host drains a value from the store. Allowed at any phase.
  pub fn get_port_value(&mut self, name: &str) -> Option<String> {
    self.store.take(name)
  }

  /// Encodes the registry-ordered snapshot and transmits it to the current
  /// peer, then retires the stale previous peer socket.
  ///
  /// A registered port missing from the store abandons this send (nothing
  /// is written, nothing retired) without terminating the daemon. Transport
  /// failures are fatal.
  pub fn send(&mut self) -> Result<(), BridgeError> {
    if self.phase != EventPhase::Received {
      return Err(BridgeError::InvalidState("send before listen"));
    }
    // The event is over after this call either way; an abandoned send is
    // not retried.
    self.phase = EventPhase::Idle;

    let payload = match codec::encode_event(&self.registry, &self.store) {
      Ok(payload) => payload,
      Err(e) => {
        debug_assert!(!e.is_fatal());
        tracing::error!(error = %e, "abandoning send for this event");
        return Err(e);
      }
    };

    match self.session.reply(&payload) {
      Ok(()) => Ok(()),
      Err(e) => Err(self.fatal(e)),
    }
  }

  /// Explicit termination entry point for the host. Closes every socket and
  /// reports the process exit code. Idempotent.
  pub fn shutdown(&mut self, reason: ShutdownReason) -> i32 {
    self.finish(reason);
    reason.exit_code()
  }

  /// Token shared with the signal handlers, also usable for programmatic
  /// cancellation.
  pub fn shutdown_token(&self) -> ShutdownToken {
    self.token
  }

  pub fn registry(&self) -> &PortRegistry {
    &self.registry
  }

  /// Identity recorded in the instance marker file.
  pub fn pid_record(&self) -> &PidRecord {
    &self.record
  }

  // All termination triggers converge here.
  fn finish(&mut self, reason: ShutdownReason) -> EventOutcome {
    if self.session.state() != SessionState::Closed {
      self.session.close();
      tracing::info!(?reason, exit_code = reason.exit_code(), "co-simulation link closed");
    }
    EventOutcome::Shutdown(reason)
  }

  fn fatal(&mut self, e: BridgeError) -> BridgeError {
    tracing::error!(error = %e, "fatal session failure, closing link");
    self.session.close();
    e
  }
}
