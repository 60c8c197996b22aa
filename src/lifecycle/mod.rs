// src/lifecycle/mod.rs

//! Termination handling.
//!
//! Three triggers converge on the same shutdown action: the in-band `END`
//! message, an operating-system signal, and any fatal I/O error. Signals do
//! not alter control flow asynchronously; the handler only latches a flag,
//! and the daemon consults it at its blocking boundaries.

pub mod process;

use crate::error::BridgeError;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

/// Why the daemon is going down. Everything except `Fatal` is a clean exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
  /// The peer sent the literal `END` payload.
  EndOfSession,
  /// An interrupt, termination or user-defined signal arrived.
  Signal(i32),
  /// The host cancelled the session through the shutdown token.
  Cancelled,
  /// A fatal I/O or environment error already reported elsewhere.
  Fatal,
}

impl ShutdownReason {
  pub fn exit_code(&self) -> i32 {
    match self {
      ShutdownReason::Fatal => 1,
      _ => 0,
    }
  }
}

// One daemon instance per process, so one latch per process. The handler
// must be async-signal-safe, which rules out anything but atomics here.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);
static SHUTDOWN_SIGNAL: AtomicI32 = AtomicI32::new(0);

extern "C" fn latch_signal(signum: libc::c_int) {
  SHUTDOWN_SIGNAL.store(signum, Ordering::SeqCst);
  SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
}

/// Handle for observing and requesting termination.
///
/// Checked before each blocking accept and after an interrupted socket call.
#[derive(Debug, Clone, Copy)]
pub struct ShutdownToken;

impl ShutdownToken {
  pub fn triggered(&self) -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
  }

  /// The signal that tripped the latch, if one did.
  pub fn triggered_signal(&self) -> Option<i32> {
    match SHUTDOWN_SIGNAL.load(Ordering::SeqCst) {
      0 => None,
      signum => Some(signum),
    }
  }

  /// Programmatic cancellation, equivalent to a termination signal but
  /// without one.
  pub fn request(&self) {
    SHUTDOWN_REQUESTED.store(true, Ordering::SeqCst);
  }

  /// The reason implied by the current latch state.
  pub(crate) fn reason(&self) -> ShutdownReason {
    match self.triggered_signal() {
      Some(signum) => ShutdownReason::Signal(signum),
      None => ShutdownReason::Cancelled,
    }
  }
}

/// Installs handlers for the interrupt, termination and user-defined
/// signals. SA_RESTART is deliberately left off so a blocked accept or read
/// returns EINTR and the latch gets consulted.
pub(crate) fn install_signal_handlers() -> Result<ShutdownToken, BridgeError> {
  use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

  let action = SigAction::new(
    SigHandler::Handler(latch_signal),
    SaFlags::empty(),
    SigSet::empty(),
  );
  for signal_kind in [Signal::SIGINT, Signal::SIGTERM, Signal::SIGUSR1] {
    unsafe { signal::sigaction(signal_kind, &action) }
      .map_err(|errno| BridgeError::Io(io::Error::from(errno)))?;
  }
  tracing::debug!("signal handlers installed");
  Ok(ShutdownToken)
}
