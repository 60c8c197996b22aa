// src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the co-simulation link.
///
/// Most variants are fatal for the daemon: the per-event protocol has no
/// notion of resuming a half-completed exchange, so accept/receive/send
/// failures terminate the process (exit code 1) after logging. The two
/// non-fatal variants are [`BridgeError::PortUnavailable`], which abandons a
/// single send, and [`BridgeError::InvalidState`], which rejects an
/// out-of-order entry-point call.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
  // --- I/O Errors ---
  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  // --- Connection/Binding Errors ---
  #[error("Address already in use: {0}")]
  AddrInUse(String),
  #[error("Address not available: {0}")]
  AddrNotAvailable(String),
  #[error("Permission denied for endpoint: {0}")]
  PermissionDenied(String),
  #[error("Connection closed by peer")]
  ConnectionClosed,
  #[error("Could not bind {endpoint} after {attempts} attempts")]
  BindExhausted { endpoint: String, attempts: u32 },

  // --- Configuration/Environment Errors ---
  #[error("Port descriptor file {path:?} unavailable: {source}")]
  Descriptor {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("No running process named {0:?} found")]
  PeerNotFound(String),
  #[error("Instance marker file {path:?} unwritable: {source}")]
  MarkerFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  // --- Protocol/State Errors ---
  #[error("Registered output port {0:?} has no value at send time")]
  PortUnavailable(String),
  #[error("Entry point called in the wrong order: {0}")]
  InvalidState(&'static str),
}

impl BridgeError {
  /// Maps common `std::io::Error` kinds for an endpoint operation.
  pub fn from_io_endpoint(e: io::Error, endpoint: &str) -> Self {
    match e.kind() {
      io::ErrorKind::AddrInUse => BridgeError::AddrInUse(endpoint.to_string()),
      io::ErrorKind::AddrNotAvailable => BridgeError::AddrNotAvailable(endpoint.to_string()),
      io::ErrorKind::PermissionDenied => BridgeError::PermissionDenied(endpoint.to_string()),
      io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => BridgeError::ConnectionClosed,
      _ => BridgeError::Io(e),
    }
  }

  /// Whether this error must bring the daemon down.
  ///
  /// Fatal conditions map to exit code 1. Non-fatal conditions abandon the
  /// specific operation and leave the daemon serviceable.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, BridgeError::PortUnavailable(_) | BridgeError::InvalidState(_))
  }
}
