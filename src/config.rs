// src/config.rs

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Tunables for one daemon instance.
///
/// The host supplies the session port and bind address; everything else has a
/// production default and exists mainly so tests can shrink timings and point
/// file artifacts at scratch directories.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
  /// TCP port the peer simulator connects to.
  pub port: u16,
  /// Local address to bind. Traffic never traverses a gateway; the listener
  /// is additionally marked SO_DONTROUTE.
  pub bind_addr: IpAddr,
  /// Listen backlog.
  pub backlog: i32,
  /// Bind attempts before giving up. A just-exited prior instance can hold
  /// the port in TIME_WAIT briefly.
  pub bind_retries: u32,
  /// Pause between bind attempts.
  pub bind_backoff: Duration,
  /// Line-oriented descriptor declaring which ports are outputs.
  pub descriptor_path: PathBuf,
  /// Directory for the per-instance marker file.
  pub marker_dir: PathBuf,
  /// Command name of the peer analog-simulator process.
  pub peer_process_name: String,
  /// Name recorded in the marker file path. Defaults to the current
  /// executable's file name.
  pub program_name: Option<String>,
  /// Delay between loading the registry and recording the process identity,
  /// giving the peer process time to show up in the process table.
  pub settle_delay: Duration,
}

impl BridgeConfig {
  pub fn new(port: u16, bind_addr: IpAddr) -> Self {
    Self {
      port,
      bind_addr,
      ..Self::default()
    }
  }

  /// The full listen address.
  pub fn socket_addr(&self) -> SocketAddr {
    SocketAddr::new(self.bind_addr, self.port)
  }

  /// Endpoint string used in logs and error messages.
  pub fn endpoint(&self) -> String {
    format!("tcp://{}:{}", self.bind_addr, self.port)
  }
}

impl Default for BridgeConfig {
  fn default() -> Self {
    Self {
      port: 0,
      bind_addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
      backlog: 5,
      bind_retries: 100,
      bind_backoff: Duration::from_millis(1),
      descriptor_path: PathBuf::from("connection_info.txt"),
      marker_dir: PathBuf::from("/tmp"),
      peer_process_name: "ngspice".to_string(),
      program_name: None,
      settle_delay: Duration::from_secs(2),
    }
  }
}
