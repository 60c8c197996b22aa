// tests/common/mod.rs

#![allow(dead_code)]

use nglink::{Bridge, BridgeConfig, ProcessScanner};
use std::net::{IpAddr, Ipv4Addr, TcpListener};
use std::sync::Once;
use std::time::Duration;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Opt-in logging for test debugging: RUST_LOG=nglink=trace.
pub fn init_tracing() {
  TRACING.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .try_init();
  });
}

/// Process-table stub so tests never depend on a real analog simulator.
pub struct StubScanner(pub Option<u32>);

impl ProcessScanner for StubScanner {
  fn find_by_name(&self, _name: &str) -> Option<u32> {
    self.0
  }
}

pub const STUB_PEER_PID: u32 = 4242;

/// Picks a port the OS considers free right now.
pub fn free_port() -> u16 {
  let probe = TcpListener::bind("127.0.0.1:0").unwrap();
  probe.local_addr().unwrap().port()
}

/// A config pointing every file artifact at the scratch directory, with
/// test-friendly timings.
pub fn test_config(dir: &TempDir, port: u16, descriptor: &str) -> BridgeConfig {
  let descriptor_path = dir.path().join("connection_info.txt");
  std::fs::write(&descriptor_path, descriptor).unwrap();

  let mut config = BridgeConfig::new(port, IpAddr::V4(Ipv4Addr::LOCALHOST));
  config.descriptor_path = descriptor_path;
  config.marker_dir = dir.path().to_path_buf();
  config.program_name = Some("testbench".to_string());
  config.settle_delay = Duration::ZERO;
  config.bind_backoff = Duration::from_millis(5);
  config
}

pub fn initialize(config: BridgeConfig) -> Bridge {
  Bridge::initialize_with_scanner(config, &StubScanner(Some(STUB_PEER_PID))).unwrap()
}
