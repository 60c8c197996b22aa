// src/lifecycle/process.rs

//! Process identity recording.
//!
//! The daemon appends its own PID to a marker file named after the peer
//! simulator's PID, the program name and the session port, so an outer
//! cleanup pass can find and kill stale instances. The file is append-only
//! here; removal belongs to that outer pass.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// Marker file name prefix shared with the outer cleanup tooling.
const MARKER_PREFIX: &str = "NGHDL";

/// Narrow seam over the platform process table, mockable in tests.
pub trait ProcessScanner {
  /// PID of a running process whose command name matches exactly, if any.
  fn find_by_name(&self, name: &str) -> Option<u32>;
}

/// Scans `/proc/<pid>/comm` entries.
#[derive(Debug, Default)]
pub struct ProcfsScanner;

impl ProcessScanner for ProcfsScanner {
  fn find_by_name(&self, name: &str) -> Option<u32> {
    let mut found = None;
    let entries = match fs::read_dir("/proc") {
      Ok(entries) => entries,
      Err(e) => {
        tracing::error!(error = %e, "cannot read /proc");
        return None;
      }
    };
    for entry in entries.flatten() {
      let file_name = entry.file_name();
      let Some(pid) = file_name.to_str().and_then(|s| s.parse::<u32>().ok()) else {
        continue;
      };
      let comm_path = entry.path().join("comm");
      if let Ok(comm) = fs::read_to_string(&comm_path) {
        if comm.trim_end() == name {
          // Keep scanning; the last match wins, as the historical
          // implementation did.
          found = Some(pid);
        }
      }
    }
    found
  }
}

/// The daemon's own identity together with the peer it is serving.
#[derive(Debug, Clone)]
pub struct PidRecord {
  pub own_pid: u32,
  pub peer_pid: u32,
  pub path: PathBuf,
}

/// Locates the peer process and appends this instance's PID to the marker
/// file. Both a missing peer and an unwritable file are fatal at startup.
pub(crate) fn create_pid_record(
  config: &BridgeConfig,
  scanner: &dyn ProcessScanner,
) -> Result<PidRecord, BridgeError> {
  let peer_pid = scanner
    .find_by_name(&config.peer_process_name)
    .ok_or_else(|| BridgeError::PeerNotFound(config.peer_process_name.clone()))?;

  let program_name = config.program_name.clone().unwrap_or_else(|| {
    std::env::current_exe()
      .ok()
      .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
      .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string())
  });

  let own_pid = std::process::id();
  let path = config
    .marker_dir
    .join(format!("{MARKER_PREFIX}_{peer_pid}_{program_name}_{}", config.port));

  // Append mode: multiple instances of one test bench share the file.
  let mut file = OpenOptions::new()
    .create(true)
    .append(true)
    .open(&path)
    .map_err(|source| BridgeError::MarkerFile {
      path: path.clone(),
      source,
    })?;
  writeln!(file, "{own_pid}").map_err(|source| BridgeError::MarkerFile {
    path: path.clone(),
    source,
  })?;

  tracing::info!(path = %path.display(), own_pid, peer_pid, "recorded process identity");
  Ok(PidRecord {
    own_pid,
    peer_pid,
    path,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::net::{IpAddr, Ipv4Addr};
  use tempfile::tempdir;

  struct StubScanner(Option<u32>);

  impl ProcessScanner for StubScanner {
    fn find_by_name(&self, _name: &str) -> Option<u32> {
      self.0
    }
  }

  fn config(dir: &std::path::Path) -> BridgeConfig {
    let mut config = BridgeConfig::new(5004, IpAddr::V4(Ipv4Addr::LOCALHOST));
    config.marker_dir = dir.to_path_buf();
    config.program_name = Some("testbench".to_string());
    config
  }

  #[test]
  fn appends_own_pid_per_instance() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());

    let first = create_pid_record(&config, &StubScanner(Some(4242))).unwrap();
    let second = create_pid_record(&config, &StubScanner(Some(4242))).unwrap();
    assert_eq!(first.path, second.path);
    assert!(first.path.ends_with("NGHDL_4242_testbench_5004"));

    let contents = fs::read_to_string(&first.path).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| *l == std::process::id().to_string()));
  }

  #[test]
  fn missing_peer_is_fatal() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let err = create_pid_record(&config, &StubScanner(None)).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, BridgeError::PeerNotFound(name) if name == "ngspice"));
  }

  #[test]
  fn procfs_scanner_misses_unknown_names() {
    assert_eq!(ProcfsScanner.find_by_name("no-such-process-name"), None);
  }
}
