// tests/lifecycle.rs

//! Startup and termination behavior: bind retry, configuration failures,
//! marker files, idempotent shutdown.

use nglink::{Bridge, BridgeError, ShutdownReason};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

mod common;

#[test]
fn bind_retries_until_the_port_frees_up() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let port = common::free_port();

  // Hold the port without SO_REUSEPORT so the daemon's attempts fail.
  let blocker = TcpListener::bind(("127.0.0.1", port)).unwrap();

  let config = common::test_config(&dir, port, "x OUT 1\n");
  let startup = thread::spawn(move || {
    Bridge::initialize_with_scanner(config, &common::StubScanner(Some(common::STUB_PEER_PID)))
  });

  thread::sleep(Duration::from_millis(50));
  drop(blocker);

  let bridge = startup.join().unwrap().expect("bind should succeed within the retry bound");
  drop(bridge);
}

#[test]
fn bind_exhaustion_is_fatal() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let port = common::free_port();
  let _blocker = TcpListener::bind(("127.0.0.1", port)).unwrap();

  let mut config = common::test_config(&dir, port, "x OUT 1\n");
  config.bind_retries = 3;
  config.bind_backoff = Duration::from_millis(1);

  let err = Bridge::initialize_with_scanner(config, &common::StubScanner(Some(common::STUB_PEER_PID)))
    .unwrap_err();
  assert!(err.is_fatal());
  assert!(matches!(err, BridgeError::BindExhausted { attempts: 3, .. }));
}

#[test]
fn missing_descriptor_is_fatal_at_startup() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let mut config = common::test_config(&dir, common::free_port(), "x OUT 1\n");
  config.descriptor_path = dir.path().join("does_not_exist.txt");

  let err = Bridge::initialize_with_scanner(config, &common::StubScanner(Some(common::STUB_PEER_PID)))
    .unwrap_err();
  assert!(err.is_fatal());
  assert!(matches!(err, BridgeError::Descriptor { .. }));
}

#[test]
fn missing_peer_process_is_fatal_at_startup() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let config = common::test_config(&dir, common::free_port(), "x OUT 1\n");

  let err = Bridge::initialize_with_scanner(config, &common::StubScanner(None)).unwrap_err();
  assert!(err.is_fatal());
  assert!(matches!(err, BridgeError::PeerNotFound(_)));
}

#[test]
fn marker_file_records_this_instance() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let port = common::free_port();
  let bridge = common::initialize(common::test_config(&dir, port, "x OUT 1\n"));

  let record = bridge.pid_record();
  assert_eq!(record.peer_pid, common::STUB_PEER_PID);
  assert_eq!(record.own_pid, std::process::id());
  assert_eq!(
    record.path,
    dir
      .path()
      .join(format!("NGHDL_{}_testbench_{port}", common::STUB_PEER_PID))
  );

  let contents = std::fs::read_to_string(&record.path).unwrap();
  assert_eq!(contents.trim(), std::process::id().to_string());
}

#[test]
fn shutdown_is_idempotent() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let mut bridge = common::initialize(common::test_config(&dir, common::free_port(), "x OUT 1\n"));

  assert_eq!(bridge.shutdown(ShutdownReason::EndOfSession), 0);
  assert_eq!(bridge.shutdown(ShutdownReason::EndOfSession), 0);
  assert!(matches!(bridge.listen().unwrap_err(), BridgeError::InvalidState(_)));
  assert_eq!(bridge.shutdown(ShutdownReason::Fatal), 1);
}
