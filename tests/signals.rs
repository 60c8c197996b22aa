// tests/signals.rs

//! Signal-driven termination. Kept as a lone test in its own binary: the
//! signal latch is process-wide, so raising a signal here must not share a
//! process with tests that expect a quiet latch.

use nglink::{BridgeError, EventOutcome, ShutdownReason};
use nix::sys::signal::{raise, Signal};
use tempfile::tempdir;

mod common;

#[test]
fn user_signal_terminates_cleanly() {
  common::init_tracing();
  let dir = tempdir().unwrap();
  let mut bridge = common::initialize(common::test_config(&dir, common::free_port(), "x OUT 1\n"));

  // The handler only latches the signal; the daemon notices at its next
  // blocking boundary instead of being torn out of an arbitrary frame.
  raise(Signal::SIGUSR1).unwrap();
  let outcome = bridge.listen().unwrap();

  let EventOutcome::Shutdown(reason) = outcome else {
    panic!("expected shutdown, got {outcome:?}");
  };
  assert_eq!(reason, ShutdownReason::Signal(Signal::SIGUSR1 as i32));
  assert_eq!(reason.exit_code(), 0);

  // The latch stays tripped for the rest of the process; any further event
  // loop sees it immediately.
  assert!(bridge.shutdown_token().triggered());
  assert!(matches!(bridge.listen().unwrap_err(), BridgeError::InvalidState(_)));
}
