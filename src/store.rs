// src/store.rs

use crate::protocol::codec::clamp_token;
use crate::protocol::PEER_SOCKET_KEY;
use std::collections::HashMap;
use std::os::fd::RawFd;

/// Associative map from port name to current string value.
///
/// Bridges one call-in from the digital simulator to the next: inbound
/// decoding and direct set calls write it, the encode path reads it, and the
/// host's get call drains it. Entries that nobody drains persist across
/// events; the store is never cleared between events.
#[derive(Debug, Default)]
pub struct PortStore {
  entries: HashMap<String, String>,
}

impl PortStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Unconditional upsert. Name and value are clamped to the token limit.
  pub fn set(&mut self, name: &str, value: &str) {
    self
      .entries
      .insert(clamp_token(name).to_string(), clamp_token(value).to_string());
  }

  /// Draining read: returns the value and removes the entry.
  pub fn take(&mut self, name: &str) -> Option<String> {
    self.entries.remove(name)
  }

  /// Non-draining read, used by the outbound encode path.
  pub fn peek(&self, name: &str) -> Option<&str> {
    self.entries.get(name).map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Records which socket produced the most recent inbound message, under a
  /// key distinct from any signal name.
  pub(crate) fn record_peer_socket(&mut self, fd: RawFd) {
    self.set(PEER_SOCKET_KEY, &fd.to_string());
  }

  /// Dumps the full table at trace level.
  pub fn trace_contents(&self) {
    for (name, value) in &self.entries {
      tracing::trace!(name = %name, value = %value, "store entry");
    }
  }
}
