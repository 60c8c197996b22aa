// src/protocol/codec.rs

//! Pure encode/decode of the per-event message format. No I/O here.
//!
//! Inbound grammar is two-level: entries separated by `,`, name and value
//! within an entry separated by `:`. Only the first name/value pair of each
//! entry is honored; anything after the second `:` is discarded. That
//! mirrors the established on-wire contract with existing analog-side
//! drivers and must not be "fixed" into a full key/value parse. There is no
//! escaping of delimiter characters.

use crate::error::BridgeError;
use crate::protocol::{
  END_TOKEN, ENTRY_DELIMITER, FIELD_TERMINATOR, MAX_TOKEN_LEN, PAIR_DELIMITER,
};
use crate::registry::PortRegistry;
use crate::store::PortStore;
use bytes::{BufMut, BytesMut};

/// True when the payload is the literal session-termination token.
pub fn is_end(payload: &[u8]) -> bool {
  payload == END_TOKEN
}

/// Splits one inbound event message into name/value pairs.
///
/// Empty entries (stray delimiters) and entries with an empty name are
/// skipped. An entry with no value delimiter yields an empty value.
pub fn decode_event(payload: &str) -> Vec<(String, String)> {
  let mut pairs = Vec::new();
  for entry in payload.split(ENTRY_DELIMITER) {
    if entry.is_empty() {
      continue;
    }
    // Only the first pair per entry is taken; the third split piece (if
    // any) swallows the remainder of the entry and is dropped.
    let mut pieces = entry.splitn(3, PAIR_DELIMITER);
    let name = pieces.next().unwrap_or_default();
    if name.is_empty() {
      tracing::trace!(entry, "skipping entry with empty name");
      continue;
    }
    let value = pieces.next().unwrap_or_default();
    pairs.push((name.to_string(), value.to_string()));
  }
  pairs
}

/// Encodes the registry-ordered snapshot of the store as `name:value;`
/// repeated once per registered output port.
///
/// A registered name missing from the store is a protocol/state error: the
/// encode fails and nothing may be transmitted for this event. An empty
/// registry encodes to an empty payload.
pub fn encode_event(registry: &PortRegistry, store: &PortStore) -> Result<BytesMut, BridgeError> {
  let mut out = BytesMut::with_capacity(registry.len() * (2 * MAX_TOKEN_LEN + 2));
  for name in registry.names() {
    let value = store
      .peek(name)
      .ok_or_else(|| BridgeError::PortUnavailable(name.clone()))?;
    out.put_slice(name.as_bytes());
    out.put_u8(PAIR_DELIMITER as u8);
    out.put_slice(value.as_bytes());
    out.put_u8(FIELD_TERMINATOR as u8);
  }
  Ok(out)
}

/// Clamps a token to [`MAX_TOKEN_LEN`] bytes, backing off to a character
/// boundary if the cut would split a code point.
pub(crate) fn clamp_token(token: &str) -> &str {
  if token.len() <= MAX_TOKEN_LEN {
    return token;
  }
  let mut end = MAX_TOKEN_LEN;
  while !token.is_char_boundary(end) {
    end -= 1;
  }
  &token[..end]
}
