// src/protocol/mod.rs

//! Wire-format constants and the per-event message codec.

pub mod codec;

use static_assertions::const_assert;

/// Upper bound on one inbound read. One read corresponds to exactly one
/// simulated event; there is no partial-message reassembly.
pub const MAX_MESSAGE_SIZE: usize = 4096;

/// Names and values are clamped to this many bytes when stored.
pub const MAX_TOKEN_LEN: usize = 64;

/// Separates entries of an inbound message.
pub const ENTRY_DELIMITER: char = ',';
/// Separates name from value inside one entry.
pub const PAIR_DELIMITER: char = ':';
/// Terminates each `name:value` field of an outbound message.
pub const FIELD_TERMINATOR: char = ';';

/// A payload consisting of exactly this token requests session termination.
pub const END_TOKEN: &[u8] = b"END";

/// Store key for the synthetic entry recording which socket produced the
/// most recent inbound message. Distinct from any signal name.
pub const PEER_SOCKET_KEY: &str = "sock_id";

// A single clamped name:value pair must always fit in one message.
const_assert!(2 * MAX_TOKEN_LEN + 2 <= MAX_MESSAGE_SIZE);
