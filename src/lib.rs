// src/lib.rs

//! nglink - an event-synchronized co-simulation link.
//!
//! A digital HDL testbench and an external analog simulator process share a
//! set of named signals ("ports"). This crate is the daemon living inside
//! the digital side: once per simulated event the host runtime calls in to
//! receive the peer's signal updates, exposes them through a transient
//! key/value store, and transmits the registered output ports back over a
//! point-to-point TCP session. The daemon owns no simulation semantics,
//! only the transport and the inter-event value bookkeeping.

/// The daemon-instance object and the host-facing entry points.
pub mod bridge;
/// Per-instance tunables.
pub mod config;
/// Defines the error type used throughout the crate.
pub mod error;
/// Termination triggers, signal latching and process identity recording.
pub mod lifecycle;
/// Wire-format constants and the pure per-event message codec.
pub mod protocol;
/// The ordered output-port name registry.
pub mod registry;
/// Listening socket ownership and the per-event accept cycle.
pub mod session;
/// The port value store bridging one call-in to the next.
pub mod store;
/// Blocking TCP plumbing.
pub mod transport;

pub use bridge::{Bridge, EventOutcome};
pub use config::BridgeConfig;
pub use error::BridgeError;
pub use lifecycle::process::{PidRecord, ProcessScanner, ProcfsScanner};
pub use lifecycle::{ShutdownReason, ShutdownToken};
pub use registry::PortRegistry;
pub use store::PortStore;
