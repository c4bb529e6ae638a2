//! Telemetry bootstrap for the outpost SDK.
//!
//! Installs the global `tracing` subscriber used by binaries and tests. The
//! SDK itself only emits `tracing` events; wiring them to an output is the
//! embedding application's choice, and this crate provides the default one.

pub mod tracing;
