//! Configuration types for the outpost SDK.
//!
//! Provides runtime environment detection plus the shared, serde-backed
//! configuration structs consumed by the dispatch executor and the client.

mod environment;
pub mod shared;

pub use environment::*;
