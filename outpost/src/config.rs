//! Configuration objects for the SDK.
//!
//! Re-exports the shared configuration types required for client and
//! executor setup.

// Re-exports.
pub use outpost_config::shared::*;
