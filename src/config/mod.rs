//! Bridge configuration.
//!
//! [`BridgeOptions`] is the single configuration surface: the transport
//! variant, the server endpoint, the reconnect policy and the list of
//! forwarded event names. [`BridgeOptions::from_env`] builds it from the
//! process environment.

// ============================================================================
// Submodules
// ============================================================================

/// Loading from environment variables.
pub mod env;

/// Option types.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{BridgeOptions, ChannelOptions, TransportVariant};
