//! Configuration from the process environment.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `SERVER` | Server URL; empty or unset falls back to the variant default |
//! | `MODERN` | Any non-empty value selects [`TransportVariant::Modern`] |
//! | `LOG` | Any non-empty value logs every packet crossing the bridge |

// ============================================================================
// Imports
// ============================================================================

use super::options::{BridgeOptions, TransportVariant};

// ============================================================================
// Constants
// ============================================================================

/// Server URL variable.
pub const SERVER_VAR: &str = "SERVER";

/// Variant selector variable.
pub const MODERN_VAR: &str = "MODERN";

/// Packet logging variable.
pub const LOG_VAR: &str = "LOG";

// ============================================================================
// Loading
// ============================================================================

impl BridgeOptions {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let is_set = |name: &str| lookup(name).is_some_and(|value| !value.is_empty());

        let variant = if is_set(MODERN_VAR) {
            TransportVariant::Modern
        } else {
            TransportVariant::Legacy
        };

        let mut options = Self::new(variant).with_packet_logging(is_set(LOG_VAR));

        if let Some(server) = lookup(SERVER_VAR).filter(|server| !server.is_empty()) {
            options = options.with_server(server);
        }

        options
    }
}

// ============================================================================
// Tests
// ============================================================================
