//! Resolution of the configured server into a websocket URL.
//!
//! ```text
//! SERVER=http://localhost:3000        (legacy)
//!   → ws://localhost:3000/socket.io/?EIO=3&transport=websocket, namespace "/"
//!
//! SERVER=https://example.com/game     (modern)
//!   → wss://example.com:443/socket.io/?EIO=4&transport=websocket, namespace "/game"
//! ```

// ============================================================================
// Imports
// ============================================================================

use url::Url;

use crate::config::options::{ENGINE_PATH, MODERN_PORT};
use crate::config::{ChannelOptions, TransportVariant};
use crate::error::{Error, Result};
use crate::protocol::ROOT_NAMESPACE;

// ============================================================================
// Endpoint
// ============================================================================

/// Where and how to dial the Socket.IO server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Websocket URL including the Engine.IO query.
    url: Url,
    /// Socket.IO namespace taken from the server URL path.
    namespace: String,
}

impl Endpoint {
    /// Resolves the endpoint for the configured server and variant.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the server is not a valid URL
    /// - [`Error::Config`] if the URL cannot carry a websocket scheme
    pub fn resolve(options: &ChannelOptions) -> Result<Self> {
        Self::from_server(&options.server, options.variant)
    }

    /// Resolves `server` for `variant`.
    ///
    /// # Errors
    ///
    /// See [`Endpoint::resolve`].
    pub fn from_server(server: &str, variant: TransportVariant) -> Result<Self> {
        let mut url = Url::parse(&with_scheme(server))?;

        let secure = variant.forces_secure() || matches!(url.scheme(), "https" | "wss");
        let scheme = if secure { "wss" } else { "ws" };
        if url.set_scheme(scheme).is_err() {
            return Err(Error::config(format!("cannot use {scheme} for {server}")));
        }

        if variant.forces_secure() {
            url.set_port(Some(MODERN_PORT))
                .map_err(|()| Error::config(format!("cannot set port for {server}")))?;
        }

        let namespace = match url.path().trim_end_matches('/') {
            "" => ROOT_NAMESPACE.to_string(),
            path => path.to_string(),
        };
        url.set_path(ENGINE_PATH);

        url.query_pairs_mut()
            .append_pair("EIO", &variant.engine_protocol().to_string())
            .append_pair("transport", "websocket");
        url.set_fragment(None);

        Ok(Self { url, namespace })
    }

    /// Returns the websocket URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the Socket.IO namespace.
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Prefixes `https://` when the server has no recognised scheme.
fn with_scheme(server: &str) -> String {
    const SCHEMES: [&str; 4] = ["http://", "https://", "ws://", "wss://"];

    let has_scheme = SCHEMES.iter().any(|scheme| {
        server
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });

    if has_scheme {
        server.to_string()
    } else {
        format!("https://{server}")
    }
}

// ============================================================================
// Tests
// ============================================================================
