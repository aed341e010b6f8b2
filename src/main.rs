//! `packet-bridge` binary.
//!
//! Reads packets from stdin, emits them on the Socket.IO channel, and
//! writes forwarded server events to stdout. Logs go to stderr only.
//!
//! The process keeps delivering events after stdin ends, until the channel
//! closes or Ctrl+C arrives.

// ============================================================================
// Imports
// ============================================================================

use packet_bridge::{Bridge, BridgeOptions, Connection, OutboundSink, Result};
use tokio::io::{BufReader, stdin, stdout};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "packet_bridge=warn";

/// Filter used when `RUST_LOG` is unset and `LOG` is set.
const PACKET_LOG_FILTER: &str = "packet_bridge=debug";

// ============================================================================
// Main
// ============================================================================

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let options = BridgeOptions::from_env();
    init_logging(options.log_packets);

    debug!(?options, "Configuration loaded");

    let connection = Connection::open(options.channel.clone())?;
    let (sink, writer) = OutboundSink::spawn(stdout());

    let bridge = Bridge::new(connection.clone(), &options);
    bridge.subscribe_outbound(&sink);
    drop(sink);

    let termination = bridge.run_inbound(BufReader::new(stdin())).await;
    debug!(?termination, "Stopped reading stdin");

    tokio::select! {
        () = connection.closed() => debug!("Channel closed"),
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl+C");
            }
            info!("Interrupted");
        }
    }

    connection.shutdown();
    connection.closed().await;
    drop(bridge);
    drop(connection);

    match writer.await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, "Writer task failed");
            Ok(())
        }
    }
}

/// Initializes tracing on stderr; stdout carries the line protocol.
fn init_logging(log_packets: bool) {
    let fallback = if log_packets {
        PACKET_LOG_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
