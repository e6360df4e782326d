//! Tracing setup for hosts of this crate.
//!
//! The crate itself only emits `tracing` events; embedding applications that
//! already configure a subscriber should keep doing so. [`setup_tracing`] is
//! a convenience for drivers and tests that want sensible console output
//! without ceremony.
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RUST_LOG` | Console log filter (e.g., `info`, `ponzu=debug`) | `info` |

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Initializes the tracing subscriber with console output.
///
/// Filtering follows the `RUST_LOG` environment variable, defaulting to
/// `info`. Output is plain text without ANSI colors, suitable for log
/// aggregation.
///
/// # Panics
///
/// Panics if called more than once (a tracing subscriber can only be set
/// once per process).
pub fn setup_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_filter(filter);

    Registry::default().with(console_layer).init();

    tracing::info!("Tracing initialized successfully [reporting to console only]");
}
