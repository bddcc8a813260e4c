//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! the application's job. [`init_tracing`] is the batteries-included version
//! for binaries and examples.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a global `fmt` subscriber filtered by `RUST_LOG`.
///
/// Defaults to `info` for this crate and `warn` elsewhere when `RUST_LOG` is
/// unset. Calling it twice is a no-op; the second install attempt is ignored.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,stateloom=info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE),
        )
        .try_init();
}
