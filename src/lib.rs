// PP1-MONITOR: live register monitor for the PP-1 serial link

pub mod config;
pub mod memview;
pub mod protocol;
pub mod serial;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use memview::{MemoryView, Snapshot};
pub use protocol::{decode_line, Address, Bank, Frame, FrameError, RegisterKey, RegisterValue};
pub use serial::{
    LineTransport, PollError, PollStats, PollerConfig, PollerHandle, SerialConfig, SerialError,
    SerialPoller, SerialPort,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialise tracing for the command-line tools
///
/// Honours `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt::format::FmtSpan, prelude::*, EnvFilter};

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let format_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(format_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
