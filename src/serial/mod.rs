// Serial transport and the poller that drives frame decoding
pub mod comm;
pub mod poller;
pub mod transport;

#[cfg(test)]
pub mod mock;

pub use comm::{list_ports, SerialConfig, SerialError, SerialPort};
pub use poller::{CancelToken, PollError, PollStats, PollerConfig, PollerHandle, SerialPoller};
pub use transport::LineTransport;
