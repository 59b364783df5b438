// Serial port abstraction with async support
// Wraps the serialport crate with tokio timeouts and line buffering

use super::transport::take_line;
use std::io::{self, Read};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Size of a single read from the port while assembling a line
const READ_CHUNK: usize = 64;

/// Pause between polls when the port reports a read timeout
const RETRY_DELAY: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum SerialError {
    #[error("Serial port error: {0}")]
    Port(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

impl SerialError {
    /// Whether the port is still usable after this error
    pub fn is_transient(&self) -> bool {
        matches!(self, SerialError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;

/// Serial port configuration
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// Baud rate (e.g., 9600, 19200, 38400, 57600, 115200)
    pub baud_rate: u32,

    /// Data bits (5, 6, 7, 8)
    pub data_bits: serialport::DataBits,

    /// Stop bits
    pub stop_bits: serialport::StopBits,

    /// Parity
    pub parity: serialport::Parity,

    /// Flow control
    pub flow_control: serialport::FlowControl,

    /// Read timeout
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: serialport::DataBits::Eight,
            stop_bits: serialport::StopBits::One,
            parity: serialport::Parity::None,
            flow_control: serialport::FlowControl::None,
            timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with specified baud rate
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Default::default()
        }
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set hardware flow control (RTS/CTS)
    pub fn with_hardware_flow(mut self) -> Self {
        self.flow_control = serialport::FlowControl::Hardware;
        self
    }
}

/// Async serial port wrapper
pub struct SerialPort {
    port: Box<dyn serialport::SerialPort>,
    config: SerialConfig,
    /// Bytes received but not yet returned as a line
    line_buf: Vec<u8>,
}

impl SerialPort {
    /// Open a serial port with the given configuration
    pub fn open(port_name: &str, config: SerialConfig) -> Result<Self> {
        let mut port = serialport::new(port_name, config.baud_rate)
            .data_bits(config.data_bits)
            .stop_bits(config.stop_bits)
            .parity(config.parity)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| SerialError::Port(e.to_string()))?;

        // Bluetooth SPP bridges ignore these, USB adapters want them asserted
        let _ = port.write_data_terminal_ready(true);
        let _ = port.write_request_to_send(true);

        // Anything queued before we connected is likely a partial frame
        port.clear(serialport::ClearBuffer::Input)
            .map_err(|e| SerialError::Port(e.to_string()))?;

        tracing::info!("Connected to {} at {} baud", port_name, config.baud_rate);

        Ok(Self {
            port,
            config,
            line_buf: Vec::new(),
        })
    }

    /// Read one line, returning it without its `\r\n` terminator
    ///
    /// If `max_len` bytes arrive without a terminator they are returned as
    /// a line. On timeout any partial line stays buffered for the next call.
    pub async fn read_line(&mut self, max_len: usize) -> Result<String> {
        let port = &mut self.port;
        let line_buf = &mut self.line_buf;

        timeout(self.config.timeout, async {
            let mut chunk = [0u8; READ_CHUNK];
            loop {
                if let Some(line) = take_line(line_buf, max_len) {
                    return Ok(line);
                }
                match port.read(&mut chunk) {
                    Ok(0) => {
                        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "Port closed"))
                    }
                    Ok(n) => line_buf.extend_from_slice(&chunk[..n]),
                    Err(ref e) if e.kind() == io::ErrorKind::TimedOut => {
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await
        .map_err(|_| SerialError::Timeout(self.config.timeout))?
        .map_err(SerialError::Io)
    }

    /// Bytes that can be consumed without waiting: complete lines already
    /// buffered plus whatever the driver has queued
    pub fn pending_bytes(&mut self) -> Result<usize> {
        let buffered = if self.line_buf.contains(&b'\n') {
            self.line_buf.len()
        } else {
            0
        };
        Ok(buffered + self.bytes_to_read()? as usize)
    }

    /// Get number of bytes available to read
    pub fn bytes_to_read(&mut self) -> Result<u32> {
        self.port
            .bytes_to_read()
            .map_err(|e| SerialError::Port(e.to_string()))
    }
}

/// List available serial ports, sorted by name
pub fn list_ports() -> Result<Vec<String>> {
    let mut ports: Vec<String> = serialport::available_ports()
        .map_err(|e| SerialError::Port(e.to_string()))?
        .into_iter()
        .map(|p| p.port_name)
        .collect();
    ports.sort();
    Ok(ports)
}
