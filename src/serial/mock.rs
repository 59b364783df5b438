// Mock serial port for testing without hardware

use super::comm::{SerialConfig, SerialError};
use super::transport::{take_line, LineTransport};
use crate::protocol::{encode_line, Frame};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock serial port for testing
///
/// Clones share the receive queue and connection state, so a test can keep
/// one handle to feed data while the poller owns another.
#[derive(Clone)]
pub struct MockSerialPort {
    /// Data to be read (simulates the device sending frames)
    read_buffer: Arc<Mutex<VecDeque<u8>>>,

    /// Set once the simulated link drops
    disconnected: Arc<AtomicBool>,

    /// Bytes pulled from the queue but not yet returned as a line
    line_buf: Vec<u8>,

    /// Configuration
    config: SerialConfig,

    /// Simulated delay for read operations (in ms)
    delay_ms: u64,
}

impl MockSerialPort {
    /// Create a new mock serial port
    pub fn new() -> Self {
        Self {
            read_buffer: Arc::new(Mutex::new(VecDeque::new())),
            disconnected: Arc::new(AtomicBool::new(false)),
            line_buf: Vec::new(),
            config: SerialConfig::default(),
            delay_ms: 0,
        }
    }

    /// Set simulated delay for operations
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Push data to be read (simulates the device sending data)
    pub fn push_read_data(&self, data: &[u8]) {
        let mut buffer = self.read_buffer.lock().unwrap();
        buffer.extend(data.iter().copied());
    }

    /// Push one line, appending the wire terminator
    pub fn push_line(&self, line: &str) {
        self.push_read_data(line.as_bytes());
        self.push_read_data(b"\r\n");
    }

    /// Push a frame exactly as the device would encode it
    pub fn push_frame(&self, frame: &Frame) {
        self.push_read_data(encode_line(frame).as_bytes());
    }

    /// Simulate the link dropping; every later call fails
    pub fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
    }

    /// Bytes still queued for reading
    pub fn queued(&self) -> usize {
        self.read_buffer.lock().unwrap().len()
    }

    fn check_connected(&self) -> Result<(), SerialError> {
        if self.disconnected.load(Ordering::SeqCst) {
            Err(SerialError::Port("device disconnected".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Default for MockSerialPort {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTransport for MockSerialPort {
    fn bytes_available(&mut self) -> Result<usize, SerialError> {
        self.check_connected()?;
        let buffered = if self.line_buf.contains(&b'\n') {
            self.line_buf.len()
        } else {
            0
        };
        Ok(buffered + self.queued())
    }

    async fn read_line(&mut self, max_len: usize) -> Result<String, SerialError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.check_connected()?;

        {
            let mut buffer = self.read_buffer.lock().unwrap();
            self.line_buf.extend(buffer.drain(..));
        }

        take_line(&mut self.line_buf, max_len).ok_or(SerialError::Timeout(self.config.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Address, Bank};

    #[tokio::test]
    async fn test_mock_read_lines() {
        let mut port = MockSerialPort::new();
        port.push_line("1080");
        port.push_read_data(b"0100\n");

        assert_eq!(port.bytes_available().unwrap(), 11);
        assert_eq!(port.read_line(64).await.unwrap(), "1080");
        assert_eq!(port.bytes_available().unwrap(), 5);
        assert_eq!(port.read_line(64).await.unwrap(), "0100");
        assert_eq!(port.bytes_available().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_mock_partial_line_kept() {
        let mut port = MockSerialPort::new();
        port.push_read_data(b"10");

        let result = port.read_line(64).await;
        assert!(matches!(result, Err(SerialError::Timeout(_))));
        // partial bytes alone don't count as available
        assert_eq!(port.bytes_available().unwrap(), 0);

        port.push_read_data(b"80\r\n");
        assert_eq!(port.read_line(64).await.unwrap(), "1080");
    }

    #[tokio::test]
    async fn test_mock_shared_between_clones() {
        let feeder = MockSerialPort::new();
        let mut reader = feeder.clone();

        feeder.push_frame(&Frame::new(Bank::A, Address::new(0).unwrap(), 1));
        assert_eq!(reader.read_line(64).await.unwrap(), "1080");

        feeder.disconnect();
        assert!(matches!(reader.bytes_available(), Err(SerialError::Port(_))));
        assert!(reader.read_line(64).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_with_delay() {
        let mut port = MockSerialPort::new().with_delay(10);
        port.push_line("0");

        let start = std::time::Instant::now();
        port.read_line(64).await.unwrap();
        let elapsed = start.elapsed();

        // Should take at least 10ms
        assert!(elapsed.as_millis() >= 10);
    }
}
