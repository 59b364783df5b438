// Line-oriented transport contract consumed by the poller

use super::comm::{Result, SerialPort};
use std::future::Future;

/// A byte source that hands out one text line at a time
///
/// The poller only needs to know whether anything is pending and to pull the
/// next line. Connection management stays with whoever owns the transport.
pub trait LineTransport: Send {
    /// Number of bytes that can be consumed without waiting. Must not block.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read one line of at most `max_len` bytes, terminator stripped
    fn read_line(&mut self, max_len: usize) -> impl Future<Output = Result<String>> + Send;
}

impl LineTransport for SerialPort {
    fn bytes_available(&mut self) -> Result<usize> {
        self.pending_bytes()
    }

    fn read_line(&mut self, max_len: usize) -> impl Future<Output = Result<String>> + Send {
        SerialPort::read_line(self, max_len)
    }
}

/// Split the first complete line off `buf`
///
/// Returns None while no terminator has arrived, unless `max_len` bytes are
/// already buffered, in which case the whole buffer is returned as one line.
/// Invalid UTF-8 is replaced rather than rejected; the decoder drops it later.
pub(crate) fn take_line(buf: &mut Vec<u8>, max_len: usize) -> Option<String> {
    let raw: Vec<u8> = match buf.iter().position(|&b| b == b'\n') {
        Some(pos) => buf.drain(..=pos).collect(),
        None if buf.len() >= max_len => std::mem::take(buf),
        None => return None,
    };
    let text = String::from_utf8_lossy(&raw);
    Some(text.trim_end_matches(['\r', '\n']).to_string())
}
