// Continuous poller feeding received frames into the memory view

use super::comm::SerialError;
use super::transport::LineTransport;
use crate::memview::MemoryView;
use crate::protocol::decode_line;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Connection lost: {0}")]
    TransportFault(#[from] SerialError),

    #[error("Poller task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, PollError>;

/// Poller tuning
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Pause while the transport has nothing pending
    #[serde(with = "millis")]
    pub idle_interval: Duration,

    /// Longest line accepted before it is forced out as (malformed) frame
    pub max_line_len: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            idle_interval: Duration::from_millis(10),
            max_line_len: 64,
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Counters reported when a poller stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub frames_decoded: u64,
    pub frames_dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PollState {
    /// Nothing pending on the transport
    Idle,
    /// At least one line is ready to be consumed
    Draining,
}

/// Cooperative stop signal shared between a poller and its owner
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Pulls lines from a transport, decodes them and stores the results
pub struct SerialPoller<T> {
    transport: T,
    view: Arc<MemoryView>,
    config: PollerConfig,
    cancel: CancelToken,
    stats: PollStats,
}

impl<T: LineTransport> SerialPoller<T> {
    pub fn new(transport: T, view: Arc<MemoryView>) -> Self {
        Self {
            transport,
            view,
            config: PollerConfig::default(),
            cancel: CancelToken::new(),
            stats: PollStats::default(),
        }
    }

    pub fn with_config(mut self, config: PollerConfig) -> Self {
        self.config = config;
        self
    }

    /// Token that stops this poller at the top of its next iteration
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Run until cancelled or until the transport fails
    ///
    /// Malformed frames are dropped. Any transport error other than a read
    /// timeout ends the loop and is returned.
    pub async fn run(mut self) -> Result<PollStats> {
        let mut state = PollState::Idle;
        tracing::debug!("Serial poller started");

        while !self.cancel.is_cancelled() {
            state = match state {
                PollState::Idle => {
                    if self.pending()? == 0 {
                        tokio::time::sleep(self.config.idle_interval).await;
                        PollState::Idle
                    } else {
                        PollState::Draining
                    }
                }
                PollState::Draining => {
                    match self.transport.read_line(self.config.max_line_len).await {
                        Ok(line) => self.process_line(&line),
                        Err(e) if e.is_transient() => {
                            // partial line stays buffered in the transport
                            tracing::debug!("Line read incomplete: {}", e);
                        }
                        Err(e) => return Err(self.fault(e)),
                    }
                    if self.pending()? == 0 {
                        PollState::Idle
                    } else {
                        PollState::Draining
                    }
                }
            };
        }

        tracing::debug!(
            "Serial poller cancelled after {} frames ({} dropped)",
            self.stats.frames_decoded,
            self.stats.frames_dropped
        );
        Ok(self.stats)
    }

    fn pending(&mut self) -> Result<usize> {
        self.transport.bytes_available().map_err(|e| self.fault(e))
    }

    fn fault(&self, err: SerialError) -> PollError {
        tracing::warn!("Serial transport failed: {}", err);
        PollError::TransportFault(err)
    }

    fn process_line(&mut self, line: &str) {
        match decode_line(line) {
            Ok(frame) => {
                tracing::trace!("Frame {}", frame);
                self.view.apply(&frame);
                self.stats.frames_decoded += 1;
            }
            Err(e) => {
                tracing::debug!("Dropping frame: {}", e);
                self.stats.frames_dropped += 1;
            }
        }
    }
}

impl<T: LineTransport + 'static> SerialPoller<T> {
    /// Run the poller as a background tokio task
    pub fn spawn(self) -> PollerHandle {
        let cancel = self.cancel_token();
        let task = tokio::spawn(self.run());
        PollerHandle { cancel, task }
    }
}

/// Owner's side of a spawned poller
pub struct PollerHandle {
    cancel: CancelToken,
    task: JoinHandle<Result<PollStats>>,
}

impl PollerHandle {
    /// Ask the poller to stop; it finishes the line in flight first
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the poller has stopped, either cancelled or failed
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the poller to stop and collect its outcome
    pub async fn join(self) -> Result<PollStats> {
        self.task
            .await
            .map_err(|e| PollError::Task(e.to_string()))?
    }

    /// Cancel and wait
    pub async fn shutdown(self) -> Result<PollStats> {
        self.cancel();
        self.join().await
    }
}
