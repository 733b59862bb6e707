//! Producer-to-engine sample transport
//!
//! The sampling task runs at the sensor ODR, usually faster than the engine's
//! update tick, so samples are handed over through a bounded channel and the
//! engine drains a whole batch per tick. Channel semantics guarantee the
//! engine only ever observes fully-written samples; there is no flag
//! polling and no torn read.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use thiserror::Error;

use crate::types::SwingSample;

/// Sample transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StreamError {
    /// The bounded queue is full; the engine is not keeping up
    #[error("sample queue is full")]
    QueueFull,
    /// The other side of the queue has been dropped
    #[error("sample queue is disconnected")]
    Disconnected,
}

/// Create a bounded sample queue
///
/// `capacity` bounds how many samples may be in flight; size it for the
/// worst-case ODR-to-tick ratio (a 400 Hz sensor against a 30 Hz tick needs
/// room for at least 14 samples plus slack).
pub fn sample_channel(capacity: usize) -> (SampleProducer, SampleReceiver) {
    let (sender, receiver) = channel::bounded(capacity);
    (SampleProducer { sender }, SampleReceiver { receiver })
}

/// Producer half of the sample queue
///
/// Held by the sampling task. Cloneable so a transport callback can be
/// handed its own copy.
#[derive(Debug, Clone)]
pub struct SampleProducer {
    sender: Sender<SwingSample>,
}

impl SampleProducer {
    /// Append one sample without blocking
    pub fn push(&self, sample: SwingSample) -> Result<(), StreamError> {
        self.sender.try_send(sample).map_err(|error| match error {
            TrySendError::Full(_) => StreamError::QueueFull,
            TrySendError::Disconnected(_) => StreamError::Disconnected,
        })
    }
}

/// Engine half of the sample queue
#[derive(Debug)]
pub struct SampleReceiver {
    receiver: Receiver<SwingSample>,
}

impl SampleReceiver {
    /// Collect the batch for one engine tick
    ///
    /// Blocks up to `deadline` for the first sample, then drains whatever
    /// else has already arrived without blocking. A starved tick returns an
    /// empty batch, which the engine accepts.
    pub fn recv_batch(&self, deadline: Duration) -> Result<Vec<SwingSample>, StreamError> {
        let mut batch = Vec::new();
        match self.receiver.recv_timeout(deadline) {
            Ok(sample) => batch.push(sample),
            Err(RecvTimeoutError::Timeout) => return Ok(batch),
            Err(RecvTimeoutError::Disconnected) => return Err(StreamError::Disconnected),
        }
        batch.extend(self.receiver.try_iter());
        Ok(batch)
    }

    /// Drain everything queued right now, without blocking
    pub fn drain(&self) -> Vec<SwingSample> {
        self.receiver.try_iter().collect()
    }
}
