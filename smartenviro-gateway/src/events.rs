//! Publish events and counters
//!
//! Nothing on the publish path returns an error to the loop. Every outcome
//! worth knowing about, good or bad, becomes a [`PublishEvent`] handed to a
//! [`PublishObserver`]. The default observer writes them to the log;
//! [`GatewayStats`] folds them into counters.
//!
//! ```text
//! Published          sample acknowledged by the broker
//! Buffered           sample queued (offline, or its publish failed)
//! Evicted            oldest queued sample discarded to make room
//! DrainInterrupted   backlog replay stopped on a failed publish
//! Dropped            sample unusable (malformed), discarded
//! ConnectFailed      connect() exhausted its attempts
//! Connected          broker session established
//! ```

use core::fmt;

use log::{debug, info, warn};
use smartenviro_core::time::Timestamp;
use smartenviro_core::SampleError;

/// Observable outcome on the publish path
#[derive(Debug, Clone, PartialEq)]
pub enum PublishEvent {
    Published {
        captured_at: Timestamp,
        bytes: usize,
        /// True when the sample came out of the backlog
        replayed: bool,
    },
    Buffered {
        captured_at: Timestamp,
        /// Backlog length after the insert
        queued: usize,
        /// Publish error that sent the sample to the backlog, if any
        cause: Option<String>,
    },
    Evicted {
        captured_at: Timestamp,
    },
    DrainInterrupted {
        published: usize,
        remaining: usize,
        reason: String,
    },
    Dropped {
        error: SampleError,
    },
    ConnectFailed {
        reason: String,
    },
    Connected {
        endpoint: String,
    },
}

/// Sink for publish events
pub trait PublishObserver: Send {
    fn on_event(&mut self, event: &PublishEvent);
}

/// Observer that writes every event through the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl PublishObserver for LogObserver {
    fn on_event(&mut self, event: &PublishEvent) {
        match event {
            PublishEvent::Published {
                captured_at,
                bytes,
                replayed,
            } => debug!(
                "published sample from {} ({} bytes{})",
                captured_at,
                bytes,
                if *replayed { ", from backlog" } else { "" }
            ),
            PublishEvent::Buffered {
                queued, cause: None, ..
            } => warn!("broker offline, sample buffered ({} queued)", queued),
            PublishEvent::Buffered {
                queued,
                cause: Some(cause),
                ..
            } => warn!("publish failed ({}), sample buffered ({} queued)", cause, queued),
            PublishEvent::Evicted { captured_at } => {
                warn!("backlog full, evicted sample from {}", captured_at)
            }
            PublishEvent::DrainInterrupted {
                published,
                remaining,
                reason,
            } => warn!(
                "backlog replay stopped after {} sample(s), {} left: {}",
                published, remaining, reason
            ),
            PublishEvent::Dropped { error } => warn!("dropping malformed sample: {}", error),
            PublishEvent::ConnectFailed { reason } => warn!("broker connect failed: {}", reason),
            PublishEvent::Connected { endpoint } => info!("connected to broker at {}", endpoint),
        }
    }
}

/// Running totals of publish outcomes
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GatewayStats {
    pub published: u64,
    /// Of `published`, how many were replayed from the backlog
    pub replayed: u64,
    pub buffered: u64,
    pub evicted: u64,
    pub dropped: u64,
    pub drain_interruptions: u64,
    pub connect_failures: u64,
}

impl GatewayStats {
    pub fn record(&mut self, event: &PublishEvent) {
        match event {
            PublishEvent::Published { replayed, .. } => {
                self.published += 1;
                if *replayed {
                    self.replayed += 1;
                }
            }
            PublishEvent::Buffered { .. } => self.buffered += 1,
            PublishEvent::Evicted { .. } => self.evicted += 1,
            PublishEvent::DrainInterrupted { .. } => self.drain_interruptions += 1,
            PublishEvent::Dropped { .. } => self.dropped += 1,
            PublishEvent::ConnectFailed { .. } => self.connect_failures += 1,
            PublishEvent::Connected { .. } => {}
        }
    }
}

impl fmt::Display for GatewayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "published={} (replayed={}) buffered={} evicted={} dropped={} \
             drain_interruptions={} connect_failures={}",
            self.published,
            self.replayed,
            self.buffered,
            self.evicted,
            self.dropped,
            self.drain_interruptions,
            self.connect_failures
        )
    }
}
