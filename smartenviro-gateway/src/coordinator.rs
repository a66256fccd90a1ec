//! Publish-or-Buffer Coordination
//!
//! ## Overview
//!
//! The coordinator is the only code that touches both the broker connection
//! and the offline backlog. For each sample it makes one decision:
//!
//! ```text
//!                 submit(sample)
//!                       │
//!            connected? ─── no ──────────────┐
//!                       │ yes                │
//!                    publish                 │
//!                       │                    ▼
//!               acked? ─┴─ no ──────▶ backlog.enqueue ──▶ Buffered
//!                 │ yes                (evicts oldest)
//!                 ▼
//!             Published
//! ```
//!
//! ## Ordering Contract
//!
//! Samples reach the broker in submission order. The backlog is FIFO and
//! [`PublishCoordinator::drain`] replays it head first, putting a sample that
//! fails back at the head before stopping. The only samples that never reach
//! the broker are the ones evicted by a full backlog, and each eviction is
//! reported.
//!
//! The loop keeps the order intact across a reconnect by draining the backlog
//! before submitting the next fresh sample.
//!
//! ## Errors
//!
//! Neither `submit` nor `drain` returns an error. Broker failures become
//! backlog entries, unusable samples are dropped, and both are reported to the
//! [`PublishObserver`].

use log::info;
use smartenviro_connectors::{BrokerClient, BrokerConnection, ConnectorError, QoS, Shutdown};
use smartenviro_core::{BoundedQueue, SensorSample};

use crate::config::GatewayConfig;
use crate::events::{GatewayStats, LogObserver, PublishEvent, PublishObserver};

/// Everything the publish path owns, passed explicitly
pub struct GatewayContext<C: BrokerClient> {
    pub config: GatewayConfig,
    pub connection: BrokerConnection<C>,
    pub queue: BoundedQueue<SensorSample>,
}

impl<C: BrokerClient> GatewayContext<C> {
    /// Build the connection and backlog described by `config`
    pub fn new(config: GatewayConfig, client: C) -> Self {
        let connection = BrokerConnection::new(client, config.retry_policy());
        let queue = BoundedQueue::new(config.buffer_capacity());
        Self {
            config,
            connection,
            queue,
        }
    }
}

/// What happened to a submitted sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Acknowledged by the broker
    Published,
    /// Held in the backlog
    Buffered,
    /// Could not be encoded; discarded
    Dropped,
}

/// Result of one backlog replay
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    pub published: usize,
    /// Backlog length afterwards
    pub remaining: usize,
    /// A publish failed and replay stopped early
    pub interrupted: bool,
}

/// Decides between publishing and buffering, and replays the backlog
pub struct PublishCoordinator<C: BrokerClient> {
    ctx: GatewayContext<C>,
    observer: Box<dyn PublishObserver>,
    stats: GatewayStats,
    shutdown: Option<Shutdown>,
}

impl<C: BrokerClient> PublishCoordinator<C> {
    pub fn new(ctx: GatewayContext<C>) -> Self {
        Self {
            ctx,
            observer: Box::new(LogObserver),
            stats: GatewayStats::default(),
            shutdown: None,
        }
    }

    /// Stop connect attempts and backlog replay once shutdown is requested
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.ctx.connection = self.ctx.connection.with_shutdown(shutdown.clone());
        self.shutdown = Some(shutdown);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn PublishObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn context(&self) -> &GatewayContext<C> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut GatewayContext<C> {
        &mut self.ctx
    }

    pub fn queue(&self) -> &BoundedQueue<SensorSample> {
        &self.ctx.queue
    }

    pub fn connection(&self) -> &BrokerConnection<C> {
        &self.ctx.connection
    }

    pub fn is_connected(&self) -> bool {
        self.ctx.connection.is_connected()
    }

    pub fn stats(&self) -> &GatewayStats {
        &self.stats
    }

    /// Publish `sample` now if the broker is up, otherwise buffer it
    pub async fn submit(&mut self, sample: SensorSample) -> SubmitOutcome {
        let payload = match sample.to_payload() {
            Ok(payload) => payload,
            Err(error) => {
                self.report(PublishEvent::Dropped { error });
                return SubmitOutcome::Dropped;
            }
        };

        if !self.ctx.connection.is_connected() {
            self.buffer(sample, None);
            return SubmitOutcome::Buffered;
        }

        match self.publish(&payload).await {
            Ok(()) => {
                self.report(PublishEvent::Published {
                    captured_at: sample.captured_at(),
                    bytes: payload.len(),
                    replayed: false,
                });
                SubmitOutcome::Published
            }
            Err(e) => {
                self.buffer(sample, Some(e.to_string()));
                SubmitOutcome::Buffered
            }
        }
    }

    /// Replay the backlog oldest first while the broker stays up
    ///
    /// Stops at the first failed publish, leaving that sample at the head.
    /// A stop request ends the replay before the next publish. A no-op when
    /// the backlog is empty or the broker is down.
    pub async fn drain(&mut self) -> DrainReport {
        let mut report = DrainReport::default();

        while self.ctx.connection.is_connected() {
            if self.shutdown.as_ref().is_some_and(Shutdown::is_requested) {
                info!("backlog replay stopped by shutdown");
                break;
            }
            let Some(sample) = self.ctx.queue.dequeue() else {
                break;
            };

            let payload = match sample.to_payload() {
                Ok(payload) => payload,
                Err(error) => {
                    self.report(PublishEvent::Dropped { error });
                    continue;
                }
            };

            match self.publish(&payload).await {
                Ok(()) => {
                    report.published += 1;
                    self.report(PublishEvent::Published {
                        captured_at: sample.captured_at(),
                        bytes: payload.len(),
                        replayed: true,
                    });
                }
                Err(e) => {
                    self.ctx.queue.requeue_front(sample);
                    report.interrupted = true;
                    self.report(PublishEvent::DrainInterrupted {
                        published: report.published,
                        remaining: self.ctx.queue.len(),
                        reason: e.to_string(),
                    });
                    break;
                }
            }
        }

        report.remaining = self.ctx.queue.len();
        if report.published > 0 {
            info!(
                "replayed {} buffered sample(s), {} remaining",
                report.published, report.remaining
            );
        }
        report
    }

    /// Open the broker session using the configured retry policy
    ///
    /// Returns whether the broker is now connected. A shutdown that cuts the
    /// retries short is not reported as a failure.
    pub async fn connect(&mut self) -> bool {
        match self.ctx.connection.connect().await {
            Ok(()) => {
                let endpoint = self.ctx.connection.client().endpoint();
                self.report(PublishEvent::Connected { endpoint });
                true
            }
            Err(ConnectorError::Cancelled) => false,
            Err(e) => {
                self.report(PublishEvent::ConnectFailed {
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    pub async fn disconnect(&mut self) {
        self.ctx.connection.disconnect().await;
    }

    /// Count an event and pass it to the observer
    pub fn report(&mut self, event: PublishEvent) {
        self.stats.record(&event);
        self.observer.on_event(&event);
    }

    async fn publish(&mut self, payload: &[u8]) -> Result<(), ConnectorError> {
        let topic = self.ctx.config.broker.topic.as_str();
        self.ctx
            .connection
            .publish(topic, payload, QoS::AtLeastOnce)
            .await
    }

    fn buffer(&mut self, sample: SensorSample, cause: Option<String>) {
        let captured_at = sample.captured_at();
        for evicted in self.ctx.queue.enqueue(sample) {
            self.report(PublishEvent::Evicted {
                captured_at: evicted.captured_at(),
            });
        }
        let queued = self.ctx.queue.len();
        self.report(PublishEvent::Buffered {
            captured_at,
            queued,
            cause,
        });
    }
}
