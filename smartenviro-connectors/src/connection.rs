//! Stateful Broker Connection with Bounded Retries
//!
//! ## State Machine
//!
//! ```text
//!                 connect()
//!  Disconnected ─────────────▶ Connecting ──── attempt ok ────▶ Connected
//!       ▲                          │                                │
//!       │      all attempts        │                                │ publish failure
//!       └────── exhausted ─────────┘                                │ or disconnect()
//!       └───────────────────────────────────────────────────────────┘
//! ```
//!
//! `Connecting` only exists inside a `connect()` call. The retry loop runs at
//! most `max_attempts` handshakes with a fixed `retry_delay` between them;
//! there is no other way to stay in `Connecting`.
//!
//! ## Retry Logic
//!
//! Fixed delay, not exponential. The broker is a single managed endpoint and
//! the gateway loop already spaces out reconnect calls by its publish cadence,
//! so a short fixed delay recovers fastest from the common case (a brief
//! network blip) without hammering the endpoint.
//!
//! ## Timeouts
//!
//! Each handshake is bounded by `connect_timeout` and each publish by
//! `operation_timeout`, whatever the client does internally. Nothing in this
//! module can block indefinitely, and a handshake in flight is abandoned as
//! soon as shutdown is requested.

use std::time::Duration;

use log::{debug, info, warn};
use smartenviro_core::constants::timing::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_CONNECT_ATTEMPTS, DEFAULT_OPERATION_TIMEOUT_SECS,
    DEFAULT_RETRY_DELAY_SECS,
};
use tokio::time::timeout;

use crate::shutdown::Shutdown;
use crate::{BrokerClient, ConnectionState, ConnectionStats, ConnectorError, QoS};

/// Connect retry and timeout configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Handshakes per `connect()` call
    pub max_attempts: u32,
    /// Pause between failed handshakes
    pub retry_delay: Duration,
    /// Bound on a single handshake
    pub connect_timeout: Duration,
    /// Bound on a single publish acknowledgement
    pub operation_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_CONNECT_ATTEMPTS,
            retry_delay: Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn connect_timeout(mut self, limit: Duration) -> Self {
        self.connect_timeout = limit;
        self
    }

    pub fn operation_timeout(mut self, limit: Duration) -> Self {
        self.operation_timeout = limit;
        self
    }
}

/// Broker connection owning its client, state and retry policy
pub struct BrokerConnection<C: BrokerClient> {
    client: C,
    policy: RetryPolicy,
    state: ConnectionState,
    stats: ConnectionStats,
    shutdown: Option<Shutdown>,
}

impl<C: BrokerClient> BrokerConnection<C> {
    pub fn new(client: C, policy: RetryPolicy) -> Self {
        Self {
            client,
            policy,
            state: ConnectionState::Disconnected,
            stats: ConnectionStats::default(),
            shutdown: None,
        }
    }

    /// Let a shutdown request cut handshakes and retry delays short
    pub fn with_shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Establish a session, retrying up to `max_attempts` times
    ///
    /// Already connected is success. Individual attempt failures are logged
    /// and not returned; only exhausting every attempt is an error, and it
    /// leaves the state `Disconnected`.
    pub async fn connect(&mut self) -> Result<(), ConnectorError> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        let attempts = self.policy.max_attempts.max(1);
        let endpoint = self.client.endpoint();
        let mut last_error = ConnectorError::Timeout;

        self.state = ConnectionState::Connecting;

        for attempt in 1..=attempts {
            if attempt > 1 {
                info!("Retrying broker connection in {:?}", self.policy.retry_delay);
                if !self.pause(self.policy.retry_delay).await {
                    self.state = ConnectionState::Disconnected;
                    return Err(ConnectorError::Cancelled);
                }
            } else if self.shutdown_requested() {
                self.state = ConnectionState::Disconnected;
                return Err(ConnectorError::Cancelled);
            }

            info!("Connecting to broker {} (attempt {}/{})", endpoint, attempt, attempts);

            let limit = self.policy.connect_timeout;
            let outcome = tokio::select! {
                outcome = timeout(limit, self.client.connect()) => outcome,
                () = stop_requested(self.shutdown.as_mut()) => {
                    info!("Broker connection attempt {}/{} abandoned on shutdown", attempt, attempts);
                    self.state = ConnectionState::Disconnected;
                    return Err(ConnectorError::Cancelled);
                }
            };

            match outcome {
                Ok(Ok(())) => {
                    self.state = ConnectionState::Connected;
                    self.stats.reconnections += 1;
                    info!("Connected to broker {}", endpoint);
                    return Ok(());
                }
                Ok(Err(e)) => {
                    warn!("Broker connection attempt {}/{} failed: {}", attempt, attempts, e);
                    last_error = e;
                }
                Err(_) => {
                    warn!(
                        "Broker connection attempt {}/{} timed out after {:?}",
                        attempt, attempts, self.policy.connect_timeout
                    );
                    last_error = ConnectorError::Timeout;
                }
            }
        }

        self.state = ConnectionState::Disconnected;
        self.stats.connect_failures += 1;
        self.stats.last_error = Some(last_error.to_string());

        Err(ConnectorError::ConnectionFailed {
            attempts,
            reason: last_error.to_string(),
        })
    }

    /// Publish one message and wait for its acknowledgement
    ///
    /// Fails with `NotConnected` without touching the client unless the state
    /// is `Connected`. Any other failure drops the state to `Disconnected`.
    pub async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
    ) -> Result<(), ConnectorError> {
        if self.state != ConnectionState::Connected {
            return Err(ConnectorError::NotConnected);
        }

        let outcome = timeout(
            self.policy.operation_timeout,
            self.client.publish(topic, payload, qos),
        )
        .await;

        match outcome {
            Ok(Ok(())) => {
                self.stats.messages_sent += 1;
                self.stats.bytes_sent += payload.len() as u64;
                debug!("Published {} bytes to {}", payload.len(), topic);
                Ok(())
            }
            Ok(Err(e)) => Err(self.publish_failed(e.to_string())),
            Err(_) => Err(self.publish_failed(format!(
                "no acknowledgement within {:?}",
                self.policy.operation_timeout
            ))),
        }
    }

    /// Close the session; idempotent and infallible
    pub async fn disconnect(&mut self) {
        let was = self.state;
        if timeout(self.policy.operation_timeout, self.client.disconnect())
            .await
            .is_err()
        {
            warn!("Broker disconnect did not complete in {:?}", self.policy.operation_timeout);
        }
        self.state = ConnectionState::Disconnected;

        if was != ConnectionState::Disconnected {
            info!("Disconnected from broker {}", self.client.endpoint());
        }
    }

    fn publish_failed(&mut self, reason: String) -> ConnectorError {
        warn!("Publish failed, marking broker connection down: {}", reason);
        self.state = ConnectionState::Disconnected;
        self.stats.messages_failed += 1;
        self.stats.last_error = Some(reason.clone());
        ConnectorError::PublishFailed(reason)
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown.as_ref().is_some_and(Shutdown::is_requested)
    }

    async fn pause(&mut self, delay: Duration) -> bool {
        match self.shutdown.as_mut() {
            Some(shutdown) => shutdown.sleep(delay).await,
            None => {
                tokio::time::sleep(delay).await;
                true
            }
        }
    }
}

/// Resolve on a stop request; never without a listener
async fn stop_requested(shutdown: Option<&mut Shutdown>) {
    match shutdown {
        Some(shutdown) => shutdown.requested().await,
        None => std::future::pending().await,
    }
}
