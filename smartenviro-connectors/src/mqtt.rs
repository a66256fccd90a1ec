//! MQTT connector for the SmartEnviro gateway
//!
//! Thin [`BrokerClient`] over `rumqttc`. A session is one `AsyncClient` plus
//! its `EventLoop`; nothing is spawned, the event loop is polled inline by
//! whichever call is waiting on the broker:
//!
//! - `connect` polls until CONNACK
//! - `publish` polls until the PUBLISH leaves (QoS 0), its PUBACK (QoS 1) or
//!   its PUBCOMP (QoS 2) arrives
//! - `disconnect` polls until DISCONNECT is written
//!
//! Keeping everything on the caller's task means the connection state seen
//! by [`BrokerConnection`](crate::BrokerConnection) is never stale: a broken
//! socket surfaces as an error on the very publish that hit it.
//!
//! Time bounds come from the wrapping `BrokerConnection`; this client only
//! ever waits on the event loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet,
    TlsConfiguration, Transport,
};
use smartenviro_core::constants::broker::{
    DEFAULT_BROKER_PORT, DEFAULT_CERTIFICATE_PATH, DEFAULT_CLIENT_ID, DEFAULT_PRIVATE_KEY_PATH,
    DEFAULT_REQUEST_CHANNEL_CAPACITY, DEFAULT_ROOT_CA_PATH,
};
use smartenviro_core::constants::timing::DEFAULT_KEEP_ALIVE_SECS;

use crate::{BrokerClient, ConnectorError, QoS};

/// Bound on flushing DISCONNECT during shutdown
const DISCONNECT_FLUSH: Duration = Duration::from_secs(1);

/// Certificate material for mutual TLS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub root_ca: PathBuf,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
}

impl Default for TlsPaths {
    fn default() -> Self {
        Self {
            root_ca: PathBuf::from(DEFAULT_ROOT_CA_PATH),
            certificate: PathBuf::from(DEFAULT_CERTIFICATE_PATH),
            private_key: PathBuf::from(DEFAULT_PRIVATE_KEY_PATH),
        }
    }
}

/// MQTT configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    /// `None` for plain TCP
    pub tls: Option<TlsPaths>,
    pub request_channel_capacity: usize,
}

impl MqttConfig {
    /// Plain-TCP configuration for `host:port`
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keep_alive: Duration::from_secs(DEFAULT_KEEP_ALIVE_SECS),
            tls: None,
            request_channel_capacity: DEFAULT_REQUEST_CHANNEL_CAPACITY,
        }
    }

    /// TLS configuration on the default secure port with the default
    /// certificate paths
    pub fn secure(host: impl Into<String>) -> Self {
        Self::new(host, DEFAULT_BROKER_PORT).tls(TlsPaths::default())
    }

    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.client_id = id.into();
        self
    }

    pub fn keep_alive_secs(mut self, secs: u64) -> Self {
        self.keep_alive = Duration::from_secs(secs);
        self
    }

    pub fn tls(mut self, paths: TlsPaths) -> Self {
        self.tls = Some(paths);
        self
    }

    fn options(&self) -> Result<MqttOptions, ConnectorError> {
        if self.host.is_empty() {
            return Err(ConnectorError::ConfigError("broker host is empty".into()));
        }

        let mut options = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        options.set_keep_alive(self.keep_alive);
        options.set_clean_session(true);

        if let Some(paths) = &self.tls {
            options.set_transport(Transport::Tls(TlsConfiguration::Simple {
                ca: read_pem(&paths.root_ca)?,
                alpn: None,
                client_auth: Some((read_pem(&paths.certificate)?, read_pem(&paths.private_key)?)),
            }));
        }

        Ok(options)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ConnectorError> {
    std::fs::read(path).map_err(|e| ConnectorError::Tls(format!("{}: {}", path.display(), e)))
}

impl From<QoS> for rumqttc::QoS {
    fn from(qos: QoS) -> Self {
        match qos {
            QoS::AtMostOnce => rumqttc::QoS::AtMostOnce,
            QoS::AtLeastOnce => rumqttc::QoS::AtLeastOnce,
            QoS::ExactlyOnce => rumqttc::QoS::ExactlyOnce,
        }
    }
}

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl Session {
    async fn await_ack(&mut self, qos: QoS) -> Result<(), ConnectorError> {
        let mut pkid = None;
        loop {
            let event = self
                .eventloop
                .poll()
                .await
                .map_err(|e| ConnectorError::Transport(e.to_string()))?;

            match event {
                Event::Outgoing(Outgoing::Publish(id)) => {
                    if qos == QoS::AtMostOnce {
                        return Ok(());
                    }
                    pkid = Some(id);
                }
                Event::Incoming(Packet::PubAck(ack))
                    if qos == QoS::AtLeastOnce && pkid == Some(ack.pkid) =>
                {
                    return Ok(());
                }
                Event::Incoming(Packet::PubComp(comp))
                    if qos == QoS::ExactlyOnce && pkid == Some(comp.pkid) =>
                {
                    return Ok(());
                }
                other => debug!("mqtt event while awaiting ack: {:?}", other),
            }
        }
    }
}

/// MQTT broker client backed by `rumqttc`
pub struct MqttClient {
    config: MqttConfig,
    session: Option<Session>,
}

impl MqttClient {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait::async_trait]
impl BrokerClient for MqttClient {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        // a stale session from a broken link is never reused
        self.session = None;

        let options = self.config.options()?;
        let (client, mut eventloop) =
            AsyncClient::new(options, self.config.request_channel_capacity.max(1));

        loop {
            let event = eventloop
                .poll()
                .await
                .map_err(|e| ConnectorError::Transport(e.to_string()))?;

            if let Event::Incoming(Packet::ConnAck(ack)) = event {
                if ack.code != ConnectReturnCode::Success {
                    return Err(ConnectorError::Refused(format!("{:?}", ack.code)));
                }
                self.session = Some(Session { client, eventloop });
                return Ok(());
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], qos: QoS) -> Result<(), ConnectorError> {
        let session = self.session.as_mut().ok_or(ConnectorError::NotConnected)?;

        let result = match session
            .client
            .publish(topic, qos.into(), false, payload.to_vec())
            .await
        {
            Ok(()) => session.await_ack(qos).await,
            Err(e) => Err(ConnectorError::Transport(e.to_string())),
        };

        if result.is_err() {
            self.session = None;
        }
        result
    }

    async fn disconnect(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };
        if session.client.disconnect().await.is_err() {
            return;
        }

        let flush = async {
            loop {
                match session.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        if tokio::time::timeout(DISCONNECT_FLUSH, flush).await.is_err() {
            debug!("DISCONNECT not flushed within {:?}", DISCONNECT_FLUSH);
        }
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = MqttConfig::new("broker.local", 1883)
            .client_id("gw-test")
            .keep_alive_secs(30);

        assert_eq!(config.host, "broker.local");
        assert_eq!(config.port, 1883);
        assert_eq!(config.client_id, "gw-test");
        assert_eq!(config.keep_alive, Duration::from_secs(30));
        assert!(config.tls.is_none());
    }

    #[test]
    fn secure_config_uses_default_certificates() {
        let config = MqttConfig::secure("example.iot.local");
        assert_eq!(config.port, 8883);
        assert_eq!(config.tls, Some(TlsPaths::default()));
        assert_eq!(config.client_id, "SmartEnviro-Gateway-01");
    }

    #[test]
    fn missing_certificates_are_reported() {
        let config = MqttConfig::new("example.iot.local", 8883).tls(TlsPaths {
            root_ca: PathBuf::from("/nonexistent/root-CA.pem"),
            certificate: PathBuf::from("/nonexistent/cert.pem"),
            private_key: PathBuf::from("/nonexistent/key.pem"),
        });

        match config.options() {
            Err(ConnectorError::Tls(msg)) => assert!(msg.contains("root-CA.pem")),
            other => panic!("expected TLS error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(
            MqttConfig::new("", 1883).options(),
            Err(ConnectorError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn publish_without_session_is_not_connected() {
        let mut client = MqttClient::new(MqttConfig::new("localhost", 1883));
        assert!(!client.has_session());
        assert_eq!(
            client.publish("t", b"{}", QoS::AtLeastOnce).await,
            Err(ConnectorError::NotConnected)
        );
        // disconnect without a session is a no-op
        client.disconnect().await;
        assert_eq!(client.endpoint(), "localhost:1883");
    }
}
