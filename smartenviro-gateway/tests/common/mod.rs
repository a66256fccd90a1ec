//! Test doubles for gateway integration tests
//!
//! - `MockBroker`: a `BrokerClient` whose availability is switched from the
//!   test through a shared `BrokerMonitor`, recording every acknowledged payload
//! - `ScriptedDevice`: a `SensorDevice` that replays scripted results and then
//!   yields numbered samples
//! - `RecordingObserver`: collects publish events
//!
//! Samples are told apart by their `air_quality` value ("tag").

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use smartenviro_connectors::{BrokerClient, ConnectorError, DeviceError, QoS, SensorDevice};
use smartenviro_core::SensorSample;
use smartenviro_gateway::{GatewayConfig, PublishEvent, PublishObserver};

/// Build a valid sample identified by `tag`
pub fn sample(tag: u16) -> SensorSample {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    SensorSample::builder("SmartEnviro-Gateway-01")
        .captured_at(base + Duration::seconds(tag as i64))
        .temperature(21.0 + tag as f32 / 10.0)
        .humidity(50.0)
        .air_quality(tag)
        .light_level(250)
        .build()
        .unwrap()
}

pub fn tags_of<'a>(samples: impl IntoIterator<Item = &'a SensorSample>) -> Vec<u16> {
    samples.into_iter().map(SensorSample::air_quality).collect()
}

/// Config suitable for mock-driven tests
pub fn test_config(capacity: usize) -> GatewayConfig {
    GatewayConfig::default()
        .with_endpoint("mock-broker", 1883)
        .with_tls(false)
        .with_buffer_capacity(capacity)
}

// ===== BROKER =====

#[derive(Debug, Default)]
struct BrokerState {
    up: bool,
    published: Vec<(String, Vec<u8>)>,
    connect_calls: u32,
    disconnect_calls: u32,
    /// Successful publishes left before the broker drops
    drop_after: Option<usize>,
    /// Handshakes never complete
    stall_connect: bool,
}

/// Test-side handle onto a `MockBroker`
#[derive(Debug, Clone, Default)]
pub struct BrokerMonitor {
    state: Arc<Mutex<BrokerState>>,
}

impl BrokerMonitor {
    pub fn set_up(&self, up: bool) {
        self.state.lock().unwrap().up = up;
    }

    /// Make every later handshake hang
    pub fn stall_connect(&self) {
        self.state.lock().unwrap().stall_connect = true;
    }

    /// Go down after `n` more acknowledged publishes
    pub fn drop_after(&self, n: usize) {
        self.state.lock().unwrap().drop_after = Some(n);
    }

    pub fn payloads(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .map(|(_, payload)| String::from_utf8(payload.clone()).unwrap())
            .collect()
    }

    pub fn topics(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.published.iter().map(|(topic, _)| topic.clone()).collect()
    }

    /// Tags of acknowledged samples, in broker order
    pub fn published_tags(&self) -> Vec<u16> {
        self.payloads()
            .iter()
            .map(|payload| {
                let value: serde_json::Value = serde_json::from_str(payload).unwrap();
                value["air_quality"].as_u64().unwrap() as u16
            })
            .collect()
    }

    pub fn connect_calls(&self) -> u32 {
        self.state.lock().unwrap().connect_calls
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.state.lock().unwrap().disconnect_calls
    }
}

pub struct MockBroker {
    monitor: BrokerMonitor,
}

impl MockBroker {
    pub fn new(up: bool) -> (Self, BrokerMonitor) {
        let monitor = BrokerMonitor::default();
        monitor.set_up(up);
        (
            Self {
                monitor: monitor.clone(),
            },
            monitor,
        )
    }
}

#[async_trait::async_trait]
impl BrokerClient for MockBroker {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        let stalled = {
            let mut state = self.monitor.state.lock().unwrap();
            state.connect_calls += 1;
            state.stall_connect
        };
        if stalled {
            std::future::pending::<()>().await;
        }

        let state = self.monitor.state.lock().unwrap();
        if state.up {
            Ok(())
        } else {
            Err(ConnectorError::Transport("connection refused".into()))
        }
    }

    async fn publish(&mut self, topic: &str, payload: &[u8], _qos: QoS) -> Result<(), ConnectorError> {
        let mut state = self.monitor.state.lock().unwrap();
        if state.drop_after == Some(0) {
            state.drop_after = None;
            state.up = false;
        }
        if !state.up {
            return Err(ConnectorError::Transport("connection reset".into()));
        }

        state.published.push((topic.to_string(), payload.to_vec()));
        if let Some(left) = state.drop_after.as_mut() {
            *left -= 1;
        }
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.monitor.state.lock().unwrap().disconnect_calls += 1;
    }

    fn endpoint(&self) -> String {
        "mock-broker:1883".to_string()
    }
}

// ===== DEVICE =====

#[derive(Debug, Default)]
struct DeviceState {
    connected: bool,
    reads: u16,
    disconnect_calls: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceMonitor {
    state: Arc<Mutex<DeviceState>>,
}

impl DeviceMonitor {
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    pub fn reads(&self) -> u16 {
        self.state.lock().unwrap().reads
    }

    pub fn disconnect_calls(&self) -> u32 {
        self.state.lock().unwrap().disconnect_calls
    }
}

/// Device that replays `script`, then yields `sample(n)` for the n-th read
pub struct ScriptedDevice {
    reachable: bool,
    stall_scan: bool,
    script: VecDeque<Result<Option<SensorSample>, DeviceError>>,
    monitor: DeviceMonitor,
}

impl ScriptedDevice {
    pub fn new() -> (Self, DeviceMonitor) {
        let monitor = DeviceMonitor::default();
        (
            Self {
                reachable: true,
                stall_scan: false,
                script: VecDeque::new(),
                monitor: monitor.clone(),
            },
            monitor,
        )
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Scanning never finishes
    pub fn stalled(mut self) -> Self {
        self.stall_scan = true;
        self
    }

    pub fn with_script(
        mut self,
        script: impl IntoIterator<Item = Result<Option<SensorSample>, DeviceError>>,
    ) -> Self {
        self.script.extend(script);
        self
    }
}

#[async_trait::async_trait]
impl SensorDevice for ScriptedDevice {
    async fn scan_and_connect(&mut self) -> bool {
        if self.stall_scan {
            std::future::pending::<()>().await;
        }
        self.monitor.state.lock().unwrap().connected = self.reachable;
        self.reachable
    }

    async fn read_sample(&mut self) -> Result<Option<SensorSample>, DeviceError> {
        let mut state = self.monitor.state.lock().unwrap();
        if !state.connected {
            return Err(DeviceError::NotConnected);
        }
        state.reads += 1;
        match self.script.pop_front() {
            Some(result) => result,
            None => Ok(Some(sample(state.reads))),
        }
    }

    async fn disconnect(&mut self) {
        let mut state = self.monitor.state.lock().unwrap();
        state.connected = false;
        state.disconnect_calls += 1;
    }
}

// ===== OBSERVER =====

#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<PublishEvent>>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<PublishEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PublishObserver for RecordingObserver {
    fn on_event(&mut self, event: &PublishEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
