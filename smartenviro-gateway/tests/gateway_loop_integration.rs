//! Gateway loop integration tests
//!
//! Every test runs on tokio's paused clock: sleeps complete instantly in
//! wall time while `Instant` advances exactly, so cadence and shutdown
//! latency are asserted to the second.

mod common;

use std::time::Duration;

use common::{test_config, BrokerMonitor, DeviceMonitor, MockBroker, RecordingObserver, ScriptedDevice};
use smartenviro_connectors::{shutdown_channel, DeviceError, ShutdownHandle};
use smartenviro_core::SampleError;
use smartenviro_gateway::{GatewayConfig, GatewayContext, GatewayError, GatewayLoop, PublishEvent};
use tokio::time::{sleep, Instant};

struct Harness {
    gateway: GatewayLoop<MockBroker, ScriptedDevice>,
    handle: ShutdownHandle,
    broker: BrokerMonitor,
    device: DeviceMonitor,
    observer: RecordingObserver,
}

fn harness(config: GatewayConfig, broker_up: bool, device: ScriptedDevice, device_monitor: DeviceMonitor) -> Harness {
    let (client, broker) = MockBroker::new(broker_up);
    let (handle, shutdown) = shutdown_channel();
    let observer = RecordingObserver::default();
    let gateway = GatewayLoop::new(GatewayContext::new(config, client), device, shutdown)
        .with_observer(Box::new(observer.clone()));
    Harness {
        gateway,
        handle,
        broker,
        device: device_monitor,
        observer,
    }
}

fn default_harness(broker_up: bool) -> Harness {
    let (device, monitor) = ScriptedDevice::new();
    harness(test_config(100), broker_up, device, monitor)
}

fn stop_after(handle: &ShutdownHandle, after: Duration) {
    let handle = handle.clone();
    tokio::spawn(async move {
        sleep(after).await;
        handle.trigger();
    });
}

#[tokio::test(start_paused = true)]
async fn publishes_only_the_latest_reading_per_interval() {
    let mut h = default_harness(true);
    stop_after(&h.handle, Duration::from_millis(10_500));

    let stats = h.gateway.run().await.unwrap();

    // reads at t=0..=10; the readings at t=5 and t=10 are the 6th and 11th
    assert_eq!(h.device.reads(), 11);
    assert_eq!(h.broker.published_tags(), vec![6, 11]);
    assert_eq!(stats.published, 2);
    assert_eq!(stats.buffered, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_signal_ends_the_loop_within_one_tick() {
    let (device, monitor) = ScriptedDevice::new();
    let config = test_config(100).with_read_interval(2);
    let mut h = harness(config, true, device, monitor);

    let started = Instant::now();
    stop_after(&h.handle, Duration::from_millis(2_500));
    h.gateway.run().await.unwrap();

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(2_500));
    assert!(elapsed < Duration::from_millis(4_500), "took {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn device_and_broker_are_released_on_exit() {
    let mut h = default_harness(true);
    stop_after(&h.handle, Duration::from_secs(3));

    h.gateway.run().await.unwrap();

    assert!(!h.device.is_connected());
    assert_eq!(h.device.disconnect_calls(), 1);
    assert_eq!(h.broker.disconnect_calls(), 1);
    assert!(!h.gateway.coordinator().is_connected());
}

#[tokio::test(start_paused = true)]
async fn broker_outage_buffers_then_replays_in_order() {
    let (device, monitor) = ScriptedDevice::new();
    let config = test_config(100).with_max_connect_attempts(1);
    let mut h = harness(config, false, device, monitor);

    let broker = h.broker.clone();
    tokio::spawn(async move {
        sleep(Duration::from_secs(7)).await;
        broker.set_up(true);
    });
    stop_after(&h.handle, Duration::from_millis(10_500));

    let stats = h.gateway.run().await.unwrap();

    // t=0 startup connect fails, t=5 reconnect fails and tag 6 is buffered,
    // t=10 reconnect succeeds: backlog first, then the fresh reading
    assert_eq!(h.broker.connect_calls(), 3);
    assert_eq!(h.broker.published_tags(), vec![6, 11]);
    assert_eq!(stats.buffered, 1);
    assert_eq!(stats.replayed, 1);
    assert_eq!(stats.connect_failures, 2);
    assert!(h.gateway.coordinator().queue().is_empty());

    let connected = h
        .observer
        .events()
        .iter()
        .filter(|event| matches!(event, PublishEvent::Connected { .. }))
        .count();
    assert_eq!(connected, 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_device_is_fatal_and_releases_the_broker() {
    let (device, monitor) = ScriptedDevice::new();
    let mut h = harness(test_config(100), true, device.unreachable(), monitor);

    let result = h.gateway.run().await;

    match result {
        Err(GatewayError::DeviceUnavailable(name)) => assert_eq!(name, "SmartEnviro-Node-01"),
        other => panic!("expected DeviceUnavailable, got {:?}", other.map(|_| ())),
    }
    assert_eq!(h.broker.disconnect_calls(), 1);
    assert_eq!(h.device.reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_readings_are_dropped_and_read_errors_skipped() {
    let (device, monitor) = ScriptedDevice::new();
    let device = device.with_script([
        Err(DeviceError::Malformed(SampleError::EmptyDeviceId)),
        Err(DeviceError::Read("characteristic read timed out".into())),
        Ok(None),
    ]);
    let mut h = harness(test_config(100), true, device, monitor);
    stop_after(&h.handle, Duration::from_millis(5_500));

    let stats = h.gateway.run().await.unwrap();

    assert_eq!(stats.dropped, 1);
    // reads 4..=6 are real samples; the one at t=5 is published
    assert_eq!(h.broker.published_tags(), vec![6]);
    assert!(h
        .observer
        .events()
        .iter()
        .any(|event| matches!(event, PublishEvent::Dropped { error: SampleError::EmptyDeviceId })));
}

#[tokio::test(start_paused = true)]
async fn stop_during_startup_retries_is_prompt() {
    let mut h = default_harness(false);

    let started = Instant::now();
    stop_after(&h.handle, Duration::from_secs(2));
    let stats = h.gateway.run().await.unwrap();

    // the 5 s retry delay is cut short and the device is never scanned
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(h.broker.connect_calls(), 1);
    assert_eq!(h.device.reads(), 0);
    assert_eq!(stats.connect_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn stop_during_a_stalled_handshake_is_prompt() {
    let mut h = default_harness(true);
    h.broker.stall_connect();

    let started = Instant::now();
    stop_after(&h.handle, Duration::from_secs(1));
    let stats = h.gateway.run().await.unwrap();

    // the 10 s connect timeout is abandoned as soon as the stop arrives
    assert!(started.elapsed() <= Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(h.broker.connect_calls(), 1);
    assert_eq!(h.device.reads(), 0);
    assert_eq!(stats.connect_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn silent_device_times_out_as_unavailable() {
    let (device, monitor) = ScriptedDevice::new();
    let config = test_config(100).with_scan_timeout(4);
    let mut h = harness(config, true, device.stalled(), monitor);

    let started = Instant::now();
    let result = h.gateway.run().await;

    assert!(matches!(result, Err(GatewayError::DeviceUnavailable(_))));
    assert_eq!(started.elapsed(), Duration::from_secs(4));
    assert_eq!(h.device.disconnect_calls(), 1);
    assert_eq!(h.broker.disconnect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn stop_during_device_scan_is_prompt() {
    let (device, monitor) = ScriptedDevice::new();
    let mut h = harness(test_config(100), true, device.stalled(), monitor);

    let started = Instant::now();
    stop_after(&h.handle, Duration::from_secs(1));
    h.gateway.run().await.unwrap();

    assert!(started.elapsed() <= Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(h.device.reads(), 0);
    assert_eq!(h.broker.disconnect_calls(), 1);
}
