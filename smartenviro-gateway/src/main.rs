//! `smartenviro-gateway [config.json]`
//!
//! Runs the gateway against the configured broker with the simulated sensor
//! node until Ctrl-C.

use std::path::PathBuf;

use anyhow::Context;
use log::{info, warn};
use smartenviro_connectors::{shutdown_channel, MqttClient, SimulatedDevice};
use smartenviro_core::SystemTime;
use smartenviro_gateway::{GatewayConfig, GatewayContext, GatewayLoop};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let path = std::env::args_os().nth(1).map(PathBuf::from);
    if path.is_none() {
        info!("No configuration file given, using defaults");
    }
    let config = GatewayConfig::load(path.as_deref()).context("loading configuration")?;

    let (handle, shutdown) = shutdown_channel();
    let signal = handle.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                signal.trigger();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });

    let client = MqttClient::new(config.mqtt_config());
    let device = SimulatedDevice::new(config.broker.client_id.clone(), Box::new(SystemTime));
    let context = GatewayContext::new(config, client);

    let mut gateway = GatewayLoop::new(context, device, shutdown);
    let stats = gateway.run().await.context("gateway failed")?;

    println!("{}", stats);
    drop(handle);
    Ok(())
}
