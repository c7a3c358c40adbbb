//! Macro Recorder - record keyboard and mouse input as replayable scripts.
//!
//! This is the main library crate. It wires the platform hooks to the
//! recording engine and runs until interrupted.

pub mod capture;
pub mod config;
pub mod recorder;

use anyhow::Context;
use config::RecorderConfig;
use recorder::{Recorder, TracingNotifier};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run the recorder until Ctrl+C
pub fn run() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "macro_recorder_lib=debug,macro_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Macro Recorder v{}", env!("CARGO_PKG_VERSION"));

    let config = RecorderConfig::load_default().context("failed to load configuration")?;
    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;

    runtime.block_on(async move {
        let hotkey_name = config.hotkey.clone();
        let recorder = Recorder::spawn(
            config,
            capture::platform_input_source(),
            Arc::new(TracingNotifier),
        )
        .context("failed to start recorder")?;

        let mut hotkey = capture::platform_hotkey_source();
        hotkey
            .listen(&hotkey_name, recorder.hook_sink())
            .context("failed to install hotkey listener")?;

        tracing::info!(
            "Press {} to start or stop recording, Ctrl+C to quit (next script: {}.txt)",
            hotkey_name,
            recorder.current_file_number()
        );

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to wait for Ctrl+C: {}", e);
        }

        hotkey.shutdown();
        recorder.shutdown().await;
        tracing::info!("Macro Recorder stopped");
        Ok(())
    })
}
