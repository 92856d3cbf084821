// Event Timer - headless runner
// Runs an alarm template against a stopwatch and rings through the default audio output

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::sync::Arc;

use event_timer::{
    alarm::follow_time_signal, config::Config, context::AppContext, stopwatch::Stopwatch,
};

/// Template used when none is given on the command line
const DEFAULT_TEMPLATE: &str = "speech-15";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Event Timer");

    // Load configuration
    let config = Config::load()?;
    config.validate().context("Invalid configuration")?;
    tracing::info!("Configuration loaded: {:?}", config);

    let template_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    let ctx = AppContext::init(config)?;

    let mut engine = ctx.alarm_engine();
    ctx.apply_template(&template_id, &mut engine)
        .with_context(|| format!("Failed to load template '{}'", template_id))?;
    for point in engine.time_points() {
        tracing::info!(at = %point.label(), rings = point.ring_count, "Alarm scheduled");
    }
    let engine = Arc::new(Mutex::new(engine));

    let mut stopwatch = Stopwatch::new();
    let watcher = tokio::spawn(follow_time_signal(engine.clone(), stopwatch.subscribe()));
    stopwatch.start();

    let mut ticker = tokio::time::interval(ctx.config().tick_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last_second = 0;
    let finished = loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Signal handler failed");
                }
                tracing::info!("Received SIGINT, exiting gracefully");
                break false;
            }
            _ = ticker.tick() => {
                let seconds = stopwatch.tick();
                if seconds != last_second {
                    last_second = seconds;
                    tracing::debug!(elapsed = %stopwatch.formatted_time(), "Tick");
                }
                if engine.lock().is_exhausted() {
                    tracing::info!(elapsed = %stopwatch.formatted_time(), "All alarms fired");
                    break true;
                }
            }
        }
    };

    stopwatch.pause();
    drop(stopwatch);
    if let Err(e) = watcher.await {
        tracing::error!(error = %e, "Alarm watcher task failed");
    }

    // Let the last alarms ring out before the runtime goes away
    if finished {
        let pending = ctx.driver().pending_sequences();
        if pending > 0 {
            tracing::info!(pending, "Waiting for ringtones to finish");
        }
        ctx.driver().wait_idle().await;
    }

    Ok(())
}
