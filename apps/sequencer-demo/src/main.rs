mod config;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use scene_sequencer::sequencer::{SceneTable, SequencerConfig, SequencerEvent};
use scene_sequencer::AppContext;
use std::str::FromStr;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{filter::EnvFilter, fmt::format::JsonFields, layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::Config;

fn init_tracing(config: &Config) -> Result<()> {
	let filter = EnvFilter::from_str(&config.rust_log).context("invalid RUST_LOG")?;

	tracing_subscriber::registry()
		.with(if config.log_json {
			Box::new(
				tracing_subscriber::fmt::layer()
					.fmt_fields(JsonFields::default())
					.event_format(tracing_subscriber::fmt::format().json().flatten_event(true).with_span_list(false))
					.with_filter(filter),
			) as Box<dyn Layer<_> + Send + Sync>
		} else {
			Box::new(tracing_subscriber::fmt::layer().event_format(tracing_subscriber::fmt::format().pretty()).with_filter(filter))
		})
		.init();
	Ok(())
}

async fn load_scenes(config: &Config) -> Result<SceneTable> {
	let Some(path) = &config.scenes_file else {
		return Ok(SceneTable::default_presentation());
	};

	let json = tokio::fs::read_to_string(path).await.with_context(|| format!("reading {}", path.display()))?;
	SceneTable::from_json(&json).with_context(|| format!("parsing {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
	let config = Config::parse();
	config.validate().map_err(|e| anyhow!(e))?;
	init_tracing(&config)?;

	let scenes = load_scenes(&config).await?;
	tracing::info!(scenes = scenes.len(), total_duration = scenes.total_duration(), "Loaded scene table");
	for (index, scene) in scenes.iter().enumerate() {
		tracing::info!(scene = %scenes.label(index), duration = scene.duration, delay = scene.delay, "Scene");
	}

	let sequencer_config = SequencerConfig::new().with_tick_interval(config.tick_interval_ms).with_speed(config.playback_speed);
	let ctx = AppContext::new(scenes, sequencer_config)?;
	let driver = ctx.sequencer();

	// subscribe before the first command so Play and the opening frames are logged
	let mut events = driver.events();
	if let Some(index) = config.start_scene {
		driver.skip_to_scene(index)?;
	}
	driver.play()?;

	loop {
		tokio::select! {
			event = events.recv() => match event {
				Ok(SequencerEvent::Progress(fraction)) => {
					if config.log_progress {
						tracing::info!(progress = fraction, "Progress");
					}
				}
				Ok(event) => {
					let state = driver.current_state();
					tracing::info!(event = %event.kind(), scene = state.current_scene, cursor = state.cursor, "Event");
					if matches!(event, SequencerEvent::Complete | SequencerEvent::Skip) {
						break;
					}
				}
				Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "Event receiver lagged"),
				Err(RecvError::Closed) => break,
			},

			_ = tokio::signal::ctrl_c() => {
				tracing::info!("Received shutdown signal");
				driver.skip_to_end()?;
			}
		}
	}

	ctx.shutdown().await;
	tracing::info!("Sequencer demo stopped");
	Ok(())
}
