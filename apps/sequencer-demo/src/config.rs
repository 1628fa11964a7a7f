use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "sequencer-demo")]
#[command(about = "Plays a scene table in the terminal and logs every event", long_about = None)]
pub struct Config {
	/// JSON array of scenes; the built-in landing presentation when omitted
	#[arg(long, env = "SCENES_FILE")]
	pub scenes_file: Option<PathBuf>,

	/// Frame interval in milliseconds
	#[arg(long, env = "TICK_INTERVAL_MS", default_value = "16")]
	pub tick_interval_ms: u64,

	/// Playback rate, 1.0 is real time
	#[arg(long, env = "PLAYBACK_SPEED", default_value = "1.0")]
	pub playback_speed: f64,

	/// Seek to this scene before playing
	#[arg(long, env = "START_SCENE")]
	pub start_scene: Option<usize>,

	/// Log progress events too
	#[arg(long, env = "LOG_PROGRESS", default_value = "false")]
	pub log_progress: bool,

	#[arg(long, env = "LOG_JSON", default_value = "false")]
	pub log_json: bool,

	#[arg(long, env = "RUST_LOG", default_value = "info")]
	pub rust_log: String,
}

impl Config {
	/// Validate configuration values
	pub fn validate(&self) -> Result<(), String> {
		if self.tick_interval_ms == 0 {
			return Err("tick_interval_ms must be greater than 0".to_string());
		}

		if !(self.playback_speed.is_finite() && self.playback_speed > 0.0) {
			return Err("playback_speed must be a positive number".to_string());
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_are_valid() {
		let config = Config::parse_from(["sequencer-demo"]);
		assert!(config.validate().is_ok());
		assert_eq!(config.tick_interval_ms, 16);
		assert!(config.scenes_file.is_none());
		assert_eq!(config.rust_log, "info");
	}

	#[test]
	fn rejects_zero_speed() {
		let config = Config::parse_from(["sequencer-demo", "--playback-speed", "0"]);
		assert!(config.validate().is_err());
	}
}
