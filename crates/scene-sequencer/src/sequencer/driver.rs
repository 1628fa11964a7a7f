use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::{Result, SequencerError};
use super::{PlaybackSnapshot, SceneSequencer, SequencerConfig, SequencerEvent};

const EVENT_CAPACITY: usize = 1024;

/// Transport command delivered to the driver task
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencerCommand {
	Play,
	Pause,
	Resume,
	Restart,
	SkipToEnd,
	SkipToScene(usize),
	SetSpeed(f64),
}

impl SequencerCommand {
	fn apply(self, sequencer: &mut SceneSequencer) {
		match self {
			Self::Play => sequencer.play(),
			Self::Pause => sequencer.pause(),
			Self::Resume => sequencer.resume(),
			Self::Restart => sequencer.restart(),
			Self::SkipToEnd => sequencer.skip_to_end(),
			Self::SkipToScene(index) => sequencer.skip_to_scene(index),
			Self::SetSpeed(rate) => sequencer.set_playback_speed(rate),
		}
	}
}

/// Runs a sequencer on a tokio task and pumps its frame clock.
///
/// Commands are fire-and-forget; state is observed through [`Self::subscribe`]
/// and events through [`Self::events`].
#[derive(Debug)]
pub struct SequencerDriver {
	command_tx: mpsc::UnboundedSender<SequencerCommand>,
	state_rx: watch::Receiver<PlaybackSnapshot>,
	event_tx: broadcast::Sender<SequencerEvent>,
	task_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
	cancel_token: CancellationToken,
}

impl SequencerDriver {
	/// Initialize the sequencer and start the driver task. Must be called
	/// inside a tokio runtime.
	pub fn spawn(mut sequencer: SceneSequencer, config: SequencerConfig) -> Result<Self> {
		config.validate()?;
		sequencer.initialize()?;

		let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
		let forward = event_tx.clone();
		sequencer.subscribe_all(move |event| {
			// no receivers is fine
			let _ = forward.send(*event);
		});

		sequencer.set_playback_speed(config.playback_speed);
		if config.autoplay {
			sequencer.play();
		}

		let (state_tx, state_rx) = watch::channel(sequencer.snapshot());
		let (command_tx, command_rx) = mpsc::unbounded_channel();
		let cancel_token = CancellationToken::new();

		let task_handle = tokio::spawn(run(sequencer, config, command_rx, state_tx, cancel_token.clone()));

		info!("SequencerDriver started");

		Ok(Self {
			command_tx,
			state_rx,
			event_tx,
			task_handle: Arc::new(Mutex::new(Some(task_handle))),
			cancel_token,
		})
	}

	pub fn send(&self, command: SequencerCommand) -> Result<()> {
		self
			.command_tx
			.send(command)
			.map_err(|_| SequencerError::Internal("Failed to send command".into()))
	}

	pub fn play(&self) -> Result<()> {
		self.send(SequencerCommand::Play)
	}
	pub fn pause(&self) -> Result<()> {
		self.send(SequencerCommand::Pause)
	}
	pub fn resume(&self) -> Result<()> {
		self.send(SequencerCommand::Resume)
	}
	pub fn restart(&self) -> Result<()> {
		self.send(SequencerCommand::Restart)
	}
	pub fn skip_to_end(&self) -> Result<()> {
		self.send(SequencerCommand::SkipToEnd)
	}
	pub fn skip_to_scene(&self, index: usize) -> Result<()> {
		self.send(SequencerCommand::SkipToScene(index))
	}
	pub fn set_playback_speed(&self, rate: f64) -> Result<()> {
		self.send(SequencerCommand::SetSpeed(rate))
	}

	// Access state
	pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
		self.state_rx.clone()
	}
	pub fn current_state(&self) -> PlaybackSnapshot {
		self.state_rx.borrow().clone()
	}
	pub fn events(&self) -> broadcast::Receiver<SequencerEvent> {
		self.event_tx.subscribe()
	}

	/// Stop the task; the sequencer is destroyed on the way out
	pub async fn shutdown(&self) {
		self.cancel_token.cancel();
		if let Some(handle) = self.task_handle.lock().await.take() {
			let _ = handle.await;
		}
	}
}

async fn run(
	mut sequencer: SceneSequencer,
	config: SequencerConfig,
	mut command_rx: mpsc::UnboundedReceiver<SequencerCommand>,
	state_tx: watch::Sender<PlaybackSnapshot>,
	cancel: CancellationToken,
) {
	let mut ticker = interval(config.tick_interval());
	ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				if sequencer.is_playing() {
					sequencer.tick();
					state_tx.send_replace(sequencer.snapshot());
				}
			}

			command = command_rx.recv() => match command {
				Some(command) => {
					debug!(?command, "Applying command");
					command.apply(&mut sequencer);
					state_tx.send_replace(sequencer.snapshot());
				}
				None => {
					debug!("Command channel closed");
					break;
				}
			},

			_ = cancel.cancelled() => {
				info!("SequencerDriver cancelled");
				break;
			}
		}
	}

	sequencer.destroy();
	state_tx.send_replace(sequencer.snapshot());
}
