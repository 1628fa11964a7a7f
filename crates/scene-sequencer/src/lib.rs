pub mod collaborators;
pub mod context;
pub mod sequencer;

pub use context::AppContext;
pub use sequencer::{SceneSequencer, SceneTable, SequencerConfig, SequencerDriver, SequencerError, SequencerEvent};
