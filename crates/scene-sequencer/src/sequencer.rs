mod clock;
mod config;
mod driver;
mod emitter;
mod engine;
mod error;
mod events;
mod state;
mod timeline;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{SceneCallback, SceneDescriptor, SceneSpec, SceneTable, SequencerConfig};
pub use driver::{SequencerCommand, SequencerDriver};
pub use emitter::{EventEmitter, Listener, ListenerId, Subscription};
pub use engine::SceneSequencer;
pub use error::{CallbackHook, Result, SequencerError};
pub use events::{EventKind, SequencerEvent};
pub use state::{PerformanceInfo, PlaybackSnapshot};
pub use timeline::{Mark, MarkCursor, MarkKind, Timeline};

/// Time in seconds
pub type Seconds = f64;
