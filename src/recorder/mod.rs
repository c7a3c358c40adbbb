//! Recording engine
//!
//! Normalized input flows through the delta clock and the command encoder
//! into the session buffer; the persister writes the buffer out as a
//! numbered script when the session stops.

pub mod buffer;
pub mod channel;
pub mod clock;
pub mod coordinator;
pub mod encoder;
pub mod notify;
pub mod persister;
pub mod session;
pub mod state;

pub use buffer::SessionBuffer;
pub use channel::{RecordingError, RecordingResult};
pub use clock::{DeltaTimer, SleepThresholds};
pub use coordinator::{Message, Recorder};
pub use encoder::{CommandEncoder, CommandLine, CoordinateMode};
pub use notify::{StatusNotifier, TracingNotifier};
pub use persister::{Persister, SavedScript};
pub use session::RecordingSession;
pub use state::{RecordingState, StopOutcome};
