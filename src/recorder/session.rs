//! Recording session state machine
//!
//! `Idle --start--> Recording --stop--> Idle`; the toggle hotkey drives both
//! edges. The session owns every piece of mutable recording state and is
//! only ever touched by one thread (the coordinator's logic task).

use crate::capture::input::hook::{HookSink, InputSource};
use crate::capture::input::normalizer::EventNormalizer;
use crate::capture::input::types::RawInputEvent;
use crate::config::RecorderConfig;
use crate::recorder::buffer::SessionBuffer;
use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::recorder::clock::DeltaTimer;
use crate::recorder::encoder::{CommandEncoder, CoordinateMode};
use crate::recorder::notify::StatusNotifier;
use crate::recorder::persister::Persister;
use crate::recorder::state::{RecordingState, StopOutcome};
use std::sync::Arc;
use uuid::Uuid;

pub struct RecordingSession {
    state: RecordingState,
    config: RecorderConfig,
    mode_override: Option<CoordinateMode>,
    session_id: Option<Uuid>,

    normalizer: EventNormalizer,
    clock: DeltaTimer,
    encoder: CommandEncoder,
    buffer: SessionBuffer,
    persister: Persister,

    source: Box<dyn InputSource>,
    sink: HookSink,
    notifier: Arc<dyn StatusNotifier>,
}

impl RecordingSession {
    pub fn new(
        config: RecorderConfig,
        persister: Persister,
        source: Box<dyn InputSource>,
        sink: HookSink,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        Self {
            state: RecordingState::Idle,
            normalizer: EventNormalizer::new(config.hotkey.clone(), config.move_policy),
            clock: DeltaTimer::new(config.sleep_thresholds()),
            encoder: CommandEncoder::new(config.coordinate_mode, config.record_sleep),
            buffer: SessionBuffer::new(),
            config,
            mode_override: None,
            session_id: None,
            persister,
            source,
            sink,
            notifier,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecordingState::Recording
    }

    pub fn buffer(&self) -> &SessionBuffer {
        &self.buffer
    }

    /// Number the next saved script will get
    pub fn current_file_number(&self) -> u64 {
        self.persister.next_sequence()
    }

    /// Applies from the next session start; the running session keeps its mode.
    pub fn set_coordinate_mode(&mut self, mode: CoordinateMode) {
        self.mode_override = Some(mode);
    }

    pub fn coordinate_mode(&self) -> CoordinateMode {
        self.encoder.mode()
    }

    /// Start from the control surface; the first action's gap counts from `t`.
    pub fn start(&mut self, t: u64) -> RecordingResult<()> {
        self.begin(Some(t))
    }

    /// Without an anchor the first action carries no `Sleep`: the gap would
    /// end at the hotkey press, which is never written.
    fn begin(&mut self, anchor: Option<u64>) -> RecordingResult<()> {
        if self.is_recording() {
            return Err(RecordingError::AlreadyRecording);
        }

        let settings = self.config.session_settings();
        let mode = self.mode_override.unwrap_or(settings.coordinate_mode);

        if let Err(e) = self.persister.refresh() {
            tracing::warn!("Could not rescan {:?}: {}", self.persister.dir(), e);
        }

        let position = self.source.cursor_position().unwrap_or_else(|| {
            tracing::warn!("Pointer position unavailable at start, using (0, 0)");
            (0, 0)
        });

        if let Err(e) = self.source.attach(self.sink.clone()) {
            tracing::warn!("Not starting, hooks failed: {}", e);
            self.notifier.notify(&format!("Error starting recording: {}", e));
            return Err(e);
        }

        self.buffer.clear();
        self.normalizer.reset(position.0, position.1);
        self.clock.start(anchor);
        self.encoder.begin(mode, settings.record_sleep, position);

        let session_id = Uuid::new_v4();
        self.session_id = Some(session_id);
        self.state = RecordingState::Recording;

        tracing::info!(
            %session_id,
            mode = %mode,
            record_sleep = settings.record_sleep,
            "Recording started at ({}, {})",
            position.0,
            position.1
        );
        self.notifier.notify("Recording");
        Ok(())
    }

    /// Detach hooks, persist the buffer and return to idle, whatever the outcome.
    pub fn stop(&mut self) -> StopOutcome {
        if !self.is_recording() {
            return StopOutcome::NotRecording;
        }

        // Flip first: anything still queued from the hooks is now ignored
        self.state = RecordingState::Idle;
        self.source.detach();

        let buffer = self.buffer.take();
        let session_id = self.session_id.take();

        let outcome = if buffer.is_empty() {
            self.notifier.notify("No actions recorded");
            StopOutcome::Empty
        } else {
            match self.persister.persist(&buffer, &self.config.hotkey) {
                Ok(saved) => {
                    self.notifier.notify(&format!("Saved to {}", saved.file_name));
                    StopOutcome::Saved(saved)
                }
                Err(e) => {
                    tracing::warn!(?session_id, "Failed to save recording: {}", e);
                    self.notifier.notify(&format!("Error saving file: {}", e));
                    StopOutcome::Failed {
                        error: e.to_string(),
                        lines: buffer.render(),
                    }
                }
            }
        };

        self.normalizer.clear();
        self.clock.clear();
        self.encoder.clear();

        tracing::info!(?session_id, "Recording stopped ({} commands)", buffer.len());
        outcome
    }

    /// Toggle hotkey: starts when idle, stops when recording.
    pub fn hotkey_pressed(&mut self, t: u64) -> RecordingState {
        tracing::debug!("Hotkey pressed at {} ms", t);
        match self.state {
            RecordingState::Idle => {
                // Failures are already reported through the notifier
                let _ = self.begin(None);
            }
            RecordingState::Recording => {
                self.stop();
            }
        }
        self.state
    }

    /// Feed one hook event; returns how many lines were appended.
    pub fn handle_input(&mut self, raw: RawInputEvent) -> usize {
        if !self.is_recording() {
            return 0;
        }
        let Some(event) = self.normalizer.normalize(raw) else {
            return 0;
        };
        let delay = self
            .clock
            .significant_delay(event.timestamp(), event.is_pointer_move());
        let lines = self.encoder.encode(&event, delay);
        let appended = lines.len();
        self.buffer.extend(lines);
        appended
    }
}
