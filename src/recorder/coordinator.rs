//! Recording coordinator
//!
//! Hook threads and the control surface both post [`Message`]s onto one
//! unbounded channel. A single logic task drains it and is the only owner
//! of the [`RecordingSession`], so session state never needs a lock.

use crate::capture::input::hook::{HookMessage, HookSink, InputSource, Timebase};
use crate::config::RecorderConfig;
use crate::recorder::channel::{RecordingError, RecordingResult};
use crate::recorder::encoder::CoordinateMode;
use crate::recorder::notify::StatusNotifier;
use crate::recorder::persister::Persister;
use crate::recorder::session::RecordingSession;
use crate::recorder::state::StopOutcome;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Everything the logic task can be asked to do
#[derive(Debug)]
pub enum Message {
    Hook(HookMessage),
    Start {
        t: u64,
        reply: oneshot::Sender<RecordingResult<()>>,
    },
    Stop {
        reply: oneshot::Sender<StopOutcome>,
    },
    SetCoordinateMode(CoordinateMode),
    Shutdown,
}

/// Values the control surface can read without a round trip
#[derive(Debug, Default)]
struct Published {
    recording: AtomicBool,
    file_number: AtomicU64,
}

impl Published {
    fn update(&self, session: &RecordingSession) {
        self.recording.store(session.is_recording(), Ordering::SeqCst);
        self.file_number.store(session.current_file_number(), Ordering::SeqCst);
    }
}

/// Control surface of the recording engine
pub struct Recorder {
    tx: UnboundedSender<Message>,
    timebase: Timebase,
    published: Arc<Published>,
    task: Option<JoinHandle<()>>,
}

impl Recorder {
    /// Spawn the logic task. Must be called inside a tokio runtime.
    pub fn spawn(
        config: RecorderConfig,
        source: Box<dyn InputSource>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> RecordingResult<Self> {
        config.validate()?;
        let (tx, rx) = unbounded_channel();
        let timebase = Timebase::new();
        let persister = Persister::new(&config.output_dir)?;
        let session = RecordingSession::new(
            config,
            persister,
            source,
            HookSink::new(tx.clone(), timebase),
            notifier,
        );

        let published = Arc::new(Published::default());
        published.update(&session);
        let task = tokio::spawn(run_logic(session, rx, published.clone()));

        Ok(Self {
            tx,
            timebase,
            published,
            task: Some(task),
        })
    }

    /// Sink for hotkey listeners
    pub fn hook_sink(&self) -> HookSink {
        HookSink::new(self.tx.clone(), self.timebase)
    }

    pub async fn start_recording(&self) -> RecordingResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Start {
            t: self.timebase.now_ms(),
            reply,
        })?;
        rx.await.map_err(|_| RecordingError::EngineStopped)?
    }

    pub async fn stop_recording(&self) -> RecordingResult<StopOutcome> {
        let (reply, rx) = oneshot::channel();
        self.send(Message::Stop { reply })?;
        rx.await.map_err(|_| RecordingError::EngineStopped)
    }

    pub fn is_recording(&self) -> bool {
        self.published.recording.load(Ordering::SeqCst)
    }

    /// Takes effect at the next session start.
    pub fn set_coordinate_mode(&self, mode: CoordinateMode) -> RecordingResult<()> {
        self.send(Message::SetCoordinateMode(mode))
    }

    pub fn current_file_number(&self) -> u64 {
        self.published.file_number.load(Ordering::SeqCst)
    }

    /// Stop any running session (saving it) and wait for the logic task.
    pub async fn shutdown(mut self) {
        let _ = self.tx.send(Message::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!("Recorder task ended abnormally: {}", e);
            }
        }
    }

    fn send(&self, message: Message) -> RecordingResult<()> {
        self.tx
            .send(message)
            .map_err(|_| RecordingError::EngineStopped)
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.tx.send(Message::Shutdown);
        }
    }
}

async fn run_logic(
    mut session: RecordingSession,
    mut rx: UnboundedReceiver<Message>,
    published: Arc<Published>,
) {
    tracing::debug!("Recorder logic task started");

    while let Some(message) = rx.recv().await {
        match message {
            Message::Hook(HookMessage::Input(event)) => {
                session.handle_input(event);
            }
            Message::Hook(HookMessage::Hotkey { t }) => {
                session.hotkey_pressed(t);
                published.update(&session);
            }
            Message::Start { t, reply } => {
                let result = session.start(t);
                published.update(&session);
                let _ = reply.send(result);
            }
            Message::Stop { reply } => {
                let outcome = session.stop();
                published.update(&session);
                let _ = reply.send(outcome);
            }
            Message::SetCoordinateMode(mode) => {
                session.set_coordinate_mode(mode);
            }
            Message::Shutdown => break,
        }
    }

    session.stop();
    published.update(&session);
    tracing::debug!("Recorder logic task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::input::hook::testing::ScriptedSource;
    use crate::capture::input::types::{MouseButton, RawInputEvent};
    use crate::recorder::notify::testing::CollectingNotifier;

    fn spawn(dir: &std::path::Path, source: ScriptedSource) -> (Recorder, Arc<CollectingNotifier>) {
        let notifier = Arc::new(CollectingNotifier::default());
        let config = RecorderConfig {
            output_dir: dir.to_path_buf(),
            ..RecorderConfig::default()
        };
        let recorder = Recorder::spawn(config, Box::new(source), notifier.clone()).unwrap();
        (recorder, notifier)
    }

    fn click(pressed: bool, t: u64) -> RawInputEvent {
        RawInputEvent::PointerButton {
            x: 150,
            y: 150,
            button: MouseButton::Left,
            pressed,
            t,
        }
    }

    #[tokio::test]
    async fn test_control_surface_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("4.txt"), "older").unwrap();
        let source = ScriptedSource::at(100, 100);
        let log = source.log.clone();
        let (recorder, notifier) = spawn(dir.path(), source);

        assert_eq!(recorder.current_file_number(), 5);
        assert!(!recorder.is_recording());

        recorder.start_recording().await.unwrap();
        assert!(recorder.is_recording());
        assert!(matches!(
            recorder.start_recording().await,
            Err(RecordingError::AlreadyRecording)
        ));

        let sink = log.lock().sink.clone().unwrap();
        let t = sink.now_ms();
        sink.input(click(true, t));
        sink.input(click(false, t + 10));

        let outcome = recorder.stop_recording().await.unwrap();
        let saved = match outcome {
            StopOutcome::Saved(saved) => saved,
            other => panic!("expected save, got {:?}", other),
        };
        assert_eq!(saved.file_name, "5.txt");
        assert!(!recorder.is_recording());
        assert_eq!(recorder.current_file_number(), 6);

        let content = std::fs::read_to_string(saved.path).unwrap();
        assert!(content.contains("Click, 150, 150 Left, , Down\n"));
        assert!(content.ends_with("Click, 150, 150 Left, , Up\n"));
        assert_eq!(notifier.messages(), vec!["Recording", "Saved to 5.txt"]);

        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_hotkey_toggles_through_channel() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::at(100, 100);
        let log = source.log.clone();
        let (recorder, _notifier) = spawn(dir.path(), source);
        let hotkey = recorder.hook_sink();

        hotkey.hotkey(0);
        // Queued behind the hotkey, so it sees the started session
        assert!(matches!(
            recorder.start_recording().await,
            Err(RecordingError::AlreadyRecording)
        ));

        let sink = log.lock().sink.clone().unwrap();
        sink.input(click(true, 1000));
        sink.input(click(false, 1020));
        hotkey.hotkey(2000);
        // Queued behind the stop, must be ignored
        sink.input(click(true, 2100));

        assert!(matches!(
            recorder.stop_recording().await.unwrap(),
            StopOutcome::NotRecording
        ));
        let content = std::fs::read_to_string(dir.path().join("1.txt")).unwrap();
        let lines: Vec<&str> = content.lines().skip(1).collect();
        assert_eq!(lines, vec!["Click, 150, 150 Left, , Down", "Click, 150, 150 Left, , Up"]);

        recorder.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_saves_running_session() {
        let dir = tempfile::tempdir().unwrap();
        let source = ScriptedSource::at(0, 0);
        let log = source.log.clone();
        let (recorder, _notifier) = spawn(dir.path(), source);

        recorder.start_recording().await.unwrap();
        let sink = log.lock().sink.clone().unwrap();
        sink.input(RawInputEvent::Wheel { delta: 120, t: sink.now_ms() });
        recorder.shutdown().await;

        assert!(dir.path().join("1.txt").exists());
        assert_eq!(log.lock().detached, 1);
    }

    #[tokio::test]
    async fn test_hook_failure_reported_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let (recorder, notifier) = spawn(dir.path(), ScriptedSource::failing());

        assert!(matches!(
            recorder.start_recording().await,
            Err(RecordingError::HookInstall(_))
        ));
        assert!(!recorder.is_recording());
        assert_eq!(notifier.messages().len(), 1);
        recorder.shutdown().await;
    }
}
