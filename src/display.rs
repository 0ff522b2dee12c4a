use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};

use crate::clip::Clip;
use crate::memory;
use crate::player::{ClipPlayer, start_clip_playback};
use crate::services::VideoCharacterService;
use crate::types::{Emotion, Frame, PlaybackQuality, VideoMetrics, VideoState};

const LOAD_FAILED_MESSAGE: &str = "Failed to load character video";
const TRANSITION_FAILED_MESSAGE: &str = "Video transition failed";
const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Optional observers the host wires in. All hooks run on the UI thread
/// from inside `pump`.
#[derive(Default)]
pub struct DisplayHooks {
    pub on_performance_metrics: Option<Box<dyn Fn(&VideoMetrics)>>,
    pub on_memory_usage: Option<Box<dyn Fn(u64)>>,
    pub on_video_change: Option<Box<dyn Fn(&Path)>>,
    pub on_error: Option<Box<dyn Fn(&str)>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadKind {
    Initial,
    Transition,
}

enum LoadEvent {
    Loaded {
        kind: LoadKind,
        path: PathBuf,
        clip: Arc<Clip>,
        started: Instant,
    },
    Failed {
        kind: LoadKind,
        error: String,
    },
}

#[derive(Default)]
struct Slot {
    player: Option<ClipPlayer>,
    path: Option<PathBuf>,
}

/// The character display state machine: two player slots with a toggled
/// active index, loading/error/transition tracking, and the collaborator
/// hooks. Preloads run on worker threads; their results arrive as events
/// drained by `pump`, which the render loop calls every frame.
pub struct CharacterDisplay {
    service: Arc<dyn VideoCharacterService>,
    character_id: String,
    emotion: Option<Emotion>,
    auto_play: bool,
    is_playing: bool,
    state: VideoState,
    slots: [Slot; 2],
    active: usize,
    hooks: DisplayHooks,
    last_metrics: Option<VideoMetrics>,
    last_memory: Option<u64>,
    last_memory_sample: Instant,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
    frame_tx: Sender<Frame>,
    frame_rx: Receiver<Frame>,
    latest_frame: Option<Frame>,
}

impl CharacterDisplay {
    pub fn new(
        service: Arc<dyn VideoCharacterService>,
        character_id: impl Into<String>,
        emotion: Option<Emotion>,
        auto_play: bool,
        hooks: DisplayHooks,
    ) -> CharacterDisplay {
        let (events_tx, events_rx) = unbounded();
        let (frame_tx, frame_rx) = bounded(2);

        let mut display = CharacterDisplay {
            service,
            character_id: character_id.into(),
            emotion,
            auto_play,
            is_playing: true,
            state: VideoState::default(),
            slots: [Slot::default(), Slot::default()],
            active: 0,
            hooks,
            last_metrics: None,
            last_memory: None,
            last_memory_sample: Instant::now(),
            events_tx,
            events_rx,
            frame_tx,
            frame_rx,
            latest_frame: None,
        };
        display.begin_initial_load();
        display
    }

    pub fn state(&self) -> &VideoState {
        &self.state
    }

    pub fn emotion(&self) -> Option<Emotion> {
        self.emotion
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn last_metrics(&self) -> Option<&VideoMetrics> {
        self.last_metrics.as_ref()
    }

    pub fn memory_usage(&self) -> Option<u64> {
        self.last_memory
    }

    /// The newest frame emitted by the active player, if any arrived since
    /// the last call.
    pub fn take_latest_frame(&mut self) -> Option<Frame> {
        self.latest_frame.take()
    }

    /// Switch the displayed emotion. A request made while a load or
    /// transition is in flight is dropped, not queued; the caller may see the
    /// displayed emotion lag the requested one.
    pub fn set_emotion(&mut self, emotion: Option<Emotion>) {
        if self.emotion == emotion {
            return;
        }
        if self.state.is_transitioning || self.state.is_loading {
            log::debug!("emotion change dropped while a load is in flight");
            return;
        }

        self.emotion = emotion;
        if self.state.has_error {
            self.begin_initial_load();
        } else {
            self.begin_transition();
        }
    }

    /// Switch characters. Always a full reload, never a cross-fade.
    pub fn set_character(&mut self, character_id: impl Into<String>) {
        let character_id = character_id.into();
        if self.character_id == character_id {
            return;
        }
        if self.state.is_transitioning || self.state.is_loading {
            log::debug!("character change dropped while a load is in flight");
            return;
        }

        self.character_id = character_id;
        self.begin_initial_load();
    }

    /// Play or pause the active slot. Failures are logged, never surfaced as
    /// component error state.
    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
        if self.state.is_loading || self.state.has_error {
            return;
        }
        if let Some(player) = self.slots[self.active].player.as_ref() {
            if playing {
                if let Err(err) = player.play() {
                    log::warn!("failed to resume playback: {err:#}");
                }
            } else {
                player.pause();
            }
        }
    }

    /// Re-trigger a load of the current clip. Only available in the error
    /// state.
    pub fn retry(&mut self) {
        if !self.state.has_error {
            return;
        }
        self.state.has_error = false;
        self.state.error_message.clear();
        self.state.is_loading = true;

        match self.state.current_video_path.clone() {
            Some(path) => self.spawn_preload(LoadKind::Initial, path),
            None => self.begin_initial_load(),
        }
    }

    /// Drain load events and frames. Returns true when anything observable
    /// changed, so the caller knows to repaint.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;

        while let Ok(event) = self.events_rx.try_recv() {
            self.apply_load_event(event);
            changed = true;
        }

        while let Ok(frame) = self.frame_rx.try_recv() {
            self.latest_frame = Some(frame);
            changed = true;
        }

        changed |= self.sample_memory();
        changed
    }

    fn begin_initial_load(&mut self) {
        self.state.is_loading = true;
        self.state.has_error = false;
        self.state.error_message.clear();

        match self.service.video_path(&self.character_id, self.emotion) {
            Ok(path) => {
                self.state.current_video_path = Some(path.clone());
                self.spawn_preload(LoadKind::Initial, path);
            }
            Err(err) => self.fail_load(LoadKind::Initial, format!("{err:#}")),
        }
    }

    fn begin_transition(&mut self) {
        self.state.is_transitioning = true;

        match self.service.video_path(&self.character_id, self.emotion) {
            Ok(path) => {
                // Same clip resolved again; nothing to cross-fade.
                if Some(&path) == self.state.current_video_path.as_ref() {
                    self.state.is_transitioning = false;
                    return;
                }
                self.spawn_preload(LoadKind::Transition, path);
            }
            Err(err) => self.fail_load(LoadKind::Transition, format!("{err:#}")),
        }
    }

    fn spawn_preload(&self, kind: LoadKind, path: PathBuf) {
        let service = Arc::clone(&self.service);
        let tx = self.events_tx.clone();
        let started = Instant::now();

        thread::spawn(move || {
            let event = match service.preload(&path) {
                Ok(clip) => LoadEvent::Loaded {
                    kind,
                    path,
                    clip,
                    started,
                },
                Err(err) => LoadEvent::Failed {
                    kind,
                    error: format!("{err:#}"),
                },
            };
            let _ = tx.send(event);
        });
    }

    fn apply_load_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Loaded {
                kind: LoadKind::Initial,
                path,
                clip,
                started,
            } => {
                let start_playing = self.auto_play && self.is_playing;
                self.install_clip(self.active, &path, clip.clone(), start_playing);
                self.state.is_loading = false;
                self.state.has_error = false;
                self.state.current_video_path = Some(path.clone());
                self.emit_metrics(&clip, started.elapsed());
                self.notify_video_change(&path);
            }
            LoadEvent::Loaded {
                kind: LoadKind::Transition,
                path,
                clip,
                started,
            } => {
                if !self.state.is_transitioning {
                    log::debug!("discarding stale transition result for {}", path.display());
                    return;
                }
                let inactive = 1 - self.active;
                self.install_clip(inactive, &path, clip.clone(), self.is_playing);

                // Toggle which slot is rendered; the cross-fade itself is a
                // rendering concern keyed off this index.
                let previous = self.active;
                self.active = inactive;
                if let Some(player) = self.slots[previous].player.take() {
                    player.stop();
                }

                self.state.is_transitioning = false;
                self.state.current_video_path = Some(path.clone());
                self.emit_metrics(&clip, started.elapsed());
                self.notify_video_change(&path);
            }
            LoadEvent::Failed { kind, error } => self.fail_load(kind, error),
        }
    }

    fn install_clip(&mut self, slot: usize, path: &Path, clip: Arc<Clip>, start_playing: bool) {
        if let Some(old) = self.slots[slot].player.take() {
            old.stop();
        }

        let player = start_clip_playback(clip, self.frame_tx.clone(), true);
        if start_playing {
            if let Err(err) = player.play() {
                // Paused-but-loaded is an acceptable terminal condition.
                log::warn!("autoplay failed: {err:#}");
            }
        }

        self.slots[slot].player = Some(player);
        self.slots[slot].path = Some(path.to_path_buf());
    }

    fn fail_load(&mut self, kind: LoadKind, detail: String) {
        log::error!("video load failed: {detail}");

        let message = match kind {
            LoadKind::Initial => LOAD_FAILED_MESSAGE,
            LoadKind::Transition => TRANSITION_FAILED_MESSAGE,
        };
        self.state.is_loading = false;
        self.state.is_transitioning = false;
        self.state.has_error = true;
        self.state.error_message = message.to_string();

        if let Some(hook) = &self.hooks.on_error {
            hook(message);
        }
    }

    fn emit_metrics(&mut self, clip: &Clip, load_time: Duration) {
        let metrics = VideoMetrics {
            load_time,
            video_size: u64::from(clip.width()) * u64::from(clip.height()),
            playback_quality: PlaybackQuality::from_dimensions(clip.width(), clip.height()),
        };
        if let Some(hook) = &self.hooks.on_performance_metrics {
            hook(&metrics);
        }
        self.last_metrics = Some(metrics);
    }

    fn notify_video_change(&self, path: &Path) {
        if let Some(hook) = &self.hooks.on_video_change {
            hook(path);
        }
    }

    fn sample_memory(&mut self) -> bool {
        if self.last_memory_sample.elapsed() < MEMORY_SAMPLE_INTERVAL {
            return false;
        }
        self.last_memory_sample = Instant::now();

        let Some(usage) = memory::usage_bytes() else {
            return false;
        };
        if let Some(hook) = &self.hooks.on_memory_usage {
            hook(usage);
        }
        self.last_memory = Some(usage);
        true
    }

    #[cfg(test)]
    fn active_player_is_paused(&self) -> Option<bool> {
        self.slots[self.active]
            .player
            .as_ref()
            .map(ClipPlayer::is_paused)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use anyhow::{Result, anyhow, bail};

    use super::*;

    const PRELOAD_DELAY: Duration = Duration::from_millis(25);

    struct StubService {
        positive: PathBuf,
        neutral: PathBuf,
        clips: HashMap<PathBuf, Arc<Clip>>,
        fail_preloads: Mutex<HashSet<PathBuf>>,
    }

    impl StubService {
        fn new() -> Arc<StubService> {
            let positive = PathBuf::from("clips/dancing.gif");
            let neutral = PathBuf::from("clips/chilling.gif");
            let mut clips = HashMap::new();
            for path in [&positive, &neutral] {
                clips.insert(
                    path.clone(),
                    Arc::new(Clip::from_frames(
                        vec![vec![0u8; 16], vec![255u8; 16]],
                        2,
                        2,
                        Duration::from_millis(5),
                    )),
                );
            }
            Arc::new(StubService {
                positive,
                neutral,
                clips,
                fail_preloads: Mutex::new(HashSet::new()),
            })
        }

        fn fail_next_preloads(&self, path: &Path) {
            self.fail_preloads.lock().unwrap().insert(path.to_path_buf());
        }

        fn clear_failures(&self) {
            self.fail_preloads.lock().unwrap().clear();
        }
    }

    impl VideoCharacterService for StubService {
        fn video_path(&self, character_id: &str, emotion: Option<Emotion>) -> Result<PathBuf> {
            if character_id == "invalid" {
                bail!("unknown character '{character_id}'");
            }
            Ok(match emotion {
                Some(Emotion::Positive) => self.positive.clone(),
                _ => self.neutral.clone(),
            })
        }

        fn preload(&self, path: &Path) -> Result<Arc<Clip>> {
            thread::sleep(PRELOAD_DELAY);
            if self.fail_preloads.lock().unwrap().contains(path) {
                bail!("preload failed for {}", path.display());
            }
            self.clips
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("no clip for {}", path.display()))
        }

        fn available_videos(&self, _character_id: &str) -> Vec<PathBuf> {
            vec![self.positive.clone(), self.neutral.clone()]
        }
    }

    #[derive(Clone, Default)]
    struct Capture {
        metrics: Arc<Mutex<Vec<VideoMetrics>>>,
        changes: Arc<Mutex<Vec<PathBuf>>>,
        errors: Arc<Mutex<Vec<String>>>,
    }

    impl Capture {
        fn hooks(&self) -> DisplayHooks {
            let metrics = self.metrics.clone();
            let changes = self.changes.clone();
            let errors = self.errors.clone();
            DisplayHooks {
                on_performance_metrics: Some(Box::new(move |m| {
                    metrics.lock().unwrap().push(m.clone())
                })),
                on_memory_usage: None,
                on_video_change: Some(Box::new(move |p| {
                    changes.lock().unwrap().push(p.to_path_buf())
                })),
                on_error: Some(Box::new(move |msg| {
                    errors.lock().unwrap().push(msg.to_string())
                })),
            }
        }
    }

    fn pump_until(display: &mut CharacterDisplay, mut done: impl FnMut(&CharacterDisplay) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            display.pump();
            if done(display) {
                return;
            }
            assert!(Instant::now() < deadline, "timed out waiting for display");
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn ready_display(service: Arc<StubService>, capture: &Capture) -> CharacterDisplay {
        let mut display = CharacterDisplay::new(
            service,
            "ann",
            Some(Emotion::Neutral),
            true,
            capture.hooks(),
        );
        pump_until(&mut display, |d| !d.state().is_loading);
        display
    }

    #[test]
    fn mount_loads_and_reports_metrics() {
        let service = StubService::new();
        let capture = Capture::default();
        let neutral = service.neutral.clone();

        let mut display = CharacterDisplay::new(
            service,
            "ann",
            Some(Emotion::Neutral),
            true,
            capture.hooks(),
        );
        assert!(display.state().is_loading);

        pump_until(&mut display, |d| !d.state().is_loading);

        let state = display.state();
        assert!(!state.has_error);
        assert_eq!(state.current_video_path.as_deref(), Some(neutral.as_path()));

        let metrics = capture.metrics.lock().unwrap();
        assert_eq!(metrics.len(), 1);
        assert!(metrics[0].load_time >= PRELOAD_DELAY);
        assert_eq!(metrics[0].video_size, 4);
        assert_eq!(metrics[0].playback_quality, PlaybackQuality::Low);

        assert_eq!(capture.changes.lock().unwrap().as_slice(), &[neutral]);
    }

    #[test]
    fn frames_flow_once_ready() {
        let service = StubService::new();
        let capture = Capture::default();
        let mut display = ready_display(service, &capture);

        pump_until(&mut display, |d| d.latest_frame.is_some());
        let frame = display.take_latest_frame().unwrap();
        assert_eq!((frame.width, frame.height), (2, 2));
    }

    #[test]
    fn emotion_change_transitions_to_the_new_clip() {
        let service = StubService::new();
        let capture = Capture::default();
        let positive = service.positive.clone();
        let mut display = ready_display(service, &capture);

        display.set_emotion(Some(Emotion::Positive));
        assert!(display.state().is_transitioning);

        pump_until(&mut display, |d| !d.state().is_transitioning);

        let state = display.state();
        assert!(!state.has_error);
        assert_eq!(state.current_video_path.as_deref(), Some(positive.as_path()));
        assert_eq!(capture.changes.lock().unwrap().len(), 2);
        assert_eq!(capture.metrics.lock().unwrap().len(), 2);
    }

    #[test]
    fn requests_while_transitioning_are_dropped() {
        let service = StubService::new();
        let capture = Capture::default();
        let positive = service.positive.clone();
        let mut display = ready_display(service, &capture);

        display.set_emotion(Some(Emotion::Positive));
        assert!(display.state().is_transitioning);

        // This one loses the race and is dropped outright.
        display.set_emotion(Some(Emotion::Negative));

        pump_until(&mut display, |d| !d.state().is_transitioning);
        thread::sleep(PRELOAD_DELAY * 2);
        display.pump();

        assert_eq!(display.emotion(), Some(Emotion::Positive));
        assert_eq!(
            display.state().current_video_path.as_deref(),
            Some(positive.as_path())
        );
        assert_eq!(capture.changes.lock().unwrap().len(), 2);
    }

    #[test]
    fn requests_while_loading_are_dropped() {
        let service = StubService::new();
        let capture = Capture::default();

        let mut display = CharacterDisplay::new(
            service,
            "ann",
            Some(Emotion::Neutral),
            true,
            capture.hooks(),
        );
        display.set_emotion(Some(Emotion::Positive));

        pump_until(&mut display, |d| !d.state().is_loading);
        assert_eq!(display.emotion(), Some(Emotion::Neutral));
        assert_eq!(capture.changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn same_clip_resolution_ends_the_transition_immediately() {
        let service = StubService::new();
        let capture = Capture::default();
        let mut display = ready_display(service, &capture);

        // None resolves to the same neutral clip.
        display.set_emotion(None);
        assert!(!display.state().is_transitioning);
        assert_eq!(capture.changes.lock().unwrap().len(), 1);
    }

    #[test]
    fn collaborator_failure_enters_the_error_state() {
        let service = StubService::new();
        let capture = Capture::default();

        let mut display =
            CharacterDisplay::new(service, "invalid", None, true, capture.hooks());

        let state = display.state();
        assert!(state.has_error);
        assert!(!state.is_loading);
        assert_eq!(state.error_message, "Failed to load character video");
        assert_eq!(
            capture.errors.lock().unwrap().as_slice(),
            &["Failed to load character video".to_string()]
        );
        display.pump();
    }

    #[test]
    fn preload_failure_is_recoverable_via_retry() {
        let service = StubService::new();
        let capture = Capture::default();
        service.fail_next_preloads(&service.neutral);

        let mut display = CharacterDisplay::new(
            service.clone(),
            "ann",
            Some(Emotion::Neutral),
            true,
            capture.hooks(),
        );
        pump_until(&mut display, |d| d.state().has_error);
        assert_eq!(display.state().error_message, "Failed to load character video");

        service.clear_failures();
        display.retry();
        assert!(display.state().is_loading);
        assert!(!display.state().has_error);

        pump_until(&mut display, |d| !d.state().is_loading);
        assert!(!display.state().has_error);
        assert_eq!(
            display.state().current_video_path.as_deref(),
            Some(service.neutral.as_path())
        );
    }

    #[test]
    fn transition_preload_failure_aborts_into_error() {
        let service = StubService::new();
        let capture = Capture::default();
        let mut display = ready_display(service.clone(), &capture);

        service.fail_next_preloads(&service.positive);
        display.set_emotion(Some(Emotion::Positive));
        pump_until(&mut display, |d| d.state().has_error);

        let state = display.state();
        assert!(!state.is_transitioning);
        assert_eq!(state.error_message, "Video transition failed");
    }

    #[test]
    fn play_pause_toggles_the_active_player() {
        let service = StubService::new();
        let capture = Capture::default();
        let mut display = ready_display(service, &capture);

        assert_eq!(display.active_player_is_paused(), Some(false));

        display.set_playing(false);
        assert!(!display.is_playing());
        assert_eq!(display.active_player_is_paused(), Some(true));

        display.set_playing(true);
        assert_eq!(display.active_player_is_paused(), Some(false));
    }
}
