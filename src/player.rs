use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Result, anyhow};
use crossbeam_channel::Sender;

use crate::clip::Clip;
use crate::types::Frame;

// Sleep granularity while paused, so pause/stop stay responsive.
const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Handle to a running playback worker. Dropping it stops the worker and
/// joins the thread.
#[derive(Debug)]
pub struct ClipPlayer {
    stop: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ClipPlayer {
    /// Resume frame emission. Fails if the worker has already exited.
    pub fn play(&self) -> Result<()> {
        if self
            .handle
            .as_ref()
            .is_none_or(thread::JoinHandle::is_finished)
        {
            return Err(anyhow!("playback worker has exited"));
        }
        self.paused.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ClipPlayer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Spawn a worker that emits the clip's frames at its frame interval,
/// looping at the end. Frames are dropped when the UI queue is full.
pub fn start_clip_playback(
    clip: Arc<Clip>,
    frame_tx: Sender<Frame>,
    start_paused: bool,
) -> ClipPlayer {
    let stop = Arc::new(AtomicBool::new(false));
    let paused = Arc::new(AtomicBool::new(start_paused));
    let stop_flag = stop.clone();
    let paused_flag = paused.clone();

    let handle = thread::spawn(move || {
        if clip.frame_count() == 0 {
            log::warn!("refusing to play an empty clip");
            return;
        }

        let interval = clip.frame_interval();
        let mut index = 0usize;

        while !stop_flag.load(Ordering::Relaxed) {
            if paused_flag.load(Ordering::Relaxed) {
                thread::sleep(PAUSE_POLL_INTERVAL);
                continue;
            }

            let frame = Frame {
                rgba: clip.frame_rgba(index).to_vec(),
                width: clip.width(),
                height: clip.height(),
                timestamp: Instant::now(),
            };

            // Drop the frame if the UI is behind.
            let _ = frame_tx.try_send(frame);

            index = (index + 1) % clip.frame_count();
            thread::sleep(interval);
        }
    });

    ClipPlayer {
        stop,
        paused,
        handle: Some(handle),
    }
}
