//! Background capture, debounced and run off the render thread.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::{debug, info, warn};

use super::command::SurfaceSender;
use crate::background::BackgroundImage;

/// Produces the pixels behind a glass surface. Captures may be slow and may fail.
pub trait BackgroundSource: Send {
    fn capture(&mut self, size: (u32, u32)) -> Result<BackgroundImage>;
}

impl<F> BackgroundSource for F
where
    F: FnMut((u32, u32)) -> Result<BackgroundImage> + Send,
{
    fn capture(&mut self, size: (u32, u32)) -> Result<BackgroundImage> {
        self(size)
    }
}

/// A fixed image, resampled to whatever size is requested.
#[derive(Debug, Clone)]
pub struct StaticBackground {
    image: BackgroundImage,
}

impl StaticBackground {
    pub fn new(image: BackgroundImage) -> Self {
        Self { image }
    }
}

impl BackgroundSource for StaticBackground {
    fn capture(&mut self, size: (u32, u32)) -> Result<BackgroundImage> {
        Ok(self.image.scaled_to(size))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceDecision {
    Idle,
    FireNow,
    WaitUntil(Instant),
}

/// At most one pending capture, fired no sooner than `min_interval` after the previous one.
#[derive(Debug, Clone)]
pub struct CaptureDebouncer {
    min_interval: Duration,
    last_fired: Option<Instant>,
    pending: bool,
}

impl CaptureDebouncer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fired: None,
            pending: false,
        }
    }

    pub fn request(&mut self) {
        self.pending = true;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn poll(&mut self, now: Instant) -> DebounceDecision {
        if !self.pending {
            return DebounceDecision::Idle;
        }
        match self.last_fired {
            Some(last) if now < last + self.min_interval => {
                DebounceDecision::WaitUntil(last + self.min_interval)
            }
            _ => {
                self.pending = false;
                self.last_fired = Some(now);
                DebounceDecision::FireNow
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub captured: u64,
    pub failed: u64,
}

enum CaptureMsg {
    Capture,
    Resize((u32, u32)),
    Stop,
}

/// Worker thread that coalesces capture requests and forwards results to a surface.
pub struct CaptureScheduler {
    requests: Sender<CaptureMsg>,
    join: Option<JoinHandle<CaptureStats>>,
}

impl CaptureScheduler {
    pub fn spawn<S>(
        source: S,
        target: SurfaceSender,
        size: (u32, u32),
        min_interval: Duration,
    ) -> Result<Self>
    where
        S: BackgroundSource + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let join = thread::Builder::new()
            .name("glass-capture".to_string())
            .spawn(move || run_capture_loop(source, target, size, min_interval, rx))
            .context("failed to spawn capture thread")?;
        Ok(Self {
            requests: tx,
            join: Some(join),
        })
    }

    pub fn request_capture(&self) -> Result<()> {
        self.requests
            .send(CaptureMsg::Capture)
            .map_err(|_| anyhow!("capture thread has exited"))
    }

    pub fn set_capture_size(&self, width: u32, height: u32) -> Result<()> {
        self.requests
            .send(CaptureMsg::Resize((width, height)))
            .map_err(|_| anyhow!("capture thread has exited"))
    }

    /// Drop any pending capture and wait for the worker.
    pub fn stop(mut self) -> Result<CaptureStats> {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> Result<CaptureStats> {
        let Some(join) = self.join.take() else {
            bail!("capture scheduler already stopped");
        };
        let _ = self.requests.send(CaptureMsg::Stop);
        join.join().map_err(|_| anyhow!("capture thread panicked"))
    }
}

impl Drop for CaptureScheduler {
    fn drop(&mut self) {
        if self.join.is_some() {
            let _ = self.stop_and_join();
        }
    }
}

fn run_capture_loop<S: BackgroundSource>(
    mut source: S,
    target: SurfaceSender,
    mut size: (u32, u32),
    min_interval: Duration,
    requests: Receiver<CaptureMsg>,
) -> CaptureStats {
    let mut debouncer = CaptureDebouncer::new(min_interval);
    let mut stats = CaptureStats::default();

    loop {
        let msg = match debouncer.poll(Instant::now()) {
            DebounceDecision::FireNow => {
                match source.capture(size) {
                    Ok(image) => {
                        stats.captured += 1;
                        debug!(width = size.0, height = size.1, "background captured");
                        if target.update_background(image).is_err() {
                            info!("glass surface is gone; stopping capture");
                            break;
                        }
                    }
                    Err(e) => {
                        stats.failed += 1;
                        warn!(error = %format!("{e:#}"), "background capture failed; keeping the previous background");
                    }
                }
                continue;
            }
            DebounceDecision::Idle => requests.recv().ok(),
            DebounceDecision::WaitUntil(deadline) => match requests.recv_deadline(deadline) {
                Ok(msg) => Some(msg),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => None,
            },
        };

        match msg {
            Some(CaptureMsg::Capture) => debouncer.request(),
            Some(CaptureMsg::Resize(new_size)) => size = new_size,
            Some(CaptureMsg::Stop) | None => break,
        }
    }
    stats
}
