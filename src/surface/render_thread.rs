//! One render thread per glass surface.
//!
//! Callers talk to the thread through [`SurfaceCommand`]s. Before every frame the thread drains
//! the whole queue and then copies a [`FrameSnapshot`], so a frame never observes a
//! half-applied update. Finished frames go out on a single-slot channel that only keeps the
//! newest frame.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use crossbeam_channel::{Receiver, Sender, select};
use image::RgbaImage;
use tracing::{debug, info, warn};

use super::backend::FrameBackend;
use super::command::{SurfaceCommand, SurfaceSender};
use super::state::{FrameSnapshot, RenderSurfaceState};
use crate::background::BackgroundImage;
use crate::params::GlassSurfaceParameters;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameMode {
    /// Render on a fixed cadence.
    Continuous { interval: Duration },
    /// Render only after something changed or a frame was requested.
    OnDemand,
}

#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub label: String,
    pub params: GlassSurfaceParameters,
    pub viewport: (u32, u32),
    pub mode: FrameMode,
    /// Initial background; the placeholder is shown when absent.
    pub background: Option<BackgroundImage>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        let params = GlassSurfaceParameters::default();
        let viewport = (params.width.max(1.0) as u32, params.height.max(1.0) as u32);
        Self {
            label: "glass".to_string(),
            params,
            viewport,
            mode: FrameMode::OnDemand,
            background: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedFrame {
    pub frame_index: u64,
    pub background_generation: u64,
    pub image: Arc<RgbaImage>,
}

/// Counters returned once the render thread has shut down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub frames_rendered: u64,
    pub frames_skipped: u64,
    pub frames_failed: u64,
}

pub struct SurfaceHandle {
    label: String,
    commands: Sender<SurfaceCommand>,
    frames: Receiver<RenderedFrame>,
    join: Option<JoinHandle<SurfaceStats>>,
}

enum Flow {
    Continue,
    Shutdown,
}

impl SurfaceHandle {
    /// Start the render thread and initialise `backend` on it.
    ///
    /// Returns the backend's initialisation error, if any; in that case no frame is ever
    /// rendered and the thread has already exited.
    pub fn spawn<B>(mut backend: B, config: SurfaceConfig) -> Result<Self>
    where
        B: FrameBackend + 'static,
    {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<SurfaceCommand>();
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<RenderedFrame>(1);
        let frame_drop_rx = frame_rx.clone();
        let (init_tx, init_rx) = crossbeam_channel::bounded::<Result<()>>(1);

        let label = config.label.clone();
        let join = thread::Builder::new()
            .name(format!("glass-surface-{label}"))
            .spawn(move || {
                let state = initial_state(&config);
                if let Err(e) = backend.initialize(&state.current()) {
                    backend.teardown();
                    let _ = init_tx.send(Err(e));
                    return SurfaceStats::default();
                }
                let _ = init_tx.send(Ok(()));
                run_surface_loop(&mut backend, state, config, cmd_rx, frame_tx, frame_drop_rx)
            })
            .context("failed to spawn glass surface render thread")?;

        match init_rx.recv() {
            Ok(Ok(())) => {
                info!(surface = %label, "glass surface ready");
                Ok(Self {
                    label,
                    commands: cmd_tx,
                    frames: frame_rx,
                    join: Some(join),
                })
            }
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e.context(format!("failed to initialise glass surface {label}")))
            }
            Err(_) => {
                let _ = join.join();
                bail!("render thread for glass surface {label} exited during initialisation")
            }
        }
    }

    pub fn sender(&self) -> SurfaceSender {
        SurfaceSender::new(self.commands.clone())
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn frames(&self) -> &Receiver<RenderedFrame> {
        &self.frames
    }

    /// Newest frame published since the last call, if any.
    pub fn latest_frame(&self) -> Option<RenderedFrame> {
        let mut latest = None;
        while let Ok(frame) = self.frames.try_recv() {
            latest = Some(frame);
        }
        latest
    }

    pub fn wait_frame(&self, timeout: Duration) -> Option<RenderedFrame> {
        self.frames.recv_timeout(timeout).ok()
    }

    /// Stop the thread, release the backend, and wait for it.
    pub fn teardown(mut self) -> Result<SurfaceStats> {
        self.shutdown_and_join()
    }

    fn shutdown_and_join(&mut self) -> Result<SurfaceStats> {
        let Some(join) = self.join.take() else {
            bail!("glass surface {} already torn down", self.label);
        };
        // The thread may already be gone if every sender was dropped.
        let _ = self.commands.send(SurfaceCommand::Shutdown);
        join.join()
            .map_err(|_| anyhow!("render thread for glass surface {} panicked", self.label))
    }
}

impl Drop for SurfaceHandle {
    fn drop(&mut self) {
        if self.join.is_some() {
            if let Err(e) = self.shutdown_and_join() {
                warn!(error = %format!("{e:#}"), "glass surface teardown failed");
            }
        }
    }
}

fn publish_latest(tx: &Sender<RenderedFrame>, drop_rx: &Receiver<RenderedFrame>, frame: RenderedFrame) {
    if tx.try_send(frame.clone()).is_err() {
        while drop_rx.try_recv().is_ok() {}
        let _ = tx.try_send(frame);
    }
}

fn apply_command(state: &mut RenderSurfaceState, label: &str, command: SurfaceCommand) -> Flow {
    match command {
        SurfaceCommand::SetParameters(params) => {
            for adjustment in state.set_parameters(params) {
                warn!(surface = %label, "{adjustment}");
            }
        }
        SurfaceCommand::UpdateBackground(background) => {
            let (w, h) = background.dimensions();
            debug!(surface = %label, width = w, height = h, "background updated");
            state.update_background(background);
        }
        SurfaceCommand::Resize { width, height } => state.resize((width, height)),
        SurfaceCommand::SetPointer(pointer) => state.set_pointer(pointer),
        SurfaceCommand::RequestFrame => state.request_frame(),
        SurfaceCommand::Shutdown => return Flow::Shutdown,
    }
    Flow::Continue
}

fn initial_state(config: &SurfaceConfig) -> RenderSurfaceState {
    let mut state = RenderSurfaceState::new(config.params.clone(), config.viewport);
    for adjustment in config.params.resolve().1 {
        warn!(surface = %config.label, "{adjustment}");
    }
    if let Some(background) = config.background.clone() {
        state.update_background(background);
    }
    // Construction is not damage: on-demand surfaces wait for their first command.
    state.take_damage();
    state
}

fn run_surface_loop<B: FrameBackend>(
    backend: &mut B,
    mut state: RenderSurfaceState,
    config: SurfaceConfig,
    commands: Receiver<SurfaceCommand>,
    frame_tx: Sender<RenderedFrame>,
    frame_drop_rx: Receiver<RenderedFrame>,
) -> SurfaceStats {
    let label = config.label;
    let ticker = match config.mode {
        FrameMode::Continuous { interval } => crossbeam_channel::tick(interval),
        FrameMode::OnDemand => crossbeam_channel::never(),
    };

    let mut stats = SurfaceStats::default();
    'frames: loop {
        let mut tick_due = false;
        let mut shutdown = false;
        select! {
            recv(commands) -> msg => match msg {
                Ok(command) => {
                    shutdown = matches!(apply_command(&mut state, &label, command), Flow::Shutdown);
                }
                Err(_) => shutdown = true,
            },
            recv(ticker) -> _ => tick_due = true,
        }
        if shutdown {
            break;
        }

        while let Ok(command) = commands.try_recv() {
            if let Flow::Shutdown = apply_command(&mut state, &label, command) {
                break 'frames;
            }
        }

        let damaged = state.take_damage();
        let render_now = match config.mode {
            FrameMode::Continuous { .. } => tick_due,
            FrameMode::OnDemand => damaged,
        };
        if !render_now {
            continue;
        }

        let snapshot = state.snapshot();
        match backend.render(&snapshot) {
            Ok(Some(image)) => {
                stats.frames_rendered += 1;
                debug!(surface = %label, frame = snapshot.frame_index, backend = backend.name(), "frame rendered");
                publish_latest(
                    &frame_tx,
                    &frame_drop_rx,
                    RenderedFrame {
                        frame_index: snapshot.frame_index,
                        background_generation: snapshot.background_generation,
                        image: Arc::new(image),
                    },
                );
            }
            Ok(None) => {
                stats.frames_skipped += 1;
                debug!(surface = %label, frame = snapshot.frame_index, viewport = ?snapshot.viewport, "skipping degenerate frame");
            }
            Err(e) => {
                stats.frames_failed += 1;
                warn!(surface = %label, error = %format!("{e:#}"), "frame render failed");
            }
        }
    }

    state.mark_destroyed();
    backend.teardown();
    info!(surface = %label, frames = stats.frames_rendered, "glass surface torn down");
    stats
}

/// Render a single frame synchronously, without a render thread.
pub fn render_once<B: FrameBackend>(
    backend: &mut B,
    snapshot: &FrameSnapshot,
) -> Result<Option<RgbaImage>> {
    if let Err(e) = backend.initialize(snapshot) {
        backend.teardown();
        return Err(e);
    }
    let result = backend.render(snapshot);
    backend.teardown();
    result
}
