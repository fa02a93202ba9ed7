//! Simulate-and-draw scheduling
//!
//! The loop runs every frame while the layout settles or a node is being
//! dragged, then throttles to one frame per `throttle_ms`. Settling
//! restarts whenever the engine's layout generation changes (new graph,
//! unpinned node).
//!
//! The host wires the scheduler's tick back to [`RenderLoop::on_tick`];
//! the loop itself never blocks or sleeps.

use std::time::Duration;

use tracing::{debug, info};

use crate::config::{LoopConfig, SettleMode};
use crate::engine::{FrameReport, GraphEngine};
use crate::render::Surface;
use crate::scheduler::{ManualScheduler, Scheduler, TickHandle};

/// What [`RenderLoop::on_tick`] did with a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Simulated and drew a frame
    Frame(FrameReport),
    /// Surface not sized yet; retried next frame without counting
    Deferred,
    /// Tick was cancelled, superseded, or the loop is stopped
    Ignored,
}

/// Drives a [`GraphEngine`] through a [`Scheduler`]
#[derive(Debug)]
pub struct RenderLoop<S: Scheduler> {
    scheduler: S,
    config: LoopConfig,
    pending: Option<TickHandle>,
    running: bool,
    /// Full-rate frames since the last (re)heat
    frames: u32,
    settled: bool,
    generation: u64,
}

impl<S: Scheduler> RenderLoop<S> {
    pub fn new(scheduler: S, config: LoopConfig) -> Self {
        Self {
            scheduler,
            config,
            pending: None,
            running: false,
            frames: 0,
            settled: false,
            generation: 0,
        }
    }

    /// Schedule the first frame; no-op when already running
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.schedule(Duration::ZERO);
    }

    /// Cancel the pending tick; later ticks are ignored until restarted
    pub fn stop(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        if self.running {
            debug!(frames = self.frames, "render loop stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the loop has left the full-rate phase
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Full-rate frames run since settling last restarted
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Handle of the tick the loop is waiting for
    pub fn pending(&self) -> Option<TickHandle> {
        self.pending
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// Run one frame for the tick identified by `handle` and schedule the
    /// next one
    pub fn on_tick(
        &mut self,
        handle: TickHandle,
        engine: &mut GraphEngine,
        surface: &mut dyn Surface,
    ) -> TickOutcome {
        if !self.running || self.pending != Some(handle) {
            return TickOutcome::Ignored;
        }
        self.pending = None;

        // Read after the frame: a deferred graph initializes inside it
        let report = engine.frame(surface);
        if engine.layout_generation() != self.generation {
            self.generation = engine.layout_generation();
            self.frames = 0;
            self.settled = false;
        }
        if !report.drawn {
            self.schedule(Duration::ZERO);
            return TickOutcome::Deferred;
        }

        if !self.settled {
            self.frames += 1;
            let energy_low = self.config.settle_mode == SettleMode::Energy
                && report.stats.kinetic_energy < self.config.energy_threshold;
            if self.frames >= self.config.settle_frames || energy_low {
                self.settled = true;
                info!(
                    frames = self.frames,
                    kinetic_energy = report.stats.kinetic_energy,
                    "layout settled"
                );
            }
        }

        let delay = if !self.settled || engine.is_dragging() {
            Duration::ZERO
        } else {
            self.config.throttle_interval()
        };
        self.schedule(delay);
        TickOutcome::Frame(report)
    }

    /// Replace a throttled pending tick with one at full rate
    ///
    /// Call when a drag starts so it is not held back by the throttle.
    pub fn wake(&mut self) {
        if !self.running {
            return;
        }
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
        self.schedule(Duration::ZERO);
    }

    fn schedule(&mut self, delay: Duration) {
        self.pending = Some(self.scheduler.schedule_tick(delay));
    }
}

impl RenderLoop<ManualScheduler> {
    /// Fire up to `ticks` pending ticks on the virtual clock; returns how
    /// many frames were drawn
    pub fn pump(
        &mut self,
        engine: &mut GraphEngine,
        surface: &mut dyn Surface,
        ticks: usize,
    ) -> usize {
        let mut drawn = 0;
        for _ in 0..ticks {
            let Some(handle) = self.scheduler.advance() else {
                break;
            };
            if let TickOutcome::Frame(_) = self.on_tick(handle, engine, surface) {
                drawn += 1;
            }
        }
        drawn
    }

    /// Fire ticks until the layout settles, giving up after `max_ticks`
    pub fn run_until_settled(
        &mut self,
        engine: &mut GraphEngine,
        surface: &mut dyn Surface,
        max_ticks: usize,
    ) -> bool {
        for _ in 0..max_ticks {
            if self.settled && self.generation == engine.layout_generation() {
                return true;
            }
            if self.pump(engine, surface, 1) == 0 && self.pending.is_none() {
                break;
            }
        }
        self.settled && self.generation == engine.layout_generation()
    }
}

impl<S: Scheduler> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
