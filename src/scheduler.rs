//! Frame scheduling abstraction
//!
//! The render loop never talks to a platform timer directly. It asks a
//! [`Scheduler`] for a tick and the host calls back into the loop when the
//! tick fires. A browser host would back this with `requestAnimationFrame`
//! and `setTimeout`; a native host with its event loop; tests and the CLI
//! use [`ManualScheduler`], a virtual clock.

use std::time::Duration;

/// Identifies one scheduled tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle(u64);

impl TickHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Source of deferred ticks
pub trait Scheduler {
    /// Request a tick after `delay`; `Duration::ZERO` means "next frame"
    fn schedule_tick(&mut self, delay: Duration) -> TickHandle;

    /// Cancel a tick that has not fired yet; cancelling a fired or unknown
    /// handle is a no-op
    fn cancel(&mut self, handle: TickHandle);
}

/// Virtual-time scheduler driven by explicit [`ManualScheduler::advance`]
/// calls
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    now: Duration,
    /// Length of one animation frame, used for zero-delay requests
    frame_interval: Duration,
    next_id: u64,
    pending: Vec<(TickHandle, Duration)>,
}

impl Default for ManualScheduler {
    /// 60 Hz frames
    fn default() -> Self {
        Self::new(Duration::from_micros(16_667))
    }
}

impl ManualScheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            frame_interval,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of ticks waiting to fire
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Due time of the earliest pending tick
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.iter().map(|&(_, due)| due).min()
    }

    /// Jump to the earliest pending tick and fire it
    pub fn advance(&mut self) -> Option<TickHandle> {
        let (index, &(handle, due)) = self
            .pending
            .iter()
            .enumerate()
            .min_by_key(|(_, (handle, due))| (*due, handle.id()))?;
        self.pending.remove(index);
        self.now = self.now.max(due);
        Some(handle)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_tick(&mut self, delay: Duration) -> TickHandle {
        let handle = TickHandle(self.next_id);
        self.next_id += 1;
        let delay = if delay.is_zero() {
            self.frame_interval
        } else {
            delay
        };
        self.pending.push((handle, self.now + delay));
        handle
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.pending.retain(|(h, _)| *h != handle);
    }
}
