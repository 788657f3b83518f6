//! Scheduling: the debounce timer and frame deferral, modeled as explicit
//! state over a virtual clock.
//!
//! In a browser this would be a cancel-and-reschedule `setTimeout`
//! coalescing mutation bursts into one reconciliation, plus a
//! `requestAnimationFrame` re-check after any pass that modified the DOM.
//! Here both are deadlines against a monotonic `Duration` supplied by the
//! embedder's loop; [`Scheduler::next_due`] hands back plain [`Task`] values
//! for the driver to execute, keeping this module pure and the tests free
//! of real time.
//!
//! At most one task is yielded per call. Pending frame tasks are yielded
//! before expired timers: an animation frame is always nearer than a fresh
//! 250 ms quiet window, so this matches wall-clock ordering — and the frame
//! a healing pass requests can only be observed on a later call, preserving
//! "debounce fires before the frame it schedules".

use std::time::Duration;

/// Quiet window coalescing mutation-observer callbacks.
pub const DEBOUNCE_QUIET: Duration = Duration::from_millis(250);

/// Delay before re-applying after a host chat switch, giving the host time
/// to finish its full re-render.
pub const CHAT_SWITCH_DELAY: Duration = Duration::from_millis(500);

/// Work the driver should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// The debounce window expired: run healing then a full visibility pass.
    HealAndApply,
    /// A one-shot delayed reconciliation (chat switch path).
    Reapply,
    /// The post-heal frame: re-capture snapshot siblings, then re-apply.
    PostHealRefresh,
}

/// Deadline bookkeeping for the engine's two suspension points.
#[derive(Debug, Default)]
pub struct Scheduler {
    debounce_deadline: Option<Duration>,
    reapply_deadline: Option<Duration>,
    frame_requested: bool,
}

impl Scheduler {
    /// Scheduler with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// A mutation was observed: (re)start the quiet window. Only the most
    /// recently scheduled run survives.
    pub fn note_mutation(&mut self, now: Duration) {
        self.debounce_deadline = Some(now + DEBOUNCE_QUIET);
    }

    /// Arm the one-shot delayed re-apply. A later request supersedes an
    /// earlier pending one.
    pub fn schedule_reapply(&mut self, now: Duration, delay: Duration) {
        self.reapply_deadline = Some(now + delay);
    }

    /// Request the next-frame re-check.
    pub fn request_frame(&mut self) {
        self.frame_requested = true;
    }

    /// Whether anything is pending (due or not).
    pub fn is_idle(&self) -> bool {
        self.debounce_deadline.is_none() && self.reapply_deadline.is_none() && !self.frame_requested
    }

    /// Pop the next due task, if any. Call repeatedly until `None`.
    pub fn next_due(&mut self, now: Duration) -> Option<Task> {
        if self.frame_requested {
            self.frame_requested = false;
            return Some(Task::PostHealRefresh);
        }
        if self.debounce_deadline.is_some_and(|deadline| deadline <= now) {
            self.debounce_deadline = None;
            return Some(Task::HealAndApply);
        }
        if self.reapply_deadline.is_some_and(|deadline| deadline <= now) {
            self.reapply_deadline = None;
            return Some(Task::Reapply);
        }
        None
    }

    /// Drop everything pending (test isolation, engine reset).
    pub fn reset(&mut self) {
        self.debounce_deadline = None;
        self.reapply_deadline = None;
        self.frame_requested = false;
    }
}
