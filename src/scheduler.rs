use crate::forms::FormKind;
use crate::modal::ModalKind;
use crate::tree::NodeId;

/// Work that must not run inside the notification that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Recompute every live edit field after a burst of viewport resizes.
    ViewportResize,
    FocusNode(NodeId),
    ResetForm(FormKind),
    HideModalContents(ModalKind),
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    due_ms: u64,
    seq: u64,
    task: Deferred,
}

/// Cooperative frame and timer queues driven by the host event loop.
#[derive(Debug, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_seq: u64,
    frame_tasks: Vec<Deferred>,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn request_frame(&mut self, task: Deferred) {
        self.frame_tasks.push(task);
    }

    pub fn set_timeout(&mut self, delay_ms: u64, task: Deferred) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.push(Timer {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq,
            task,
        });
    }

    pub fn has_pending_frame(&self) -> bool {
        !self.frame_tasks.is_empty()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Hands out the tasks queued for the frame about to render. Tasks
    /// requested while these run land in the next frame.
    pub fn take_frame_tasks(&mut self) -> Vec<Deferred> {
        std::mem::take(&mut self.frame_tasks)
    }

    /// Moves the clock forward and returns the timers that came due, in the
    /// order they were scheduled.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Deferred> {
        self.now_ms = self.now_ms.saturating_add(elapsed_ms);
        let now = self.now_ms;
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|timer| timer.due_ms <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.due_ms, timer.seq));
        due.into_iter().map(|timer| timer.task).collect()
    }
}
