// File: crates/canvas-core/src/scheduler.rs
// Summary: Frame scheduling primitive (schedule/cancel per display refresh) and a deterministic manual driver.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Cancellation token for one scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host facility that runs a callback once on the next display refresh.
///
/// Implementations must never invoke the callback from inside `schedule`; the manager
/// relies on callbacks running later, from the host event loop.
pub trait FrameScheduler {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameToken;
    /// Cancel a pending callback. Unknown or already-run tokens are ignored.
    fn cancel(&self, token: FrameToken);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Rc<T> {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameToken { (**self).schedule(callback) }
    fn cancel(&self, token: FrameToken) { (**self).cancel(token) }
}

/// Queue-based scheduler advanced explicitly with `run_frame`.
///
/// Each frame runs exactly the callbacks that were pending when it started; callbacks
/// scheduled while a frame runs wait for the next one. Used by headless hosts and tests,
/// and as the queue behind windowed schedulers.
#[derive(Default)]
pub struct ManualScheduler {
    queue: RefCell<VecDeque<(FrameToken, Box<dyn FnOnce()>)>>,
    next_id: Cell<u64>,
    frames: Cell<u64>,
}

impl ManualScheduler {
    pub fn new() -> Self { Self::default() }

    /// Number of callbacks waiting for a frame.
    pub fn pending(&self) -> usize { self.queue.borrow().len() }

    /// Number of frames run so far.
    pub fn frames_run(&self) -> u64 { self.frames.get() }

    /// Run one frame. Returns how many callbacks ran.
    pub fn run_frame(&self) -> usize {
        self.frames.set(self.frames.get() + 1);
        let due: Vec<FrameToken> = self.queue.borrow().iter().map(|(t, _)| *t).collect();
        let mut ran = 0;
        for token in due {
            // A callback earlier in this frame may have cancelled this one.
            let callback = {
                let mut q = self.queue.borrow_mut();
                q.iter().position(|(t, _)| *t == token).and_then(|i| q.remove(i))
            };
            if let Some((_, cb)) = callback {
                cb();
                ran += 1;
            }
        }
        ran
    }

    /// Run `n` frames, returning the total number of callbacks run.
    pub fn run_frames(&self, n: usize) -> usize {
        (0..n).map(|_| self.run_frame()).sum()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule(&self, callback: Box<dyn FnOnce()>) -> FrameToken {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        let token = FrameToken(id);
        self.queue.borrow_mut().push_back((token, callback));
        token
    }

    fn cancel(&self, token: FrameToken) {
        self.queue.borrow_mut().retain(|(t, _)| *t != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callbacks_scheduled_during_a_frame_wait_for_the_next() {
        let sched = Rc::new(ManualScheduler::new());
        let hits = Rc::new(Cell::new(0));
        let (s2, h2) = (sched.clone(), hits.clone());
        sched.schedule(Box::new(move || {
            h2.set(h2.get() + 1);
            let h3 = h2.clone();
            s2.schedule(Box::new(move || h3.set(h3.get() + 10)));
        }));
        assert_eq!(sched.run_frame(), 1);
        assert_eq!(hits.get(), 1);
        assert_eq!(sched.pending(), 1);
        assert_eq!(sched.run_frame(), 1);
        assert_eq!(hits.get(), 11);
        assert_eq!(sched.frames_run(), 2);
    }

    #[test]
    fn cancel_removes_pending_callback() {
        let sched = ManualScheduler::new();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let t = sched.schedule(Box::new(move || h.set(1)));
        sched.cancel(t);
        sched.cancel(FrameToken(999));
        assert_eq!(sched.run_frame(), 0);
        assert_eq!(hits.get(), 0);
    }
}
