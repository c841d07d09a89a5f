//! Display-refresh driven frame loop with a cancelable pending frame.
//!
//! A host (browser `requestAnimationFrame`, a headless driver) implements
//! [`FrameScheduler`]. [`AnimationLoop`] runs one [`Effect`] on top of it:
//! every delivered frame runs update then draw to completion, then requests
//! the next frame and keeps its handle so [`AnimationLoop::stop`] can cancel
//! it.

use crate::effect::Effect;
use crate::error::EffectError;
use crate::surface::Surface;

/// Opaque id of one outstanding frame request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Source of display-refresh callbacks.
pub trait FrameScheduler {
    /// Asks for one more frame callback.
    fn request_frame(&mut self) -> Result<FrameHandle, EffectError>;

    /// Withdraws a request. Unknown or already delivered handles are ignored.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Headless scheduler: the caller decides when a requested frame "arrives"
/// by calling [`ManualScheduler::take_pending`].
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pending: Option<FrameHandle>,
    cancelled: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers the outstanding request, if any.
    pub fn take_pending(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// How many requests were withdrawn before delivery.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, EffectError> {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.pending = Some(handle);
        Ok(handle)
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending == Some(handle) {
            self.pending = None;
            self.cancelled += 1;
        }
    }
}

/// Runs an effect once per delivered frame until stopped.
pub struct AnimationLoop<E> {
    effect: E,
    pending: Option<FrameHandle>,
    started_at: Option<f64>,
    frames: u64,
}

impl<E: Effect> AnimationLoop<E> {
    /// Wraps an effect; nothing runs until [`start`](Self::start).
    pub fn new(effect: E) -> Self {
        Self {
            effect,
            pending: None,
            started_at: None,
            frames: 0,
        }
    }

    /// Records the start time and requests the first frame.
    ///
    /// A loop that is already running is left alone.
    pub fn start(
        &mut self,
        scheduler: &mut dyn FrameScheduler,
        now_secs: f64,
    ) -> Result<(), EffectError> {
        if self.is_running() {
            return Ok(());
        }
        self.pending = Some(scheduler.request_frame()?);
        self.started_at = Some(now_secs);
        tracing::debug!(frames = self.frames, "animation loop started");
        Ok(())
    }

    /// One tick: update, draw, reschedule.
    ///
    /// Returns `Ok(false)` without doing anything when the loop is stopped,
    /// which covers a host delivering a frame that was already cancelled.
    pub fn on_frame(
        &mut self,
        now_secs: f64,
        surface: &mut dyn Surface,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<bool, EffectError> {
        let Some(started_at) = self.started_at else {
            return Ok(false);
        };
        self.pending = None;
        self.effect.update((now_secs - started_at).max(0.0));
        self.effect.draw(surface);
        self.frames += 1;
        match scheduler.request_frame() {
            Ok(handle) => {
                self.pending = Some(handle);
                Ok(true)
            }
            Err(e) => {
                // No frame will arrive, so the loop is no longer running.
                self.started_at = None;
                tracing::warn!(error = %e, frames = self.frames, "frame request failed");
                Err(e)
            }
        }
    }

    /// Cancels the outstanding frame and halts. Safe to call repeatedly.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.pending.take() {
            scheduler.cancel_frame(handle);
        }
        if self.started_at.take().is_some() {
            tracing::debug!(frames = self.frames, "animation loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Ticks executed since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    pub fn effect_mut(&mut self) -> &mut E {
        &mut self.effect
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::DisplayList;
    use serde_json::{json, Value};

    #[derive(Default)]
    struct Counter {
        updates: Vec<f64>,
        draws: usize,
    }

    impl Effect for Counter {
        fn update(&mut self, elapsed_secs: f64) {
            self.updates.push(elapsed_secs);
        }

        fn draw(&self, surface: &mut dyn Surface) {
            surface.clear();
        }

        fn resize(&mut self, _width: usize, _height: usize) -> Result<(), EffectError> {
            Ok(())
        }

        fn size(&self) -> (usize, usize) {
            (1, 1)
        }

        fn params(&self) -> Value {
            json!({})
        }

        fn param_schema(&self) -> Value {
            json!({})
        }
    }

    fn drive(
        animation: &mut AnimationLoop<Counter>,
        scheduler: &mut ManualScheduler,
        surface: &mut DisplayList,
        times: &[f64],
    ) {
        for &t in times {
            if scheduler.take_pending().is_some() {
                animation.on_frame(t, surface, scheduler).unwrap();
            }
        }
    }

    #[test]
    fn manual_scheduler_issues_increasing_handles() {
        let mut s = ManualScheduler::new();
        let a = s.request_frame().unwrap();
        let b = s.request_frame().unwrap();
        assert!(b.0 > a.0);
        assert_eq!(s.pending(), Some(b));
    }

    #[test]
    fn manual_scheduler_cancel_of_stale_handle_is_noop() {
        let mut s = ManualScheduler::new();
        let a = s.request_frame().unwrap();
        let b = s.request_frame().unwrap();
        s.cancel_frame(a);
        assert_eq!(s.pending(), Some(b));
        assert_eq!(s.cancelled(), 0);
    }

    #[test]
    fn loop_passes_elapsed_time_since_start() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 10.0).unwrap();
        drive(&mut animation, &mut scheduler, &mut surface, &[10.0, 10.5, 11.0]);
        assert_eq!(animation.effect().updates, vec![0.0, 0.5, 1.0]);
        assert_eq!(animation.frames(), 3);
        assert!(scheduler.pending().is_some(), "next frame must be requested");
    }

    #[test]
    fn stop_cancels_pending_frame() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 0.0).unwrap();
        drive(&mut animation, &mut scheduler, &mut surface, &[0.0]);
        animation.stop(&mut scheduler);
        assert!(!animation.is_running());
        assert_eq!(scheduler.pending(), None);
        assert_eq!(scheduler.cancelled(), 1);
    }

    #[test]
    fn stop_twice_is_harmless() {
        let mut scheduler = ManualScheduler::new();
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 0.0).unwrap();
        animation.stop(&mut scheduler);
        animation.stop(&mut scheduler);
        assert!(!animation.is_running());
        assert_eq!(scheduler.cancelled(), 1);
    }

    #[test]
    fn stop_before_start_is_harmless() {
        let mut scheduler = ManualScheduler::new();
        let mut animation = AnimationLoop::new(Counter::default());
        animation.stop(&mut scheduler);
        assert!(!animation.is_running());
        assert_eq!(scheduler.cancelled(), 0);
    }

    #[test]
    fn frame_after_stop_is_ignored() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 0.0).unwrap();
        animation.stop(&mut scheduler);
        let ran = animation.on_frame(1.0, &mut surface, &mut scheduler).unwrap();
        assert!(!ran);
        assert!(animation.effect().updates.is_empty());
        assert_eq!(scheduler.pending(), None);
    }

    #[test]
    fn start_twice_keeps_original_start_time() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 1.0).unwrap();
        animation.start(&mut scheduler, 5.0).unwrap();
        drive(&mut animation, &mut scheduler, &mut surface, &[2.0]);
        assert_eq!(animation.effect().updates, vec![1.0]);
    }

    /// Grants a fixed number of requests, then refuses.
    struct Refusing {
        granted: u64,
        limit: u64,
    }

    impl FrameScheduler for Refusing {
        fn request_frame(&mut self) -> Result<FrameHandle, EffectError> {
            if self.granted == self.limit {
                return Err(EffectError::Host("no more frames".into()));
            }
            self.granted += 1;
            Ok(FrameHandle(self.granted))
        }

        fn cancel_frame(&mut self, _handle: FrameHandle) {}
    }

    #[test]
    fn failed_reschedule_halts_loop() {
        let mut scheduler = Refusing {
            granted: 0,
            limit: 1,
        };
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 0.0).unwrap();
        let err = animation
            .on_frame(0.5, &mut surface, &mut scheduler)
            .unwrap_err();
        assert!(matches!(err, EffectError::Host(_)));
        assert_eq!(animation.frames(), 1);
        assert!(!animation.is_running());
        assert_eq!(animation.pending(), None);
        let ran = animation
            .on_frame(1.0, &mut surface, &mut scheduler)
            .unwrap();
        assert!(!ran);
    }

    #[test]
    fn failed_first_request_leaves_loop_stopped() {
        let mut scheduler = Refusing {
            granted: 0,
            limit: 0,
        };
        let mut animation = AnimationLoop::new(Counter::default());
        assert!(animation.start(&mut scheduler, 0.0).is_err());
        assert!(!animation.is_running());
    }

    #[test]
    fn restart_after_stop_resets_clock() {
        let mut scheduler = ManualScheduler::new();
        let mut surface = DisplayList::new(1, 1);
        let mut animation = AnimationLoop::new(Counter::default());
        animation.start(&mut scheduler, 0.0).unwrap();
        animation.stop(&mut scheduler);
        animation.start(&mut scheduler, 3.0).unwrap();
        drive(&mut animation, &mut scheduler, &mut surface, &[4.0]);
        assert_eq!(animation.effect().updates, vec![1.0]);
    }
}
