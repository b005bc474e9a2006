//! A cancellable per-frame task.
//!
//! [`AnimationLoop`] stores at most one callback. The host drives it by
//! calling [`AnimationLoop::tick`] once per display frame; while a callback is
//! attached it runs exactly once per tick, otherwise ticks are no-ops.

use std::fmt::Debug;

use crate::time::{FrameClock, FrameTime};

pub type FrameCallback<C> = Box<dyn FnMut(&mut C, FrameTime) -> anyhow::Result<()>>;

pub struct AnimationLoop<C> {
    callback: Option<FrameCallback<C>>,
    // kept while stopped so `start` can resume the same callback
    parked: Option<FrameCallback<C>>,
    clock: FrameClock,
}

impl<C> AnimationLoop<C> {
    pub fn new() -> Self {
        Self {
            callback: None,
            parked: None,
            clock: FrameClock::new(),
        }
    }

    /// Attach a callback (running from the next tick) or detach with `None`.
    pub fn set_animation_loop(&mut self, callback: Option<FrameCallback<C>>) {
        if callback.is_some() && self.callback.is_none() {
            self.clock.reset();
        }
        self.parked = None;
        self.callback = callback;
    }

    /// Resume the last detached callback.
    pub fn start(&mut self) {
        if self.callback.is_none() {
            if let Some(callback) = self.parked.take() {
                self.clock.reset();
                self.callback = Some(callback);
            }
        }
    }

    /// Detach the callback but keep it for a later [`start`](Self::start).
    pub fn stop(&mut self) {
        if let Some(callback) = self.callback.take() {
            self.parked = Some(callback);
        }
    }

    pub fn is_running(&self) -> bool {
        self.callback.is_some()
    }

    /// Run the callback once if attached. Returns whether it ran.
    pub fn tick(&mut self, context: &mut C) -> anyhow::Result<bool> {
        match self.callback.as_mut() {
            Some(callback) => {
                let time = self.clock.tick();
                callback(context, time)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl<C> Default for AnimationLoop<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Debug for AnimationLoop<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationLoop")
            .field("running", &self.is_running())
            .field("frame_index", &self.clock.frame_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_loop() -> AnimationLoop<u32> {
        let mut animation = AnimationLoop::new();
        animation.set_animation_loop(Some(Box::new(|count: &mut u32, _: FrameTime| {
            *count += 1;
            Ok(())
        })));
        animation
    }

    #[test]
    fn running_loop_calls_back_once_per_tick() {
        let mut animation = counting_loop();
        let mut count = 0;
        for _ in 0..3 {
            assert!(animation.tick(&mut count).unwrap());
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn stopped_loop_does_nothing_until_started() {
        let mut animation = counting_loop();
        let mut count = 0;
        animation.tick(&mut count).unwrap();
        animation.stop();
        assert!(!animation.is_running());
        assert!(!animation.tick(&mut count).unwrap());
        assert_eq!(count, 1);

        animation.start();
        animation.tick(&mut count).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn detaching_drops_the_callback() {
        let mut animation = counting_loop();
        animation.set_animation_loop(None);
        animation.start();
        assert!(!animation.is_running());
    }

    #[test]
    fn callback_errors_propagate() {
        let mut animation: AnimationLoop<()> = AnimationLoop::new();
        animation.set_animation_loop(Some(Box::new(
            |_: &mut (), _: FrameTime| -> anyhow::Result<()> { anyhow::bail!("device lost") },
        )));
        assert!(animation.tick(&mut ()).is_err());
    }
}
