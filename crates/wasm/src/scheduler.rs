//! [`FrameScheduler`] backed by `requestAnimationFrame`.

use backdrop_core::error::EffectError;
use backdrop_core::frame::{FrameHandle, FrameScheduler};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

pub struct RafScheduler {
    window: Window,
    callback: Option<Closure<dyn FnMut(f64)>>,
}

impl RafScheduler {
    /// A scheduler with no frame callback; requests fail until one is set.
    pub fn new(window: Window) -> Self {
        Self {
            window,
            callback: None,
        }
    }

    /// Installs the function the browser calls with its frame timestamp.
    pub fn set_callback(&mut self, callback: Closure<dyn FnMut(f64)>) {
        self.callback = Some(callback);
    }

    /// Drops the frame callback. Call only after the pending frame was
    /// cancelled, since the browser would otherwise invoke a freed closure.
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }
}

impl FrameScheduler for RafScheduler {
    fn request_frame(&mut self) -> Result<FrameHandle, EffectError> {
        let callback = self
            .callback
            .as_ref()
            .ok_or_else(|| EffectError::Host("no frame callback installed".into()))?;
        let id = self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
            .map_err(|e| EffectError::Host(format!("requestAnimationFrame failed: {e:?}")))?;
        Ok(FrameHandle(id as u32 as u64))
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        // Cancelling an id that already fired is a no-op in the browser.
        let _ = self.window.cancel_animation_frame(handle.0 as u32 as i32);
    }
}
