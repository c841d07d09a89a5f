#![deny(unsafe_code)]
//! Browser host for the backdrop effects.
//!
//! `mount_disk` and `mount_network` size a canvas to the window, start the
//! effect on `requestAnimationFrame` and return a [`BackdropHandle`]. The
//! handle's `stop()` cancels the pending frame and removes every listener
//! this crate registered, so a stopped effect leaves nothing behind.

mod scheduler;
mod surface;

use backdrop_core::error::EffectError;
use backdrop_core::{AnimationLoop, Effect};
use backdrop_effects::EffectKind;
use scheduler::RafScheduler;
use std::cell::RefCell;
use std::rc::Rc;
use surface::CanvasSurface;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, MouseEvent, Window,
};

/// Upper bound on the device pixel ratio the disk renders at.
const DISK_MAX_PIXEL_RATIO: f64 = 2.0;

struct Host {
    animation: AnimationLoop<EffectKind>,
    surface: CanvasSurface,
    scheduler: RafScheduler,
    pixel_ratio: f64,
}

struct Listener {
    target: EventTarget,
    kind: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

/// A running effect. Dropping the handle stops it.
#[wasm_bindgen]
pub struct BackdropHandle {
    host: Rc<RefCell<Host>>,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl BackdropHandle {
    /// Cancels the pending frame and detaches all listeners. Idempotent.
    pub fn stop(&mut self) {
        for listener in self.listeners.drain(..) {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.kind,
                listener.callback.as_ref().unchecked_ref(),
            );
        }
        if let Ok(mut host) = self.host.try_borrow_mut() {
            let Host {
                animation,
                scheduler,
                ..
            } = &mut *host;
            animation.stop(scheduler);
            scheduler.clear_callback();
        }
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.host
            .try_borrow()
            .map(|host| host.animation.is_running())
            .unwrap_or(false)
    }

    /// Frames drawn so far.
    pub fn frames(&self) -> f64 {
        self.host
            .try_borrow()
            .map(|host| host.animation.frames() as f64)
            .unwrap_or(0.0)
    }
}

impl Drop for BackdropHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Starts the accretion disk on the canvas with id `canvas_id`.
#[wasm_bindgen]
pub fn mount_disk(canvas_id: &str, seed: u64) -> Result<BackdropHandle, JsValue> {
    mount("disk", canvas_id, seed, None)
}

/// Starts the particle network on the canvas with id `canvas_id`.
#[wasm_bindgen]
pub fn mount_network(canvas_id: &str, seed: u64) -> Result<BackdropHandle, JsValue> {
    mount("network", canvas_id, seed, None)
}

/// Starts any registered effect, with optional JSON parameter overrides.
#[wasm_bindgen]
pub fn mount(
    effect: &str,
    canvas_id: &str,
    seed: u64,
    params_json: Option<String>,
) -> Result<BackdropHandle, JsValue> {
    console_error_panic_hook::set_once();
    let params = match params_json {
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| JsValue::from_str(&format!("invalid params JSON: {e}")))?,
        None => serde_json::json!({}),
    };
    start(effect, canvas_id, seed, &params).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn host_err(what: &str) -> impl Fn(JsValue) -> EffectError + '_ {
    move |e| EffectError::Host(format!("{what}: {e:?}"))
}

/// Backing-store size for a CSS viewport at `pixel_ratio`, at least 1x1.
pub fn viewport_pixels(css_width: f64, css_height: f64, pixel_ratio: f64) -> (usize, usize) {
    let scale = |css: f64| ((css * pixel_ratio).floor() as usize).max(1);
    (scale(css_width), scale(css_height))
}

/// A document `mouseout` leaves the page when it enters no other element.
fn left_page(related_target: Option<&EventTarget>) -> bool {
    related_target.is_none()
}

fn window_size(window: &Window) -> Result<(f64, f64), EffectError> {
    let width = window
        .inner_width()
        .map_err(host_err("innerWidth"))?
        .as_f64()
        .unwrap_or(0.0);
    let height = window
        .inner_height()
        .map_err(host_err("innerHeight"))?
        .as_f64()
        .unwrap_or(0.0);
    Ok((width, height))
}

/// Sizes the canvas to the window and returns the backing-store size.
fn fit_canvas(
    window: &Window,
    canvas: &HtmlCanvasElement,
    pixel_ratio: f64,
) -> Result<(usize, usize), EffectError> {
    let (css_width, css_height) = window_size(window)?;
    let style = canvas.style();
    style
        .set_property("width", &format!("{css_width}px"))
        .map_err(host_err("canvas style"))?;
    style
        .set_property("height", &format!("{css_height}px"))
        .map_err(host_err("canvas style"))?;
    Ok(viewport_pixels(css_width, css_height, pixel_ratio))
}

fn start(
    effect_name: &str,
    canvas_id: &str,
    seed: u64,
    params: &serde_json::Value,
) -> Result<BackdropHandle, EffectError> {
    let window = web_sys::window().ok_or_else(|| EffectError::Host("no window".into()))?;
    let document = window
        .document()
        .ok_or_else(|| EffectError::Host("no document".into()))?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| EffectError::Host(format!("canvas #{canvas_id} not found")))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| EffectError::Host(format!("#{canvas_id} is not a canvas")))?;
    let ctx = canvas
        .get_context("2d")
        .map_err(host_err("getContext"))?
        .ok_or_else(|| EffectError::Host("2d context unavailable".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| EffectError::Host("2d context has unexpected type".into()))?;

    // The network works in CSS pixels, so pointer coordinates need no scaling.
    let pixel_ratio = if effect_name == "disk" {
        window.device_pixel_ratio().min(DISK_MAX_PIXEL_RATIO)
    } else {
        1.0
    };
    let (width, height) = fit_canvas(&window, &canvas, pixel_ratio)?;
    let effect = EffectKind::from_name(effect_name, width, height, seed, params)?;
    let pointer = match &effect {
        EffectKind::Network(network) => Some(network.pointer_handle()),
        EffectKind::Disk(_) => None,
    };

    let mut surface = CanvasSurface::new(canvas.clone(), ctx);
    surface.resize(width, height);
    let host = Rc::new(RefCell::new(Host {
        animation: AnimationLoop::new(effect),
        surface,
        scheduler: RafScheduler::new(window.clone()),
        pixel_ratio,
    }));

    let weak = Rc::downgrade(&host);
    let tick = Closure::wrap(Box::new(move |timestamp_ms: f64| {
        let Some(host) = weak.upgrade() else {
            return;
        };
        let Ok(mut host) = host.try_borrow_mut() else {
            return;
        };
        let Host {
            animation,
            surface,
            scheduler,
            ..
        } = &mut *host;
        if let Err(e) = animation.on_frame(timestamp_ms / 1000.0, surface, scheduler) {
            tracing::error!(error = %e, "frame failed, stopping");
            animation.stop(scheduler);
        }
    }) as Box<dyn FnMut(f64)>);

    let mut handle = BackdropHandle {
        host: Rc::clone(&host),
        listeners: Vec::new(),
    };
    handle.listen(&window, "resize", {
        let weak = Rc::downgrade(&host);
        let window = window.clone();
        move |_| {
            let Some(host) = weak.upgrade() else {
                return;
            };
            let Ok(mut host) = host.try_borrow_mut() else {
                return;
            };
            let Host {
                animation,
                surface,
                pixel_ratio,
                ..
            } = &mut *host;
            let resized = fit_canvas(&window, &canvas, *pixel_ratio).and_then(|(w, h)| {
                surface.resize(w, h);
                animation.effect_mut().resize(w, h)
            });
            if let Err(e) = resized {
                tracing::warn!(error = %e, "resize ignored");
            }
        }
    })?;

    if let Some(pointer) = pointer {
        let moved = pointer.clone();
        handle.listen(&window, "mousemove", move |event| {
            if let Some(mouse) = event.dyn_ref::<MouseEvent>() {
                moved.move_to(mouse.client_x() as f64, mouse.client_y() as f64);
            }
        })?;
        handle.listen(&document, "mouseout", move |event| {
            let related = event
                .dyn_ref::<MouseEvent>()
                .and_then(MouseEvent::related_target);
            if left_page(related.as_ref()) {
                pointer.leave();
            }
        })?;
    }

    let now = window
        .performance()
        .map(|p| p.now() / 1000.0)
        .unwrap_or(0.0);
    {
        let mut guard = host.borrow_mut();
        let Host {
            animation,
            scheduler,
            ..
        } = &mut *guard;
        scheduler.set_callback(tick);
        animation.start(scheduler, now)?;
    }
    tracing::info!(effect = effect_name, width, height, "backdrop mounted");
    Ok(handle)
}

impl BackdropHandle {
    fn listen(
        &mut self,
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), EffectError> {
        let callback = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(kind, callback.as_ref().unchecked_ref())
            .map_err(host_err("addEventListener"))?;
        self.listeners.push(Listener {
            target: target.clone(),
            kind,
            callback,
        });
        Ok(())
    }
}
