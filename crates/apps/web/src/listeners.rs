//! DOM listener registration and the animation-frame loop.
//!
//! Every handler holds a `Weak` reference to the view state, so a handler
//! that fires after disposal does nothing. Dropping [`Listeners`] removes
//! every handler it added and cancels the pending frame.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use foundation::time::Time;
use tracing::debug;
use viewer::{Key, PointerEvent, WheelEvent};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{EventTarget, HtmlCanvasElement, Window};

use crate::Shared;

type Handler = Closure<dyn FnMut(web_sys::Event)>;
type FrameCallback = Closure<dyn FnMut(f64)>;

struct Registration {
    target: EventTarget,
    kind: &'static str,
    handler: Handler,
}

pub struct Listeners {
    registrations: Vec<Registration>,
    frame_loop: FrameLoop,
}

/// Pointer position relative to the canvas' top-left corner, in CSS pixels.
fn pointer_in(canvas: &HtmlCanvasElement, ev: &web_sys::MouseEvent) -> PointerEvent {
    let rect = canvas.get_bounding_client_rect();
    let p = PointerEvent::at(
        f64::from(ev.client_x()) - rect.left(),
        f64::from(ev.client_y()) - rect.top(),
    );
    if ev.shift_key() { p.with_shift() } else { p }
}

/// Wraps `f` so it only runs while the view is alive and the event has the
/// expected DOM type.
fn handler<E, F>(shared: &Weak<Shared>, mut f: F) -> Handler
where
    E: JsCast,
    F: FnMut(&Shared, &E) + 'static,
{
    let shared = shared.clone();
    Closure::new(move |ev: web_sys::Event| {
        let Some(shared) = shared.upgrade() else {
            return;
        };
        if let Some(ev) = ev.dyn_ref::<E>() {
            f(&shared, ev);
        }
    })
}

impl Listeners {
    pub fn register(
        window: &Window,
        canvas: &HtmlCanvasElement,
        shared: Weak<Shared>,
    ) -> Result<Self, JsValue> {
        let canvas_target: &EventTarget = canvas.as_ref();
        let window_target: &EventTarget = window.as_ref();
        let mut registrations = Vec::with_capacity(9);

        let c = canvas.clone();
        let down = handler(&shared, move |shared, ev: &web_sys::PointerEvent| {
            if let Err(err) = c.set_pointer_capture(ev.pointer_id()) {
                debug!(?err, "pointer capture refused");
            }
            let p = pointer_in(&c, ev);
            shared.with_engine(|engine| engine.start_orbit(p));
        });
        registrations.push(Registration::add(canvas_target, "pointerdown", down, None)?);

        let c = canvas.clone();
        let hover = handler(&shared, move |shared, ev: &web_sys::PointerEvent| {
            let p = pointer_in(&c, ev);
            shared.with_engine(|engine| {
                if !engine.is_dragging() {
                    engine.handle_pointer_move(p);
                }
            });
        });
        registrations.push(Registration::add(canvas_target, "pointermove", hover, None)?);

        // Drags are tracked on the window so they follow the pointer off the
        // canvas even without capture. Canvas moves bubble here too.
        let c = canvas.clone();
        let drag = handler(&shared, move |shared, ev: &web_sys::PointerEvent| {
            let p = pointer_in(&c, ev);
            shared.with_engine(|engine| engine.drag_to(p));
        });
        registrations.push(Registration::add(window_target, "pointermove", drag, None)?);

        for kind in ["pointerup", "pointercancel"] {
            let up = handler(&shared, |shared, _: &web_sys::PointerEvent| {
                shared.with_engine(|engine| engine.end_orbit());
            });
            registrations.push(Registration::add(window_target, kind, up, None)?);
        }

        let c = canvas.clone();
        let click = handler(&shared, move |shared, ev: &web_sys::MouseEvent| {
            let p = pointer_in(&c, ev);
            shared.with_engine(|engine| engine.handle_pointer_click(p));
        });
        registrations.push(Registration::add(canvas_target, "click", click, None)?);

        let wheel = handler(&shared, |shared, ev: &web_sys::WheelEvent| {
            ev.prevent_default();
            let e = WheelEvent {
                delta_y: ev.delta_y(),
            };
            shared.with_engine(|engine| engine.handle_wheel(e));
        });
        let opts = web_sys::AddEventListenerOptions::new();
        opts.set_passive(false);
        registrations.push(Registration::add(canvas_target, "wheel", wheel, Some(&opts))?);

        let key_up = handler(&shared, |shared, ev: &web_sys::KeyboardEvent| {
            let key = Key::from_dom(&ev.key());
            shared.with_engine(|engine| engine.handle_key_up(key));
        });
        registrations.push(Registration::add(window_target, "keyup", key_up, None)?);

        let (c, w) = (canvas.clone(), window.clone());
        let resize = handler(&shared, move |shared, _: &web_sys::Event| {
            let (width, height) = (f64::from(c.client_width()), f64::from(c.client_height()));
            let dpr = w.device_pixel_ratio();
            shared.with_engine(|engine| {
                engine.set_device_pixel_ratio(dpr);
                engine.resize(width, height);
            });
        });
        registrations.push(Registration::add(window_target, "resize", resize, None)?);

        let frame_loop = FrameLoop::start(window, shared)?;
        debug!(listeners = registrations.len(), "input listeners registered");
        Ok(Self {
            registrations,
            frame_loop,
        })
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        self.frame_loop.stop();
        for reg in self.registrations.drain(..) {
            let _ = reg
                .target
                .remove_event_listener_with_callback(reg.kind, reg.handler.as_ref().unchecked_ref());
        }
        debug!("input listeners removed");
    }
}

impl Registration {
    fn add(
        target: &EventTarget,
        kind: &'static str,
        handler: Handler,
        opts: Option<&web_sys::AddEventListenerOptions>,
    ) -> Result<Self, JsValue> {
        let callback = handler.as_ref().unchecked_ref();
        match opts {
            Some(opts) => target
                .add_event_listener_with_callback_and_add_event_listener_options(
                    kind, callback, opts,
                )?,
            None => target.add_event_listener_with_callback(kind, callback)?,
        }
        Ok(Self {
            target: target.clone(),
            kind,
            handler,
        })
    }
}

/// Self-rescheduling `requestAnimationFrame` callback that ticks the engine.
struct FrameLoop {
    window: Window,
    pending: Rc<Cell<Option<i32>>>,
    callback: Rc<RefCell<Option<FrameCallback>>>,
}

impl FrameLoop {
    fn start(window: &Window, shared: Weak<Shared>) -> Result<Self, JsValue> {
        let pending = Rc::new(Cell::new(None));
        let callback: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));

        let this = Rc::downgrade(&callback);
        let (next, win) = (Rc::clone(&pending), window.clone());
        *callback.borrow_mut() = Some(Closure::new(move |timestamp_ms: f64| {
            next.set(None);
            let Some(shared) = shared.upgrade() else {
                return;
            };
            shared.with_engine(|engine| engine.frame(Time(timestamp_ms / 1000.0)));
            let Some(cell) = this.upgrade() else {
                return;
            };
            let id = cell
                .borrow()
                .as_ref()
                .and_then(|cb| win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
            next.set(id);
        }));

        let first = callback
            .borrow()
            .as_ref()
            .map(|cb| window.request_animation_frame(cb.as_ref().unchecked_ref()))
            .transpose()?;
        pending.set(first);

        Ok(Self {
            window: window.clone(),
            pending,
            callback,
        })
    }

    fn stop(&mut self) {
        if let Some(id) = self.pending.take() {
            let _ = self.window.cancel_animation_frame(id);
        }
        self.callback.borrow_mut().take();
    }
}
