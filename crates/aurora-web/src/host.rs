use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Context as _;
use aurora::host::{FrameCallback, FrameScheduler, Host, ResizeListener};
use aurora::{ContextApi, FrameHandle, ResizeSubscription, SurfaceSize, SurfaceStyle};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, HtmlCanvasElement, HtmlElement, WebGl2RenderingContext, WebGlRenderingContext,
    Window,
};

struct Inner {
    window: Window,
    document: Document,
    next_id: Cell<u64>,
    /// Our frame id to the browser's request id and the pending callback.
    frames: RefCell<HashMap<u64, (i32, FrameCallback)>>,
    listeners: RefCell<HashMap<u64, Closure<dyn FnMut()>>>,
}

impl Inner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

/// The browser page: DOM containers, `<canvas>` surfaces, WebGL contexts,
/// `requestAnimationFrame`, and window `resize` events.
#[derive(Clone)]
pub struct WebHost {
    inner: Rc<Inner>,
}

impl WebHost {
    pub fn new() -> anyhow::Result<Self> {
        let window = web_sys::window().context("no global window")?;
        let document = window.document().context("window has no document")?;
        Ok(Self {
            inner: Rc::new(Inner {
                window,
                document,
                next_id: Cell::new(0),
                frames: RefCell::new(HashMap::new()),
                listeners: RefCell::new(HashMap::new()),
            }),
        })
    }
}

fn css_pixels(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

impl FrameScheduler for WebHost {
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle> {
        let id = self.inner.next_id();
        // The shim holds only a weak reference, so a revoked frame that never
        // fires keeps none of the effect alive.
        let weak = Rc::downgrade(&self.inner);
        let fire = Closure::once_into_js(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let entry = inner.frames.borrow_mut().remove(&id);
            if let Some((_, callback)) = entry {
                callback();
            }
        });

        match self
            .inner
            .window
            .request_animation_frame(fire.unchecked_ref())
        {
            Ok(request) => {
                self.inner
                    .frames
                    .borrow_mut()
                    .insert(id, (request, callback));
                Some(FrameHandle::new(id))
            }
            Err(err) => {
                tracing::warn!(error = ?err, "requestAnimationFrame rejected");
                None
            }
        }
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let entry = self.inner.frames.borrow_mut().remove(&handle.raw());
        if let Some((request, callback)) = entry {
            if let Err(err) = self.inner.window.cancel_animation_frame(request) {
                tracing::warn!(error = ?err, "cancelAnimationFrame failed");
            }
            drop(callback);
        }
    }
}

impl Host for WebHost {
    type Container = HtmlElement;
    type Surface = HtmlCanvasElement;
    type Context = glow::Context;

    fn resolve_container(&self, id: &str) -> Option<HtmlElement> {
        self.inner
            .document
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn create_surface(&self) -> Option<HtmlCanvasElement> {
        match self.inner.document.create_element("canvas") {
            Ok(element) => element.dyn_into::<HtmlCanvasElement>().ok(),
            Err(err) => {
                tracing::warn!(error = ?err, "could not create canvas element");
                None
            }
        }
    }

    fn acquire_context(&self, surface: &HtmlCanvasElement, api: ContextApi) -> Option<glow::Context> {
        let raw = surface.get_context(api.context_id()).ok().flatten()?;
        match api {
            ContextApi::WebGl2 => raw
                .dyn_into::<WebGl2RenderingContext>()
                .ok()
                .map(glow::Context::from_webgl2_context),
            ContextApi::WebGl => raw
                .dyn_into::<WebGlRenderingContext>()
                .ok()
                .map(glow::Context::from_webgl1_context),
        }
    }

    fn content_size(&self, container: &HtmlElement) -> SurfaceSize {
        SurfaceSize::new(
            css_pixels(container.offset_width()),
            css_pixels(container.offset_height()),
        )
    }

    fn set_surface_size(&self, surface: &HtmlCanvasElement, size: SurfaceSize) {
        surface.set_width(size.width);
        surface.set_height(size.height);
    }

    fn apply_style(&self, surface: &HtmlCanvasElement, style: SurfaceStyle) {
        let declaration = surface.style();
        for &(property, value) in style {
            if let Err(err) = declaration.set_property(property, value) {
                tracing::warn!(property, error = ?err, "could not apply surface style");
            }
        }
    }

    fn attach(&self, container: &HtmlElement, surface: &HtmlCanvasElement) {
        if let Err(err) = container.append_child(surface) {
            tracing::error!(error = ?err, "could not append surface to container");
        }
    }

    fn detach(&self, container: &HtmlElement, surface: &HtmlCanvasElement) {
        if let Err(err) = container.remove_child(surface) {
            tracing::warn!(error = ?err, "could not remove surface from container");
        }
    }

    fn subscribe_resize(&self, listener: ResizeListener) -> Option<ResizeSubscription> {
        let closure = Closure::wrap(listener);
        if let Err(err) = self
            .inner
            .window
            .add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
        {
            tracing::warn!(error = ?err, "could not subscribe to window resize");
            return None;
        }
        let id = self.inner.next_id();
        self.inner.listeners.borrow_mut().insert(id, closure);
        Some(ResizeSubscription::new(id))
    }

    fn unsubscribe_resize(&self, subscription: ResizeSubscription) {
        let removed = self.inner.listeners.borrow_mut().remove(&subscription.raw());
        if let Some(closure) = removed {
            if let Err(err) = self
                .inner
                .window
                .remove_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())
            {
                tracing::warn!(error = ?err, "could not unsubscribe from window resize");
            }
        }
    }
}
