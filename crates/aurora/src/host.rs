//! Host seam: everything the effect needs from the page it lives in.
//!
//! The browser implementation lives in the `aurora-web` crate; tests and
//! GPU-less embedders use [`HeadlessHost`](crate::headless::HeadlessHost).
//! All methods run on the host's single UI thread, so implementations are
//! free to use `Rc`/`RefCell` internally.

use crate::context::RenderContext;
use crate::types::{ContextApi, FrameHandle, ResizeSubscription, SurfaceSize, SurfaceStyle};

/// Callback invoked on the next display refresh.
pub type FrameCallback = Box<dyn FnOnce()>;
/// Callback invoked on every window resize notification.
pub type ResizeListener = Box<dyn FnMut()>;

/// Display-refresh scheduling primitive.
pub trait FrameScheduler {
    /// Queues `callback` for the next refresh. `None` when the host refuses.
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle>;
    /// Revokes a queued callback. Unknown or already-fired handles are ignored.
    fn cancel_frame(&self, handle: FrameHandle);
}

pub trait Host: FrameScheduler + Clone + 'static {
    /// Element the surface is appended to.
    type Container: Clone + 'static;
    /// Drawing surface element (canvas-equivalent).
    type Surface: Clone + 'static;
    type Context: RenderContext + 'static;

    fn resolve_container(&self, id: &str) -> Option<Self::Container>;
    fn create_surface(&self) -> Option<Self::Surface>;
    /// Requests a context of exactly `api`; no fallback happens here.
    fn acquire_context(&self, surface: &Self::Surface, api: ContextApi) -> Option<Self::Context>;

    /// Current layout size of the container in pixels.
    fn content_size(&self, container: &Self::Container) -> SurfaceSize;
    /// Sets the surface's backing-store size in pixels.
    fn set_surface_size(&self, surface: &Self::Surface, size: SurfaceSize);
    fn apply_style(&self, surface: &Self::Surface, style: SurfaceStyle);

    fn attach(&self, container: &Self::Container, surface: &Self::Surface);
    fn detach(&self, container: &Self::Container, surface: &Self::Surface);

    fn subscribe_resize(&self, listener: ResizeListener) -> Option<ResizeSubscription>;
    fn unsubscribe_resize(&self, subscription: ResizeSubscription);
}
