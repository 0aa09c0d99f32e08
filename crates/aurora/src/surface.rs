use std::cell::Cell;
use std::rc::Rc;

use crate::context::RenderContext;
use crate::error::EffectError;
use crate::host::Host;
use crate::types::{BlendMode, ContextApi, ResizeSubscription, SurfaceSize, SurfaceStyle};

/// Owns the drawing surface, its context, and the resize reactor.
pub struct SurfaceManager<H: Host> {
    host: H,
    container: H::Container,
    surface: H::Surface,
    context: Rc<H::Context>,
    api: ContextApi,
    size: Rc<Cell<SurfaceSize>>,
    attached: bool,
    subscription: Option<ResizeSubscription>,
}

impl<H: Host> SurfaceManager<H> {
    /// Creates a surface and walks `preference` until one API yields a context.
    ///
    /// Running out of APIs is reported as [`EffectError::ContextUnavailable`];
    /// the surface has not been attached at that point, so the page is left
    /// untouched.
    pub fn acquire(
        host: &H,
        container: H::Container,
        preference: &[ContextApi],
    ) -> Result<Self, EffectError> {
        let tried = || {
            preference
                .iter()
                .map(|api| api.context_id())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let surface = host
            .create_surface()
            .ok_or_else(|| EffectError::ContextUnavailable { tried: tried() })?;

        for (attempt, &api) in preference.iter().enumerate() {
            let Some(context) = host.acquire_context(&surface, api) else {
                tracing::debug!(%api, "graphics context not offered");
                continue;
            };
            if attempt > 0 {
                tracing::info!(%api, "fell back to legacy graphics context");
            }
            tracing::info!(%api, version = %context.version(), "graphics context created");
            return Ok(Self {
                host: host.clone(),
                container,
                surface,
                context: Rc::new(context),
                api,
                size: Rc::new(Cell::new(SurfaceSize::default())),
                attached: false,
                subscription: None,
            });
        }

        Err(EffectError::ContextUnavailable { tried: tried() })
    }

    pub fn context(&self) -> &Rc<H::Context> {
        &self.context
    }

    pub fn api(&self) -> ContextApi {
        self.api
    }

    pub fn surface(&self) -> &H::Surface {
        &self.surface
    }

    /// Surface size as of the latest resize notification.
    pub fn size(&self) -> SurfaceSize {
        self.size.get()
    }

    pub(crate) fn size_cell(&self) -> Rc<Cell<SurfaceSize>> {
        Rc::clone(&self.size)
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Enables compositing over whatever sits behind the surface and sets
    /// the clear colour.
    pub fn configure_blending(&self, mode: BlendMode, clear_color: [f32; 4]) {
        self.context.enable_blending(mode);
        self.context.clear_color(clear_color);
        tracing::debug!(?mode, "blending configured");
    }

    /// Styles the surface and appends it to the container.
    pub fn attach(&mut self, style: SurfaceStyle) {
        if self.attached {
            return;
        }
        self.host.apply_style(&self.surface, style);
        self.host.attach(&self.container, &self.surface);
        self.attached = true;
        tracing::info!("surface attached to container");
    }

    /// Keeps the surface sized to the container.
    ///
    /// The reactor runs once right away and then on every host resize
    /// notification: it reads the container's layout size, resizes the
    /// surface, updates the viewport, then hands the new size to `on_resize`
    /// for any cached uniform.
    pub fn install_resize_reactor<F>(&mut self, mut on_resize: F)
    where
        F: FnMut(&H::Context, SurfaceSize) + 'static,
    {
        if let Some(previous) = self.subscription.take() {
            self.host.unsubscribe_resize(previous);
        }

        let host = self.host.clone();
        let container = self.container.clone();
        let surface = self.surface.clone();
        let context = Rc::clone(&self.context);
        let size = Rc::clone(&self.size);
        let mut reactor = move || {
            let next = host.content_size(&container);
            host.set_surface_size(&surface, next);
            context.viewport(next.width, next.height);
            size.set(next);
            on_resize(&context, next);
            tracing::debug!(width = next.width, height = next.height, "surface resized");
        };

        reactor();
        self.subscription = self.host.subscribe_resize(Box::new(reactor));
        if self.subscription.is_none() {
            tracing::warn!("host rejected resize listener; surface keeps its initial size");
        }
    }

    /// Drops the resize listener and detaches the surface. Safe to repeat.
    pub fn teardown(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.host.unsubscribe_resize(subscription);
        }
        if self.attached {
            self.host.detach(&self.container, &self.surface);
            self.attached = false;
            tracing::info!("surface detached from container");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{GlCall, HeadlessHost};
    use crate::types::FILL_CONTAINER_STYLE;

    fn manager(host: &HeadlessHost, size: SurfaceSize) -> SurfaceManager<HeadlessHost> {
        let container = host.add_container("backdrop", size);
        SurfaceManager::acquire(host, container, &ContextApi::PREFERENCE).expect("context")
    }

    #[test]
    fn prefers_modern_api() {
        let host = HeadlessHost::new();
        let surfaces = manager(&host, SurfaceSize::new(10, 10));
        assert_eq!(surfaces.api(), ContextApi::WebGl2);
        assert_eq!(host.context_api(surfaces.surface()), Some(ContextApi::WebGl2));
    }

    #[test]
    fn falls_back_to_legacy_api() {
        let host = HeadlessHost::new();
        host.set_available_apis(&[ContextApi::WebGl]);
        let surfaces = manager(&host, SurfaceSize::new(10, 10));
        assert_eq!(surfaces.api(), ContextApi::WebGl);
    }

    #[test]
    fn reports_unavailable_when_no_api_is_offered() {
        let host = HeadlessHost::new();
        host.set_available_apis(&[]);
        let container = host.add_container("backdrop", SurfaceSize::new(10, 10));
        let err = SurfaceManager::acquire(&host, container, &ContextApi::PREFERENCE)
            .err()
            .expect("must fail");
        assert_eq!(err.code(), "CONTEXT_UNAVAILABLE");
        assert_eq!(err.to_string(), "no graphics context available (tried webgl2, webgl)");
        assert!(host.children("backdrop").is_empty());
    }

    #[test]
    fn reactor_sizes_immediately_and_on_every_resize() {
        let host = HeadlessHost::new();
        let mut surfaces = manager(&host, SurfaceSize::new(800, 600));
        surfaces.attach(FILL_CONTAINER_STYLE);

        let seen = Rc::new(Cell::new(SurfaceSize::default()));
        let sink = Rc::clone(&seen);
        surfaces.install_resize_reactor(move |_, size| sink.set(size));

        assert_eq!(surfaces.size(), SurfaceSize::new(800, 600));
        assert_eq!(host.surface_size(surfaces.surface()), SurfaceSize::new(800, 600));
        assert_eq!(seen.get(), SurfaceSize::new(800, 600));

        host.resize_container("backdrop", SurfaceSize::new(1024, 300));
        assert_eq!(surfaces.size(), SurfaceSize::new(1024, 300));
        assert_eq!(host.surface_size(surfaces.surface()), SurfaceSize::new(1024, 300));
        assert_eq!(seen.get(), SurfaceSize::new(1024, 300));
        assert!(host.calls().contains(&GlCall::Viewport {
            width: 1024,
            height: 300
        }));
    }

    #[test]
    fn teardown_detaches_once_and_unsubscribes() {
        let host = HeadlessHost::new();
        let mut surfaces = manager(&host, SurfaceSize::new(64, 64));
        surfaces.attach(FILL_CONTAINER_STYLE);
        surfaces.install_resize_reactor(|_, _| {});
        assert_eq!(host.children("backdrop").len(), 1);
        assert_eq!(host.resize_listener_count(), 1);

        surfaces.teardown();
        surfaces.teardown();
        assert!(host.children("backdrop").is_empty());
        assert_eq!(host.resize_listener_count(), 0);
        assert!(!surfaces.is_attached());
    }
}
