use std::rc::Rc;

use crate::compile::compile;
use crate::config::EffectConfig;
use crate::context::RenderContext;
use crate::error::EffectError;
use crate::geometry::upload_quad;
use crate::host::Host;
use crate::program::link;
use crate::render_loop::{AnimationState, Pipeline, RenderLoop};
use crate::surface::SurfaceManager;
use crate::types::{ContextApi, FrameHandle, ShaderKind, SurfaceSize};

/// Observable lifecycle of an [`EffectController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectStatus {
    /// Surface attached and a frame is scheduled.
    Running,
    /// Surface attached but the host stopped handing out frames.
    Stalled,
    /// Construction failed; nothing was attached.
    Disabled { code: &'static str },
    /// `destroy` has run.
    Destroyed,
}

struct Active<H: Host> {
    surface: SurfaceManager<H>,
    pipeline: Rc<Pipeline<H::Context>>,
    render_loop: RenderLoop<H>,
}

impl<H: Host> Active<H> {
    fn teardown(self) {
        let Active {
            mut surface,
            pipeline,
            render_loop,
        } = self;

        render_loop.stop();
        drop(render_loop);
        surface.teardown();

        let context = Rc::clone(surface.context());
        match Rc::try_unwrap(pipeline) {
            Ok(pipeline) => pipeline.release(&*context),
            Err(_) => tracing::warn!("pipeline still referenced; leaving GPU objects to the context"),
        }
    }
}

enum State<H: Host> {
    Active(Active<H>),
    Disabled(EffectError),
    Destroyed,
}

/// Builds and owns one full-surface aurora effect.
///
/// This is the only type page bootstrap code touches. Construction never
/// fails outward: any error leaves the controller [`EffectStatus::Disabled`]
/// with the page untouched. Dropping the controller tears it down.
pub struct EffectController<H: Host> {
    container_id: String,
    state: State<H>,
}

impl<H: Host> EffectController<H> {
    /// Builds the default aurora effect inside the container named `container_id`.
    pub fn construct(host: H, container_id: &str) -> Self {
        Self::construct_with(host, container_id, EffectConfig::default())
    }

    /// Builds an effect from an explicit configuration.
    ///
    /// Runs context acquisition, compilation, linking, geometry upload, the
    /// first resize, and schedules the first frame. The first draw happens on
    /// the next refresh.
    pub fn construct_with(host: H, container_id: &str, config: EffectConfig) -> Self {
        tracing::info!(container = container_id, "initialising aurora effect");
        let state = match build(&host, container_id, &config) {
            Ok(active) => State::Active(active),
            Err(err @ EffectError::ContextUnavailable { .. }) => {
                tracing::warn!(container = container_id, error = %err, "effect disabled");
                State::Disabled(err)
            }
            Err(err) => {
                tracing::error!(
                    container = container_id,
                    code = err.code(),
                    error = %err,
                    "effect disabled"
                );
                State::Disabled(err)
            }
        };
        Self {
            container_id: container_id.to_owned(),
            state,
        }
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    pub fn status(&self) -> EffectStatus {
        match &self.state {
            State::Active(active) if active.render_loop.is_running() => EffectStatus::Running,
            State::Active(_) => EffectStatus::Stalled,
            State::Disabled(err) => EffectStatus::Disabled { code: err.code() },
            State::Destroyed => EffectStatus::Destroyed,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status() == EffectStatus::Running
    }

    /// The error that disabled construction, if any.
    pub fn failure(&self) -> Option<&EffectError> {
        match &self.state {
            State::Disabled(err) => Some(err),
            _ => None,
        }
    }

    /// Token of the next scheduled frame.
    pub fn frame_handle(&self) -> Option<FrameHandle> {
        match &self.state {
            State::Active(active) => active.render_loop.frame_handle(),
            _ => None,
        }
    }

    pub fn animation_state(&self) -> Option<AnimationState> {
        match &self.state {
            State::Active(active) => Some(active.render_loop.animation_state()),
            _ => None,
        }
    }

    pub fn surface_size(&self) -> Option<SurfaceSize> {
        match &self.state {
            State::Active(active) => Some(active.surface.size()),
            _ => None,
        }
    }

    pub fn context_api(&self) -> Option<ContextApi> {
        match &self.state {
            State::Active(active) => Some(active.surface.api()),
            _ => None,
        }
    }

    /// The attached surface element.
    pub fn surface(&self) -> Option<&H::Surface> {
        match &self.state {
            State::Active(active) => Some(active.surface.surface()),
            _ => None,
        }
    }

    /// Cancels the pending frame, detaches the surface, and releases GPU objects.
    ///
    /// Calling it again, or on a disabled controller, does nothing.
    pub fn destroy(&mut self) {
        match std::mem::replace(&mut self.state, State::Destroyed) {
            State::Active(active) => {
                active.teardown();
                tracing::info!(container = %self.container_id, "aurora effect destroyed");
            }
            disabled @ State::Disabled(_) => self.state = disabled,
            State::Destroyed => {
                tracing::debug!(container = %self.container_id, "destroy called on torn-down effect");
            }
        }
    }
}

impl<H: Host> Drop for EffectController<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn build<H: Host>(
    host: &H,
    container_id: &str,
    config: &EffectConfig,
) -> Result<Active<H>, EffectError> {
    let container = host
        .resolve_container(container_id)
        .ok_or_else(|| EffectError::ContainerNotFound(container_id.to_owned()))?;

    let mut surface = SurfaceManager::acquire(host, container, &config.context_preference)?;
    surface.configure_blending(config.blend, config.clear_color);
    let context = Rc::clone(surface.context());

    let vertex = compile(&*context, ShaderKind::Vertex, &config.vertex_source)?;
    let fragment = match compile(&*context, ShaderKind::Fragment, &config.fragment_source) {
        Ok(stage) => stage,
        Err(err) => {
            vertex.discard(&*context);
            return Err(err);
        }
    };
    let program = link(&*context, vertex, fragment)?;
    let geometry = match upload_quad(&*context, &program) {
        Ok(geometry) => geometry,
        Err(err) => {
            program.release(&*context);
            return Err(err);
        }
    };
    let pipeline = Rc::new(Pipeline { program, geometry });

    surface.attach(config.surface_style);

    let resolution = pipeline.program.locations().resolution.clone();
    surface.install_resize_reactor(move |context, size| {
        if let Some(location) = &resolution {
            let [width, height] = size.as_vec2();
            context.uniform_2f(location, width, height);
        }
    });

    let render_loop = RenderLoop::start(
        host.clone(),
        context,
        Rc::clone(&pipeline),
        surface.size_cell(),
        config.time_step,
    );

    let size = surface.size();
    tracing::info!(
        container = container_id,
        width = size.width,
        height = size.height,
        api = %surface.api(),
        "aurora effect running"
    );

    Ok(Active {
        surface,
        pipeline,
        render_loop,
    })
}
