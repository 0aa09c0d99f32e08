use std::cell::Cell;
use std::rc::Rc;

use crate::context::RenderContext;
use crate::geometry::GeometryBuffer;
use crate::host::Host;
use crate::program::Program;
use crate::types::{FrameHandle, SurfaceSize};

/// Time added to the accumulator on every frame.
///
/// The step is per frame, not per second, so the animation runs faster on
/// high refresh-rate displays.
pub const DEFAULT_TIME_STEP: f64 = 0.01;

/// Per-loop animation state.
///
/// Time is derived from the frame count (`frames * step`) rather than summed,
/// so after `N` frames it is exactly `N * step` with no accumulated rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    frames: u64,
    step: f64,
    size: SurfaceSize,
}

impl AnimationState {
    pub fn new(step: f64) -> Self {
        Self {
            frames: 0,
            step: step.max(0.0),
            size: SurfaceSize::default(),
        }
    }

    /// Value written to `uTime`.
    pub fn time(&self) -> f32 {
        (self.frames as f64 * self.step) as f32
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Surface size used by the latest frame.
    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn advance(&mut self, size: SurfaceSize) {
        self.frames = self.frames.saturating_add(1);
        self.size = size;
    }
}

/// The linked program and the quad it draws.
pub struct Pipeline<C: RenderContext> {
    pub program: Program<C>,
    pub geometry: GeometryBuffer<C>,
}

impl<C: RenderContext> Pipeline<C> {
    pub fn release(self, ctx: &C) {
        self.geometry.release(ctx);
        self.program.release(ctx);
    }
}

/// Pushes uniforms for `state` and draws one frame.
///
/// Uniform writes whose location was not found are skipped.
pub fn render_frame<C: RenderContext>(ctx: &C, pipeline: &Pipeline<C>, state: &AnimationState) {
    let locations = pipeline.program.locations();
    if let Some(location) = &locations.time {
        ctx.uniform_1f(location, state.time());
    }
    if let Some(location) = &locations.resolution {
        let [width, height] = state.size().as_vec2();
        ctx.uniform_2f(location, width, height);
    }
    ctx.clear_color_buffer();
    pipeline.geometry.draw(ctx);
}

struct LoopShared<H: Host> {
    host: H,
    context: Rc<H::Context>,
    pipeline: Rc<Pipeline<H::Context>>,
    size: Rc<Cell<SurfaceSize>>,
    state: Cell<AnimationState>,
    pending: Cell<Option<FrameHandle>>,
    running: Cell<bool>,
}

/// Refresh-driven render loop.
///
/// Each frame re-schedules itself before drawing, so [`RenderLoop::stop`]
/// always has exactly one pending callback to revoke.
pub struct RenderLoop<H: Host> {
    shared: Rc<LoopShared<H>>,
}

impl<H: Host> RenderLoop<H> {
    /// Schedules the first frame; nothing is drawn until it fires.
    pub fn start(
        host: H,
        context: Rc<H::Context>,
        pipeline: Rc<Pipeline<H::Context>>,
        size: Rc<Cell<SurfaceSize>>,
        time_step: f64,
    ) -> Self {
        let shared = Rc::new(LoopShared {
            host,
            context,
            pipeline,
            size,
            state: Cell::new(AnimationState::new(time_step)),
            pending: Cell::new(None),
            running: Cell::new(true),
        });
        schedule(&shared);
        if shared.running.get() {
            tracing::info!(time_step, "render loop started");
        }
        Self { shared }
    }

    /// Token of the next scheduled frame, if any.
    pub fn frame_handle(&self) -> Option<FrameHandle> {
        self.shared.pending.get()
    }

    pub fn animation_state(&self) -> AnimationState {
        self.shared.state.get()
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.get()
    }

    /// Cancels the pending frame. Returns `false` if the loop was already stopped.
    pub fn stop(&self) -> bool {
        if !self.shared.running.replace(false) {
            return false;
        }
        if let Some(handle) = self.shared.pending.take() {
            self.shared.host.cancel_frame(handle);
        }
        tracing::info!(frames = self.shared.state.get().frames(), "render loop stopped");
        true
    }
}

fn schedule<H: Host>(shared: &Rc<LoopShared<H>>) {
    let next = Rc::clone(shared);
    match shared.host.request_frame(Box::new(move || tick(&next))) {
        Some(handle) => shared.pending.set(Some(handle)),
        None => {
            shared.pending.set(None);
            shared.running.set(false);
            tracing::warn!("host refused to schedule a frame; render loop stopped");
        }
    }
}

fn tick<H: Host>(shared: &Rc<LoopShared<H>>) {
    if !shared.running.get() {
        return;
    }
    schedule(shared);

    let mut state = shared.state.get();
    state.advance(shared.size.get());
    shared.state.set(state);

    render_frame(&*shared.context, &shared.pipeline, &state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
    use crate::geometry::upload_quad;
    use crate::headless::{GlCall, HeadlessHost, RecordingContext};
    use crate::program::link;
    use crate::types::{ShaderKind, Topology};

    fn pipeline(host: &HeadlessHost) -> (Rc<RecordingContext>, Rc<Pipeline<RecordingContext>>) {
        let ctx = Rc::new(host.detached_context());
        let vertex = compile(&*ctx, ShaderKind::Vertex, VERTEX_SHADER_SOURCE).unwrap();
        let fragment = compile(&*ctx, ShaderKind::Fragment, FRAGMENT_SHADER_SOURCE).unwrap();
        let program = link(&*ctx, vertex, fragment).unwrap();
        let geometry = upload_quad(&*ctx, &program).unwrap();
        (ctx, Rc::new(Pipeline { program, geometry }))
    }

    #[test]
    fn time_is_frame_count_times_step() {
        let mut state = AnimationState::new(DEFAULT_TIME_STEP);
        let mut last = state.time();
        for _ in 0..100 {
            state.advance(SurfaceSize::new(1, 1));
            assert!(state.time() >= last);
            last = state.time();
        }
        assert_eq!(state.frames(), 100);
        assert_eq!(state.time(), 1.0);
    }

    #[test]
    fn nothing_draws_before_first_refresh() {
        let host = HeadlessHost::new();
        let (ctx, pipeline) = pipeline(&host);
        host.clear_calls();

        let render_loop = RenderLoop::start(
            host.clone(),
            ctx,
            pipeline,
            Rc::new(Cell::new(SurfaceSize::new(320, 200))),
            DEFAULT_TIME_STEP,
        );
        assert!(render_loop.is_running());
        assert!(render_loop.frame_handle().is_some());
        assert_eq!(host.pending_frames(), 1);
        assert!(host.draw_calls().is_empty());
        render_loop.stop();
    }

    #[test]
    fn each_frame_writes_uniforms_then_draws_strip() {
        let host = HeadlessHost::new();
        let (ctx, pipeline) = pipeline(&host);
        host.clear_calls();
        let size = Rc::new(Cell::new(SurfaceSize::new(320, 200)));

        let render_loop =
            RenderLoop::start(host.clone(), ctx, pipeline, Rc::clone(&size), DEFAULT_TIME_STEP);
        assert_eq!(host.run_frames(3), 3);

        let draws = host.draw_calls();
        assert_eq!(draws.len(), 3);
        assert!(draws.iter().all(|call| *call
            == GlCall::DrawArrays {
                topology: Topology::TriangleStrip,
                first: 0,
                count: 4,
            }));
        let calls = host.calls();
        assert_eq!(
            &calls[..4],
            &[
                GlCall::Uniform1f {
                    name: "uTime".into(),
                    value: 0.01,
                },
                GlCall::Uniform2f {
                    name: "uResolution".into(),
                    x: 320.0,
                    y: 200.0,
                },
                GlCall::Clear,
                GlCall::DrawArrays {
                    topology: Topology::TriangleStrip,
                    first: 0,
                    count: 4,
                },
            ]
        );

        size.set(SurfaceSize::new(640, 480));
        host.run_frames(1);
        assert_eq!(render_loop.animation_state().size(), SurfaceSize::new(640, 480));
        assert!(host.calls().contains(&GlCall::Uniform2f {
            name: "uResolution".into(),
            x: 640.0,
            y: 480.0,
        }));
        render_loop.stop();
    }

    #[test]
    fn stop_revokes_the_next_frame() {
        let host = HeadlessHost::new();
        let (ctx, pipeline) = pipeline(&host);
        let render_loop = RenderLoop::start(
            host.clone(),
            ctx,
            pipeline,
            Rc::new(Cell::new(SurfaceSize::new(8, 8))),
            DEFAULT_TIME_STEP,
        );
        host.run_frames(2);

        assert!(render_loop.stop());
        assert!(!render_loop.stop());
        assert_eq!(host.pending_frames(), 0);
        assert!(render_loop.frame_handle().is_none());
        assert_eq!(host.run_frames(5), 0);
        assert_eq!(render_loop.animation_state().frames(), 2);
    }

    #[test]
    fn refused_schedule_stops_the_loop() {
        let host = HeadlessHost::new();
        let (ctx, pipeline) = pipeline(&host);
        host.refuse_frames(true);
        let render_loop = RenderLoop::start(
            host.clone(),
            ctx,
            pipeline,
            Rc::new(Cell::new(SurfaceSize::new(8, 8))),
            DEFAULT_TIME_STEP,
        );
        assert!(!render_loop.is_running());
        assert!(render_loop.frame_handle().is_none());
    }
}
