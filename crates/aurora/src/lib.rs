//! Aurora backdrop: a full-surface animated shader drawn behind page content.
//!
//! The crate glues a host page, a WebGL-class graphics context, and a single
//! fragment shader together. The overall flow is:
//!
//! ```text
//!   page bootstrap
//!          │ container id
//!          ▼
//!   EffectController::construct ──▶ SurfaceManager::acquire ──▶ compile ──▶ link ──▶ upload_quad
//!          │                                 │
//!          │                                 └─▶ resize reactor ─▶ viewport + uResolution
//!          ▼
//!   RenderLoop::start ──▶ Host::request_frame ──▶ tick() ──▶ render_frame() ─▶ uTime, draw
//!          ▲                                          │
//!          └──────────────── re-schedule ◀────────────┘
//! ```
//!
//! Everything that touches the page goes through the [`Host`] trait and every
//! GPU call through [`RenderContext`], so the same pipeline runs against the
//! browser (`aurora-web`) and against [`HeadlessHost`] in tests. Failures at
//! any stage disable the effect without touching the page; see
//! [`EffectError`].

pub mod compile;
pub mod config;
pub mod context;
pub mod effect;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod pattern;
pub mod program;
pub mod render_loop;
pub mod surface;
pub mod types;

pub use compile::{compile, ShaderStage, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
pub use config::EffectConfig;
pub use context::RenderContext;
pub use effect::{EffectController, EffectStatus};
pub use error::EffectError;
pub use geometry::{upload_quad, GeometryBuffer, QuadVertex, QUAD_VERTICES};
pub use headless::{GlCall, HeadlessHost, HeadlessSurface, RecordingContext};
pub use host::{FrameCallback, FrameScheduler, Host, ResizeListener};
pub use program::{link, LocationTable, Program};
pub use render_loop::{render_frame, AnimationState, Pipeline, RenderLoop, DEFAULT_TIME_STEP};
pub use surface::SurfaceManager;
pub use types::{
    BlendMode, ContextApi, FrameHandle, ResizeSubscription, ShaderKind, SurfaceSize,
    SurfaceStyle, Topology, FILL_CONTAINER_STYLE,
};
