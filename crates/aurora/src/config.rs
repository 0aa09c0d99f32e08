use std::borrow::Cow;

use crate::compile::{FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
use crate::render_loop::DEFAULT_TIME_STEP;
use crate::types::{BlendMode, ContextApi, SurfaceStyle, FILL_CONTAINER_STYLE};

/// Immutable build parameters for one effect.
///
/// The default is the aurora backdrop itself; page code never supplies one.
/// Embedders and tests use the `with_*` methods to swap single fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectConfig {
    /// GLSL source of the vertex stage.
    pub vertex_source: Cow<'static, str>,
    /// GLSL source of the fragment stage.
    pub fragment_source: Cow<'static, str>,
    /// Amount added to `uTime` per frame.
    pub time_step: f64,
    /// Colour the surface is cleared to before each draw.
    pub clear_color: [f32; 4],
    /// Compositing applied to the draw.
    pub blend: BlendMode,
    /// Context APIs to try, most preferred first.
    pub context_preference: Vec<ContextApi>,
    /// Inline style given to the surface element when attached.
    pub surface_style: SurfaceStyle,
}

impl EffectConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vertex_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.vertex_source = source.into();
        self
    }

    pub fn with_fragment_source(mut self, source: impl Into<Cow<'static, str>>) -> Self {
        self.fragment_source = source.into();
        self
    }

    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    pub fn with_context_preference(mut self, apis: &[ContextApi]) -> Self {
        self.context_preference = apis.to_vec();
        self
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            vertex_source: Cow::Borrowed(VERTEX_SHADER_SOURCE),
            fragment_source: Cow::Borrowed(FRAGMENT_SHADER_SOURCE),
            time_step: DEFAULT_TIME_STEP,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            blend: BlendMode::StraightAlpha,
            context_preference: ContextApi::PREFERENCE.to_vec(),
            surface_style: FILL_CONTAINER_STYLE,
        }
    }
}
