use std::fmt;

use crate::context::RenderContext;
use crate::error::EffectError;
use crate::types::ShaderKind;

/// A successfully compiled stage waiting to be linked.
///
/// Stages are consumed by [`link`](crate::program::link), which deletes them
/// once the program exists. A stage that never reaches linking must be given
/// back through [`ShaderStage::discard`].
pub struct ShaderStage<C: RenderContext> {
    kind: ShaderKind,
    raw: C::Shader,
}

impl<C: RenderContext> fmt::Debug for ShaderStage<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderStage")
            .field("kind", &self.kind)
            .field("raw", &self.raw)
            .finish()
    }
}

impl<C: RenderContext> ShaderStage<C> {
    pub fn kind(&self) -> ShaderKind {
        self.kind
    }

    pub(crate) fn raw(&self) -> C::Shader {
        self.raw
    }

    /// Releases the driver object without linking it.
    pub fn discard(self, ctx: &C) {
        ctx.delete_shader(self.raw);
    }
}

/// Compiles `source` as a stage of `kind`.
///
/// On failure the driver log is returned inside
/// [`EffectError::ShaderCompile`] and the half-built shader object is deleted.
pub fn compile<C: RenderContext>(
    ctx: &C,
    kind: ShaderKind,
    source: &str,
) -> Result<ShaderStage<C>, EffectError> {
    tracing::debug!(stage = %kind, "compiling shader");
    let raw = ctx
        .create_shader(kind)
        .map_err(|reason| EffectError::ResourceAllocation {
            resource: "shader object",
            reason,
        })?;

    ctx.shader_source(raw, source);
    ctx.compile_shader(raw);

    if !ctx.shader_compile_status(raw) {
        let mut log = ctx.shader_info_log(raw);
        if log.trim().is_empty() {
            log = String::from("driver reported failure without a log");
        }
        tracing::error!(stage = %kind, log = %log.trim_end(), "shader compilation failed");
        tracing::debug!(stage = %kind, %source, "source of failing shader");
        ctx.delete_shader(raw);
        return Err(EffectError::ShaderCompile { stage: kind, log });
    }

    tracing::debug!(stage = %kind, "shader compiled");
    Ok(ShaderStage { kind, raw })
}

/// Pass-through vertex stage: forwards a clip-space 2D position.
pub const VERTEX_SHADER_SOURCE: &str = r"attribute vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Aurora fragment stage.
///
/// Two sine waves (horizontal and vertical) multiply into an interference
/// value that picks between the brand green and gold; the result then blends
/// toward the lighter green across the surface width. Alpha is the wave scaled
/// by the 0.3 opacity ceiling. [`crate::pattern`] evaluates the same function
/// on the CPU.
pub const FRAGMENT_SHADER_SOURCE: &str = r"precision mediump float;

uniform float uTime;
uniform vec2 uResolution;

void main() {
    vec2 uv = gl_FragCoord.xy / uResolution;
    float time = uTime * 0.5;

    float wave = sin(uv.x * 8.0 + time) * 0.5 + 0.5;
    wave *= sin(uv.y * 6.0 + time * 0.8) * 0.5 + 0.5;

    vec3 green = vec3(0.059, 0.298, 0.227);
    vec3 gold = vec3(1.000, 0.824, 0.000);
    vec3 lightGreen = vec3(0.104, 0.420, 0.310);

    vec3 color = mix(green, gold, wave);
    color = mix(color, lightGreen, uv.x);

    gl_FragColor = vec4(color, wave * 0.3);
}
";
