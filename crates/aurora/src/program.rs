use std::fmt;

use crate::compile::ShaderStage;
use crate::context::RenderContext;
use crate::error::EffectError;

/// Vertex attribute carrying the clip-space quad corners.
pub const POSITION_ATTRIBUTE: &str = "position";
/// Uniform receiving the animation time accumulator.
pub const TIME_UNIFORM: &str = "uTime";
/// Uniform receiving the surface size in pixels.
pub const RESOLUTION_UNIFORM: &str = "uResolution";

/// Locations discovered right after linking.
///
/// Any entry may be `None` when the shader variant does not use it; callers
/// skip the matching write instead of failing.
pub struct LocationTable<C: RenderContext> {
    pub position: Option<u32>,
    pub time: Option<C::UniformLocation>,
    pub resolution: Option<C::UniformLocation>,
}

impl<C: RenderContext> Clone for LocationTable<C> {
    fn clone(&self) -> Self {
        Self {
            position: self.position,
            time: self.time.clone(),
            resolution: self.resolution.clone(),
        }
    }
}

impl<C: RenderContext> fmt::Debug for LocationTable<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationTable")
            .field("position", &self.position)
            .field("time", &self.time)
            .field("resolution", &self.resolution)
            .finish()
    }
}

/// Linked, active shader program.
pub struct Program<C: RenderContext> {
    raw: C::Program,
    locations: LocationTable<C>,
}

impl<C: RenderContext> fmt::Debug for Program<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Program")
            .field("raw", &self.raw)
            .field("locations", &self.locations)
            .finish()
    }
}

impl<C: RenderContext> Program<C> {
    pub fn raw(&self) -> C::Program {
        self.raw
    }

    pub fn locations(&self) -> &LocationTable<C> {
        &self.locations
    }

    /// Looks up any uniform by name. `None` means the uniform is unused.
    pub fn uniform_location(&self, ctx: &C, name: &str) -> Option<C::UniformLocation> {
        ctx.uniform_location(self.raw, name)
    }

    /// Looks up any attribute by name. `None` means the attribute is unused.
    pub fn attribute_location(&self, ctx: &C, name: &str) -> Option<u32> {
        ctx.attribute_location(self.raw, name)
    }

    /// Deactivates and deletes the program.
    pub fn release(self, ctx: &C) {
        ctx.use_program(None);
        ctx.delete_program(self.raw);
    }
}

/// Links two compiled stages into a program and makes it current.
///
/// Both stages are consumed: whatever the outcome, they are detached and
/// deleted before this returns. A failed link also deletes the program object
/// and reports the driver log through [`EffectError::ProgramLink`].
pub fn link<C: RenderContext>(
    ctx: &C,
    vertex: ShaderStage<C>,
    fragment: ShaderStage<C>,
) -> Result<Program<C>, EffectError> {
    let raw = match ctx.create_program() {
        Ok(raw) => raw,
        Err(reason) => {
            vertex.discard(ctx);
            fragment.discard(ctx);
            return Err(EffectError::ResourceAllocation {
                resource: "program object",
                reason,
            });
        }
    };

    let stages = [vertex.raw(), fragment.raw()];
    for shader in stages {
        ctx.attach_shader(raw, shader);
    }
    ctx.link_program(raw);
    let linked = ctx.program_link_status(raw);
    let log = if linked {
        String::new()
    } else {
        ctx.program_info_log(raw)
    };

    for shader in stages {
        ctx.detach_shader(raw, shader);
    }
    vertex.discard(ctx);
    fragment.discard(ctx);

    if !linked {
        let log = if log.trim().is_empty() {
            String::from("driver reported failure without a log")
        } else {
            log
        };
        tracing::error!(log = %log.trim_end(), "shader program failed to link");
        ctx.delete_program(raw);
        return Err(EffectError::ProgramLink { log });
    }

    ctx.use_program(Some(raw));

    let locations = LocationTable {
        position: ctx.attribute_location(raw, POSITION_ATTRIBUTE),
        time: ctx.uniform_location(raw, TIME_UNIFORM),
        resolution: ctx.uniform_location(raw, RESOLUTION_UNIFORM),
    };
    for (name, found) in [
        (POSITION_ATTRIBUTE, locations.position.is_some()),
        (TIME_UNIFORM, locations.time.is_some()),
        (RESOLUTION_UNIFORM, locations.resolution.is_some()),
    ] {
        if !found {
            tracing::warn!(input = name, "program does not use input; writes will be skipped");
        }
    }

    tracing::info!("shader program linked and activated");
    Ok(Program { raw, locations })
}
