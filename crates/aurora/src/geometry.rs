use bytemuck::{Pod, Zeroable};

use crate::context::RenderContext;
use crate::error::EffectError;
use crate::program::Program;
use crate::types::Topology;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
}

/// Clip-space square in strip order: bottom-left, bottom-right, top-left, top-right.
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
];

/// Static vertex buffer holding [`QUAD_VERTICES`].
pub struct GeometryBuffer<C: RenderContext> {
    raw: C::Buffer,
}

impl<C: RenderContext> GeometryBuffer<C> {
    pub const TOPOLOGY: Topology = Topology::TriangleStrip;
    pub const VERTEX_COUNT: i32 = QUAD_VERTICES.len() as i32;

    /// Issues the full-surface draw.
    pub fn draw(&self, ctx: &C) {
        ctx.draw_arrays(Self::TOPOLOGY, 0, Self::VERTEX_COUNT);
    }

    pub fn release(self, ctx: &C) {
        ctx.delete_buffer(self.raw);
    }
}

/// Uploads the quad once and wires it to the program's `position` attribute.
///
/// If the program does not use `position` the buffer is still created, but no
/// attribute stream is enabled.
pub fn upload_quad<C: RenderContext>(
    ctx: &C,
    program: &Program<C>,
) -> Result<GeometryBuffer<C>, EffectError> {
    let raw = ctx
        .create_buffer()
        .map_err(|reason| EffectError::ResourceAllocation {
            resource: "vertex buffer",
            reason,
        })?;

    ctx.upload_static_vertices(raw, bytemuck::cast_slice(&QUAD_VERTICES));

    match program.locations().position {
        Some(index) => ctx.bind_float_attribute(index, 2),
        None => tracing::warn!("quad uploaded but program has no position attribute"),
    }

    tracing::debug!(vertices = QUAD_VERTICES.len(), "full-surface quad uploaded");
    Ok(GeometryBuffer { raw })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile, FRAGMENT_SHADER_SOURCE, VERTEX_SHADER_SOURCE};
    use crate::headless::{GlCall, HeadlessHost};
    use crate::program::link;
    use crate::types::ShaderKind;

    #[test]
    fn quad_spans_clip_space_in_strip_order() {
        let corners: Vec<[f32; 2]> = QUAD_VERTICES.iter().map(|v| v.position).collect();
        assert_eq!(
            corners,
            vec![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]]
        );
        assert_eq!(std::mem::size_of_val(&QUAD_VERTICES), 32);
    }

    #[test]
    fn uploads_once_and_binds_position_stream() {
        let host = HeadlessHost::new();
        let ctx = host.detached_context();
        let vertex = compile(&ctx, ShaderKind::Vertex, VERTEX_SHADER_SOURCE).unwrap();
        let fragment = compile(&ctx, ShaderKind::Fragment, FRAGMENT_SHADER_SOURCE).unwrap();
        let program = link(&ctx, vertex, fragment).unwrap();

        let geometry = upload_quad(&ctx, &program).expect("upload");
        geometry.draw(&ctx);

        let calls = host.calls();
        let uploads: Vec<_> = calls
            .iter()
            .filter_map(|call| match call {
                GlCall::BufferData { bytes, .. } => Some(*bytes),
                _ => None,
            })
            .collect();
        assert_eq!(uploads, vec![32]);
        assert!(calls.contains(&GlCall::VertexAttribute {
            index: program.locations().position.unwrap(),
            components: 2,
        }));
        assert_eq!(
            calls.last(),
            Some(&GlCall::DrawArrays {
                topology: Topology::TriangleStrip,
                first: 0,
                count: 4,
            })
        );
    }
}
