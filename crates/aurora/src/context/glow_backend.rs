use glow::HasContext;

use super::RenderContext;
use crate::types::{BlendMode, ShaderKind, Topology};

// Every call below is a thin forward into the driver. The handles passed in
// were produced by this same context, which is what glow's safety contract
// asks for.
impl RenderContext for glow::Context {
    type Shader = glow::Shader;
    type Program = glow::Program;
    type Buffer = glow::Buffer;
    type UniformLocation = glow::UniformLocation;

    fn version(&self) -> String {
        unsafe { self.get_parameter_string(glow::VERSION) }
    }

    fn create_shader(&self, kind: ShaderKind) -> Result<Self::Shader, String> {
        let stage = match kind {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { HasContext::create_shader(self, stage) }
    }

    fn shader_source(&self, shader: Self::Shader, source: &str) {
        unsafe { HasContext::shader_source(self, shader, source) }
    }

    fn compile_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::compile_shader(self, shader) }
    }

    fn shader_compile_status(&self, shader: Self::Shader) -> bool {
        unsafe { self.get_shader_compile_status(shader) }
    }

    fn shader_info_log(&self, shader: Self::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: Self::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<Self::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn attach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::attach_shader(self, program, shader) }
    }

    fn detach_shader(&self, program: Self::Program, shader: Self::Shader) {
        unsafe { HasContext::detach_shader(self, program, shader) }
    }

    fn link_program(&self, program: Self::Program) {
        unsafe { HasContext::link_program(self, program) }
    }

    fn program_link_status(&self, program: Self::Program) -> bool {
        unsafe { self.get_program_link_status(program) }
    }

    fn program_info_log(&self, program: Self::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn use_program(&self, program: Option<Self::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn delete_program(&self, program: Self::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn uniform_location(
        &self,
        program: Self::Program,
        name: &str,
    ) -> Option<Self::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32> {
        unsafe { self.get_attrib_location(program, name) }
    }

    fn create_buffer(&self) -> Result<Self::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn upload_static_vertices(&self, buffer: Self::Buffer, data: &[u8]) {
        unsafe {
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW);
        }
    }

    fn bind_float_attribute(&self, index: u32, components: i32) {
        unsafe {
            self.enable_vertex_attrib_array(index);
            self.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, 0, 0);
        }
    }

    fn delete_buffer(&self, buffer: Self::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn enable_blending(&self, mode: BlendMode) {
        let (src, dst) = match mode {
            BlendMode::StraightAlpha => (glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA),
            BlendMode::Premultiplied => (glow::ONE, glow::ONE_MINUS_SRC_ALPHA),
        };
        unsafe {
            self.enable(glow::BLEND);
            self.blend_func(src, dst);
        }
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        let [r, g, b, a] = rgba;
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn viewport(&self, width: u32, height: u32) {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        unsafe { HasContext::viewport(self, 0, 0, width, height) }
    }

    fn uniform_1f(&self, location: &Self::UniformLocation, value: f32) {
        unsafe { self.uniform_1_f32(Some(location), value) }
    }

    fn uniform_2f(&self, location: &Self::UniformLocation, x: f32, y: f32) {
        unsafe { self.uniform_2_f32(Some(location), x, y) }
    }

    fn clear_color_buffer(&self) {
        unsafe { self.clear(glow::COLOR_BUFFER_BIT) }
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        let mode = match topology {
            Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        };
        unsafe { HasContext::draw_arrays(self, mode, first, count) }
    }
}
