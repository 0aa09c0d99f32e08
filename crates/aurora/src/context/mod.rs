//! Graphics seam.
//!
//! [`RenderContext`] is the slice of the WebGL API the effect actually uses.
//! Keeping it this narrow lets every component run against the
//! [`RecordingContext`](crate::headless::RecordingContext) in tests, while the
//! browser host hands out a `glow::Context` that implements the same trait.
//!
//! Handles are plain copies of driver object names; nothing here tracks
//! ownership, so callers release what they create.

mod glow_backend;

use std::fmt;

use crate::types::{BlendMode, ShaderKind, Topology};

pub trait RenderContext {
    type Shader: Copy + fmt::Debug;
    type Program: Copy + fmt::Debug;
    type Buffer: Copy + fmt::Debug;
    type UniformLocation: Clone + fmt::Debug;

    /// Driver version string (`VERSION` parameter).
    fn version(&self) -> String;

    fn create_shader(&self, kind: ShaderKind) -> Result<Self::Shader, String>;
    fn shader_source(&self, shader: Self::Shader, source: &str);
    fn compile_shader(&self, shader: Self::Shader);
    fn shader_compile_status(&self, shader: Self::Shader) -> bool;
    fn shader_info_log(&self, shader: Self::Shader) -> String;
    fn delete_shader(&self, shader: Self::Shader);

    fn create_program(&self) -> Result<Self::Program, String>;
    fn attach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn detach_shader(&self, program: Self::Program, shader: Self::Shader);
    fn link_program(&self, program: Self::Program);
    fn program_link_status(&self, program: Self::Program) -> bool;
    fn program_info_log(&self, program: Self::Program) -> String;
    fn use_program(&self, program: Option<Self::Program>);
    fn delete_program(&self, program: Self::Program);

    fn uniform_location(&self, program: Self::Program, name: &str)
        -> Option<Self::UniformLocation>;
    fn attribute_location(&self, program: Self::Program, name: &str) -> Option<u32>;

    fn create_buffer(&self) -> Result<Self::Buffer, String>;
    /// Binds `buffer` as the array buffer and uploads `data` with static usage.
    fn upload_static_vertices(&self, buffer: Self::Buffer, data: &[u8]);
    /// Points attribute `index` at tightly packed `f32` vectors of `components`
    /// in the bound array buffer and enables the stream.
    fn bind_float_attribute(&self, index: u32, components: i32);
    fn delete_buffer(&self, buffer: Self::Buffer);

    fn enable_blending(&self, mode: BlendMode);
    fn clear_color(&self, rgba: [f32; 4]);
    fn viewport(&self, width: u32, height: u32);

    fn uniform_1f(&self, location: &Self::UniformLocation, value: f32);
    fn uniform_2f(&self, location: &Self::UniformLocation, x: f32, y: f32);

    fn clear_color_buffer(&self);
    fn draw_arrays(&self, topology: Topology, first: i32, count: i32);
}
