use std::fmt;

/// Pipeline role of a compiled shader stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderKind::Vertex => f.write_str("vertex"),
            ShaderKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Graphics API generations a surface may hand out.
///
/// The order of [`ContextApi::PREFERENCE`] is the order acquisition walks:
/// the modern API first, the legacy one only when the modern one is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextApi {
    /// WebGL 2 / OpenGL ES 3.0 class context.
    WebGl2,
    /// WebGL 1 / OpenGL ES 2.0 class context.
    WebGl,
}

impl ContextApi {
    /// Default acquisition order.
    pub const PREFERENCE: [ContextApi; 2] = [ContextApi::WebGl2, ContextApi::WebGl];

    /// Context id understood by `HTMLCanvasElement.getContext`.
    pub fn context_id(self) -> &'static str {
        match self {
            ContextApi::WebGl2 => "webgl2",
            ContextApi::WebGl => "webgl",
        }
    }
}

impl fmt::Display for ContextApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context_id())
    }
}

/// Size of a surface or container in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Resolution as fed to the `uResolution` uniform.
    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Colour compositing applied to every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source-over with non-premultiplied colour (`SRC_ALPHA`, `ONE_MINUS_SRC_ALPHA`).
    #[default]
    StraightAlpha,
    /// Source-over for premultiplied colour (`ONE`, `ONE_MINUS_SRC_ALPHA`).
    Premultiplied,
}

/// Primitive topology for `drawArrays`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    TriangleStrip,
}

/// Cancellation token for one scheduled frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

impl FrameHandle {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Token identifying a registered resize listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResizeSubscription(u64);

impl ResizeSubscription {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Inline style declarations applied to the surface element.
pub type SurfaceStyle = &'static [(&'static str, &'static str)];

/// Pins the surface to the container's top-left corner and stretches it edge to edge.
pub const FILL_CONTAINER_STYLE: SurfaceStyle = &[
    ("position", "absolute"),
    ("top", "0"),
    ("left", "0"),
    ("width", "100%"),
    ("height", "100%"),
];
