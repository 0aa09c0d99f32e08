//! GPU-less host and context.
//!
//! [`HeadlessHost`] stands in for a browser page: named containers with a
//! layout size, surfaces that can be attached and resized, a manually pumped
//! refresh queue, and window resize dispatch. Every context it hands out is a
//! [`RecordingContext`] that validates shader sources just enough to fail the
//! way a driver would, and logs every state-changing call as a [`GlCall`].

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::context::RenderContext;
use crate::host::{FrameCallback, FrameScheduler, Host, ResizeListener};
use crate::types::{
    BlendMode, ContextApi, FrameHandle, ResizeSubscription, ShaderKind, SurfaceSize, SurfaceStyle,
    Topology,
};

/// One recorded context call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader { shader: u32, kind: ShaderKind },
    CompileShader { shader: u32, ok: bool },
    DeleteShader { shader: u32 },
    CreateProgram { program: u32 },
    AttachShader { program: u32, shader: u32 },
    DetachShader { program: u32, shader: u32 },
    LinkProgram { program: u32, ok: bool },
    UseProgram { program: Option<u32> },
    DeleteProgram { program: u32 },
    CreateBuffer { buffer: u32 },
    BufferData { buffer: u32, bytes: usize },
    VertexAttribute { index: u32, components: i32 },
    DeleteBuffer { buffer: u32 },
    EnableBlending(BlendMode),
    ClearColor([f32; 4]),
    Viewport { width: u32, height: u32 },
    Uniform1f { name: String, value: f32 },
    Uniform2f { name: String, x: f32, y: f32 },
    Clear,
    DrawArrays { topology: Topology, first: i32, count: i32 },
}

/// Uniform location handed out by [`RecordingContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUniform {
    pub program: u32,
    pub name: String,
}

#[derive(Debug)]
struct ShaderObject {
    kind: ShaderKind,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    attributes: Vec<String>,
}

#[derive(Debug, Default)]
struct Driver {
    next_object: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    buffers: Vec<u32>,
    link_failure: Option<String>,
    calls: Vec<GlCall>,
}

impl Driver {
    fn allocate(&mut self) -> u32 {
        self.next_object += 1;
        self.next_object
    }

    fn record(&mut self, call: GlCall) {
        self.calls.push(call);
    }

    fn compiled_stage(&self, attached: &[u32], kind: ShaderKind) -> Option<&ShaderObject> {
        attached
            .iter()
            .filter_map(|id| self.shaders.get(id))
            .find(|object| object.kind == kind && object.compiled)
    }

    /// Active uniforms and attributes of a program built from `attached`.
    fn resolve_link(&self, attached: &[u32]) -> Result<(Vec<String>, Vec<String>), String> {
        let vertex = self
            .compiled_stage(attached, ShaderKind::Vertex)
            .ok_or_else(|| String::from("error: no compiled vertex shader attached"))?;
        let fragment = self
            .compiled_stage(attached, ShaderKind::Fragment)
            .ok_or_else(|| String::from("error: no compiled fragment shader attached"))?;

        let mut uniforms = declared(&vertex.source, "uniform");
        for name in declared(&fragment.source, "uniform") {
            if !uniforms.contains(&name) {
                uniforms.push(name);
            }
        }
        Ok((uniforms, declared(&vertex.source, "attribute")))
    }
}

/// Checks the gross structure of a GLSL source.
///
/// Returns a driver-style log line on failure.
fn validate_source(source: &str) -> Result<(), String> {
    let mut braces = 0i32;
    let mut parens = 0i32;
    for (number, line) in source.lines().enumerate() {
        for ch in line.chars() {
            match ch {
                '{' => braces += 1,
                '}' => braces -= 1,
                '(' => parens += 1,
                ')' => parens -= 1,
                _ => {}
            }
            if braces < 0 || parens < 0 {
                return Err(format!("ERROR: 0:{}: unexpected '{ch}'", number + 1));
            }
        }
    }
    let last = source.lines().count().max(1);
    if parens != 0 {
        return Err(format!("ERROR: 0:{last}: '(' : syntax error, unbalanced parentheses"));
    }
    if braces != 0 {
        return Err(format!("ERROR: 0:{last}: '{{' : syntax error, unexpected end of file"));
    }
    if !source.contains("void main") {
        return Err(String::from("ERROR: 0:1: 'main' : missing entry point"));
    }
    Ok(())
}

/// Names declared with `qualifier` (`uniform`, `attribute`) in declaration order.
fn declared(source: &str, qualifier: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix(qualifier)?;
            if !rest.starts_with(char::is_whitespace) {
                return None;
            }
            let declaration = rest.split(';').next()?;
            declaration
                .split_whitespace()
                .last()
                .map(|name| name.split('[').next().unwrap_or(name).to_owned())
        })
        .collect()
}

/// Context that records calls instead of driving a GPU.
#[derive(Clone)]
pub struct RecordingContext {
    driver: Rc<RefCell<Driver>>,
    api: ContextApi,
}

impl RenderContext for RecordingContext {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type UniformLocation = RecordedUniform;

    fn version(&self) -> String {
        match self.api {
            ContextApi::WebGl2 => String::from("WebGL 2.0 (headless)"),
            ContextApi::WebGl => String::from("WebGL 1.0 (headless)"),
        }
    }

    fn create_shader(&self, kind: ShaderKind) -> Result<u32, String> {
        let mut driver = self.driver.borrow_mut();
        let shader = driver.allocate();
        driver.shaders.insert(
            shader,
            ShaderObject {
                kind,
                source: String::new(),
                compiled: false,
                log: String::new(),
            },
        );
        driver.record(GlCall::CreateShader { shader, kind });
        Ok(shader)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        if let Some(object) = self.driver.borrow_mut().shaders.get_mut(&shader) {
            object.source = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut driver = self.driver.borrow_mut();
        let Some(object) = driver.shaders.get_mut(&shader) else {
            return;
        };
        let outcome = validate_source(&object.source);
        object.compiled = outcome.is_ok();
        object.log = outcome.err().unwrap_or_default();
        let ok = object.compiled;
        driver.record(GlCall::CompileShader { shader, ok });
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.driver
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|object| object.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.driver
            .borrow()
            .shaders
            .get(&shader)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut driver = self.driver.borrow_mut();
        if driver.shaders.remove(&shader).is_some() {
            driver.record(GlCall::DeleteShader { shader });
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut driver = self.driver.borrow_mut();
        let program = driver.allocate();
        driver.programs.insert(program, ProgramObject::default());
        driver.record(GlCall::CreateProgram { program });
        Ok(program)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut driver = self.driver.borrow_mut();
        if let Some(object) = driver.programs.get_mut(&program) {
            object.attached.push(shader);
        }
        driver.record(GlCall::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: u32, shader: u32) {
        let mut driver = self.driver.borrow_mut();
        if let Some(object) = driver.programs.get_mut(&program) {
            object.attached.retain(|&attached| attached != shader);
        }
        driver.record(GlCall::DetachShader { program, shader });
    }

    fn link_program(&self, program: u32) {
        let mut driver = self.driver.borrow_mut();
        let forced = driver.link_failure.take();
        let Some(attached) = driver.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };

        let outcome = match forced {
            Some(log) => Err(log),
            None => driver.resolve_link(&attached),
        };

        let ok = outcome.is_ok();
        if let Some(object) = driver.programs.get_mut(&program) {
            match outcome {
                Ok((uniforms, attributes)) => {
                    object.linked = true;
                    object.log.clear();
                    object.uniforms = uniforms;
                    object.attributes = attributes;
                }
                Err(log) => {
                    object.linked = false;
                    object.log = log;
                }
            }
        }
        driver.record(GlCall::LinkProgram { program, ok });
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.driver
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|object| object.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.driver
            .borrow()
            .programs
            .get(&program)
            .map(|object| object.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<u32>) {
        self.driver
            .borrow_mut()
            .record(GlCall::UseProgram { program });
    }

    fn delete_program(&self, program: u32) {
        let mut driver = self.driver.borrow_mut();
        if driver.programs.remove(&program).is_some() {
            driver.record(GlCall::DeleteProgram { program });
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<RecordedUniform> {
        let driver = self.driver.borrow();
        let object = driver.programs.get(&program)?;
        (object.linked && object.uniforms.iter().any(|uniform| uniform == name)).then(|| {
            RecordedUniform {
                program,
                name: name.to_owned(),
            }
        })
    }

    fn attribute_location(&self, program: u32, name: &str) -> Option<u32> {
        let driver = self.driver.borrow();
        let object = driver.programs.get(&program).filter(|object| object.linked)?;
        let index = object.attributes.iter().position(|attribute| attribute == name)?;
        u32::try_from(index).ok()
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut driver = self.driver.borrow_mut();
        let buffer = driver.allocate();
        driver.buffers.push(buffer);
        driver.record(GlCall::CreateBuffer { buffer });
        Ok(buffer)
    }

    fn upload_static_vertices(&self, buffer: u32, data: &[u8]) {
        self.driver.borrow_mut().record(GlCall::BufferData {
            buffer,
            bytes: data.len(),
        });
    }

    fn bind_float_attribute(&self, index: u32, components: i32) {
        self.driver
            .borrow_mut()
            .record(GlCall::VertexAttribute { index, components });
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut driver = self.driver.borrow_mut();
        let before = driver.buffers.len();
        driver.buffers.retain(|&live| live != buffer);
        if driver.buffers.len() != before {
            driver.record(GlCall::DeleteBuffer { buffer });
        }
    }

    fn enable_blending(&self, mode: BlendMode) {
        self.driver.borrow_mut().record(GlCall::EnableBlending(mode));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        self.driver.borrow_mut().record(GlCall::ClearColor(rgba));
    }

    fn viewport(&self, width: u32, height: u32) {
        self.driver
            .borrow_mut()
            .record(GlCall::Viewport { width, height });
    }

    fn uniform_1f(&self, location: &RecordedUniform, value: f32) {
        self.driver.borrow_mut().record(GlCall::Uniform1f {
            name: location.name.clone(),
            value,
        });
    }

    fn uniform_2f(&self, location: &RecordedUniform, x: f32, y: f32) {
        self.driver.borrow_mut().record(GlCall::Uniform2f {
            name: location.name.clone(),
            x,
            y,
        });
    }

    fn clear_color_buffer(&self) {
        self.driver.borrow_mut().record(GlCall::Clear);
    }

    fn draw_arrays(&self, topology: Topology, first: i32, count: i32) {
        self.driver.borrow_mut().record(GlCall::DrawArrays {
            topology,
            first,
            count,
        });
    }
}

/// Named element surfaces are appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessContainer {
    id: String,
}

impl HeadlessContainer {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Canvas stand-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeadlessSurface(u32);

#[derive(Debug, Default)]
struct SurfaceState {
    size: SurfaceSize,
    style: Vec<(String, String)>,
    api: Option<ContextApi>,
}

#[derive(Debug, Default)]
struct ContainerState {
    size: SurfaceSize,
    children: Vec<HeadlessSurface>,
}

struct Inner {
    driver: Rc<RefCell<Driver>>,
    containers: RefCell<HashMap<String, ContainerState>>,
    surfaces: RefCell<HashMap<HeadlessSurface, SurfaceState>>,
    available: RefCell<Vec<ContextApi>>,
    refuse_frames: Cell<bool>,
    frames: RefCell<BTreeMap<u64, FrameCallback>>,
    listeners: RefCell<BTreeMap<u64, Rc<RefCell<ResizeListener>>>>,
    next_id: Cell<u64>,
}

impl Inner {
    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

/// In-memory page: containers, surfaces, refresh queue, and resize events.
///
/// Clones share state, so a test keeps one handle while the effect owns another.
#[derive(Clone)]
pub struct HeadlessHost {
    inner: Rc<Inner>,
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessHost {
    /// A page with no containers that offers both context APIs.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                driver: Rc::new(RefCell::new(Driver::default())),
                containers: RefCell::new(HashMap::new()),
                surfaces: RefCell::new(HashMap::new()),
                available: RefCell::new(ContextApi::PREFERENCE.to_vec()),
                refuse_frames: Cell::new(false),
                frames: RefCell::new(BTreeMap::new()),
                listeners: RefCell::new(BTreeMap::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Adds (or replaces) a container with the given layout size.
    pub fn add_container(&self, id: &str, size: SurfaceSize) -> HeadlessContainer {
        self.inner.containers.borrow_mut().insert(
            id.to_owned(),
            ContainerState {
                size,
                children: Vec::new(),
            },
        );
        HeadlessContainer { id: id.to_owned() }
    }

    /// Changes a container's layout size and fires the window resize event.
    pub fn resize_container(&self, id: &str, size: SurfaceSize) {
        if let Some(container) = self.inner.containers.borrow_mut().get_mut(id) {
            container.size = size;
        }
        self.dispatch_resize();
    }

    /// Fires the window resize event without changing any layout.
    pub fn dispatch_resize(&self) {
        let listeners: Vec<_> = self.inner.listeners.borrow().values().cloned().collect();
        for listener in listeners {
            (listener.borrow_mut())();
        }
    }

    /// Restricts which context APIs surfaces will offer.
    pub fn set_available_apis(&self, apis: &[ContextApi]) {
        *self.inner.available.borrow_mut() = apis.to_vec();
    }

    /// Makes `request_frame` return `None` while `refuse` is set.
    pub fn refuse_frames(&self, refuse: bool) {
        self.inner.refuse_frames.set(refuse);
    }

    /// Makes the next link fail with `log`.
    pub fn fail_next_link(&self, log: impl Into<String>) {
        self.inner.driver.borrow_mut().link_failure = Some(log.into());
    }

    /// A context not bound to any surface, sharing this host's call log.
    pub fn detached_context(&self) -> RecordingContext {
        RecordingContext {
            driver: Rc::clone(&self.inner.driver),
            api: ContextApi::WebGl2,
        }
    }

    /// Runs up to `refreshes` display refreshes.
    ///
    /// Each refresh fires the callbacks queued before it began; callbacks
    /// queued while it runs wait for the next one. Returns how many callbacks
    /// fired in total.
    pub fn run_frames(&self, refreshes: usize) -> usize {
        let mut fired = 0;
        for _ in 0..refreshes {
            let due = std::mem::take(&mut *self.inner.frames.borrow_mut());
            if due.is_empty() {
                break;
            }
            for callback in due.into_values() {
                callback();
                fired += 1;
            }
        }
        fired
    }

    pub fn pending_frames(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    /// Surfaces currently attached to container `id`, in append order.
    pub fn children(&self, id: &str) -> Vec<HeadlessSurface> {
        self.inner
            .containers
            .borrow()
            .get(id)
            .map(|container| container.children.clone())
            .unwrap_or_default()
    }

    pub fn surface_size(&self, surface: &HeadlessSurface) -> SurfaceSize {
        self.inner
            .surfaces
            .borrow()
            .get(surface)
            .map(|state| state.size)
            .unwrap_or_default()
    }

    pub fn surface_style(&self, surface: &HeadlessSurface) -> Vec<(String, String)> {
        self.inner
            .surfaces
            .borrow()
            .get(surface)
            .map(|state| state.style.clone())
            .unwrap_or_default()
    }

    /// API of the context created on `surface`, if any.
    pub fn context_api(&self, surface: &HeadlessSurface) -> Option<ContextApi> {
        self.inner
            .surfaces
            .borrow()
            .get(surface)
            .and_then(|state| state.api)
    }

    /// Every recorded context call, oldest first.
    pub fn calls(&self) -> Vec<GlCall> {
        self.inner.driver.borrow().calls.clone()
    }

    pub fn draw_calls(&self) -> Vec<GlCall> {
        self.inner
            .driver
            .borrow()
            .calls
            .iter()
            .filter(|call| matches!(call, GlCall::DrawArrays { .. }))
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.inner.driver.borrow_mut().calls.clear();
    }

    pub fn resize_listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&self, callback: FrameCallback) -> Option<FrameHandle> {
        if self.inner.refuse_frames.get() {
            return None;
        }
        let id = self.inner.next_id();
        self.inner.frames.borrow_mut().insert(id, callback);
        Some(FrameHandle::new(id))
    }

    fn cancel_frame(&self, handle: FrameHandle) {
        let removed = self.inner.frames.borrow_mut().remove(&handle.raw());
        drop(removed);
    }
}

impl Host for HeadlessHost {
    type Container = HeadlessContainer;
    type Surface = HeadlessSurface;
    type Context = RecordingContext;

    fn resolve_container(&self, id: &str) -> Option<HeadlessContainer> {
        self.inner
            .containers
            .borrow()
            .contains_key(id)
            .then(|| HeadlessContainer { id: id.to_owned() })
    }

    fn create_surface(&self) -> Option<HeadlessSurface> {
        let raw = u32::try_from(self.inner.next_id()).ok()?;
        let surface = HeadlessSurface(raw);
        self.inner
            .surfaces
            .borrow_mut()
            .insert(surface, SurfaceState::default());
        Some(surface)
    }

    fn acquire_context(&self, surface: &HeadlessSurface, api: ContextApi) -> Option<RecordingContext> {
        if !self.inner.available.borrow().contains(&api) {
            return None;
        }
        let mut surfaces = self.inner.surfaces.borrow_mut();
        let state = surfaces.get_mut(surface)?;
        // A surface keeps the first context type it hands out.
        match state.api {
            Some(existing) if existing != api => return None,
            _ => state.api = Some(api),
        }
        Some(RecordingContext {
            driver: Rc::clone(&self.inner.driver),
            api,
        })
    }

    fn content_size(&self, container: &HeadlessContainer) -> SurfaceSize {
        self.inner
            .containers
            .borrow()
            .get(&container.id)
            .map(|state| state.size)
            .unwrap_or_default()
    }

    fn set_surface_size(&self, surface: &HeadlessSurface, size: SurfaceSize) {
        if let Some(state) = self.inner.surfaces.borrow_mut().get_mut(surface) {
            state.size = size;
        }
    }

    fn apply_style(&self, surface: &HeadlessSurface, style: SurfaceStyle) {
        if let Some(state) = self.inner.surfaces.borrow_mut().get_mut(surface) {
            for &(property, value) in style {
                state.style.retain(|(existing, _)| existing != property);
                state.style.push((property.to_owned(), value.to_owned()));
            }
        }
    }

    fn attach(&self, container: &HeadlessContainer, surface: &HeadlessSurface) {
        if let Some(state) = self.inner.containers.borrow_mut().get_mut(&container.id) {
            state.children.retain(|child| child != surface);
            state.children.push(*surface);
        }
    }

    fn detach(&self, container: &HeadlessContainer, surface: &HeadlessSurface) {
        if let Some(state) = self.inner.containers.borrow_mut().get_mut(&container.id) {
            state.children.retain(|child| child != surface);
        }
    }

    fn subscribe_resize(&self, listener: ResizeListener) -> Option<ResizeSubscription> {
        let id = self.inner.next_id();
        self.inner
            .listeners
            .borrow_mut()
            .insert(id, Rc::new(RefCell::new(listener)));
        Some(ResizeSubscription::new(id))
    }

    fn unsubscribe_resize(&self, subscription: ResizeSubscription) {
        let removed = self.inner.listeners.borrow_mut().remove(&subscription.raw());
        drop(removed);
    }
}
