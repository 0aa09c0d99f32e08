use std::io;
use std::sync::{Arc, Mutex};

use aurora::headless::{GlCall, HeadlessHost};
use aurora::{ContextApi, EffectConfig, EffectController, EffectStatus, SurfaceSize, Topology};

const STRIP_DRAW: GlCall = GlCall::DrawArrays {
    topology: Topology::TriangleStrip,
    first: 0,
    count: 4,
};

/// Collects formatted log output so tests can assert on it.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log buffer poisoned"))?
            .extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogBuffer {
    fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

/// Runs `body` with a debug-level subscriber writing into the returned buffer.
fn capture_logs(body: impl FnOnce()) -> LogBuffer {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, body);
    buffer
}

fn page(width: u32, height: u32) -> HeadlessHost {
    let host = HeadlessHost::new();
    host.add_container("aurora-bg", SurfaceSize::new(width, height));
    host
}

#[test]
fn construct_attaches_one_sized_surface() {
    let host = page(800, 600);
    let effect = EffectController::construct(host.clone(), "aurora-bg");

    assert_eq!(effect.status(), EffectStatus::Running);
    assert!(effect.frame_handle().is_some());

    let children = host.children("aurora-bg");
    assert_eq!(children.len(), 1);
    assert_eq!(host.surface_size(&children[0]), SurfaceSize::new(800, 600));
    assert_eq!(host.context_api(&children[0]), Some(ContextApi::WebGl2));

    let style = host.surface_style(&children[0]);
    for (property, value) in [
        ("position", "absolute"),
        ("top", "0"),
        ("left", "0"),
        ("width", "100%"),
        ("height", "100%"),
    ] {
        assert!(
            style.contains(&(property.to_owned(), value.to_owned())),
            "missing {property}: {value}"
        );
    }

    assert!(host.draw_calls().is_empty(), "first draw waits for a refresh");
}

#[test]
fn hundred_frames_reach_time_one() {
    let host = page(800, 600);
    let effect = EffectController::construct(host.clone(), "aurora-bg");

    assert_eq!(host.run_frames(100), 100);

    let state = effect.animation_state().expect("running effect");
    assert_eq!(state.frames(), 100);
    assert_eq!(state.time(), 1.0);

    let draws = host.draw_calls();
    assert_eq!(draws.len(), 100);
    assert!(draws.iter().all(|call| *call == STRIP_DRAW));
    assert!(host.calls().contains(&GlCall::Uniform1f {
        name: "uTime".into(),
        value: 1.0,
    }));
}

#[test]
fn custom_time_step_scales_the_accumulator() {
    let host = page(64, 64);
    let config = EffectConfig::default().with_time_step(0.5);
    let effect = EffectController::construct_with(host.clone(), "aurora-bg", config);

    host.run_frames(4);
    assert_eq!(effect.animation_state().map(|state| state.time()), Some(2.0));
}

#[test]
fn no_graphics_api_leaves_page_untouched() {
    let host = page(800, 600);
    host.set_available_apis(&[]);

    let mut slot = None;
    let logs = capture_logs(|| {
        slot = Some(EffectController::construct(host.clone(), "aurora-bg"));
    });
    let mut effect = slot.expect("controller built");

    assert_eq!(
        effect.status(),
        EffectStatus::Disabled {
            code: "CONTEXT_UNAVAILABLE"
        }
    );
    assert!(host.children("aurora-bg").is_empty());
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.resize_listener_count(), 0);

    let degraded: Vec<_> = logs
        .lines()
        .into_iter()
        .filter(|line| line.contains("WARN") || line.contains("ERROR"))
        .collect();
    assert_eq!(degraded.len(), 1, "{degraded:#?}");
    assert!(degraded[0].contains("WARN"));
    assert!(degraded[0].contains("no graphics context available (tried webgl2, webgl)"));

    effect.destroy();
    effect.destroy();
    assert!(host.children("aurora-bg").is_empty());
}

#[test]
fn shader_without_time_uniform_keeps_drawing() {
    let host = page(640, 480);
    let config = EffectConfig::default().with_fragment_source(
        "precision mediump float;\nuniform vec2 uResolution;\nvoid main() {\n    gl_FragColor = vec4(gl_FragCoord.xy / uResolution, 0.0, 1.0);\n}\n",
    );
    let effect = EffectController::construct_with(host.clone(), "aurora-bg", config);

    assert_eq!(host.run_frames(5), 5);
    assert_eq!(effect.status(), EffectStatus::Running);

    let draws = host.draw_calls();
    assert_eq!(draws.len(), 5);
    assert!(draws.iter().all(|call| *call == STRIP_DRAW));

    let calls = host.calls();
    assert!(!calls
        .iter()
        .any(|call| matches!(call, GlCall::Uniform1f { .. })));
    assert!(calls.contains(&GlCall::Uniform2f {
        name: "uResolution".into(),
        x: 640.0,
        y: 480.0,
    }));
}

#[test]
fn legacy_api_is_used_when_modern_is_missing() {
    let host = page(320, 240);
    host.set_available_apis(&[ContextApi::WebGl]);

    let effect = EffectController::construct(host.clone(), "aurora-bg");
    assert!(effect.is_running());
    assert_eq!(effect.context_api(), Some(ContextApi::WebGl));
}

#[test]
fn broken_fragment_shader_disables_effect() {
    let host = page(800, 600);
    let config = EffectConfig::default()
        .with_fragment_source("precision mediump float;\nvoid main() { gl_FragColor = vec4(1.0;\n");

    let effect = EffectController::construct_with(host.clone(), "aurora-bg", config);
    assert_eq!(
        effect.status(),
        EffectStatus::Disabled {
            code: "SHADER_COMPILE_FAILED"
        }
    );
    let log = effect
        .failure()
        .and_then(|err| err.diagnostic_log())
        .expect("compile log");
    assert!(!log.is_empty());
    assert!(host.children("aurora-bg").is_empty());
    assert!(host.draw_calls().is_empty());
}

#[test]
fn broken_vertex_shader_disables_effect() {
    let host = page(800, 600);
    let config = EffectConfig::default().with_vertex_source("attribute vec2 position;\n");

    let effect = EffectController::construct_with(host.clone(), "aurora-bg", config);
    assert_eq!(
        effect.failure().map(|err| err.to_string()),
        Some(String::from(
            "vertex shader failed to compile: ERROR: 0:1: 'main' : missing entry point"
        ))
    );
    assert!(host.children("aurora-bg").is_empty());
}

#[test]
fn link_failure_disables_effect() {
    let host = page(800, 600);
    host.fail_next_link("L0010: uniform precision mismatch");

    let effect = EffectController::construct(host.clone(), "aurora-bg");
    assert_eq!(
        effect.status(),
        EffectStatus::Disabled {
            code: "PROGRAM_LINK_FAILED"
        }
    );
    assert!(host.children("aurora-bg").is_empty());
}

#[test]
fn unknown_container_is_reported() {
    let host = page(800, 600);
    let effect = EffectController::construct(host.clone(), "missing");
    assert_eq!(
        effect.failure().map(|err| err.to_string()),
        Some(String::from("container 'missing' not found"))
    );
    assert!(host.children("aurora-bg").is_empty());
}

#[test]
fn resize_reaches_surface_viewport_and_next_frame() {
    let host = page(800, 600);
    let effect = EffectController::construct(host.clone(), "aurora-bg");
    host.run_frames(1);
    host.clear_calls();

    host.resize_container("aurora-bg", SurfaceSize::new(1280, 720));
    let surface = host.children("aurora-bg")[0];
    assert_eq!(host.surface_size(&surface), SurfaceSize::new(1280, 720));
    assert_eq!(effect.surface_size(), Some(SurfaceSize::new(1280, 720)));
    assert!(host.calls().contains(&GlCall::Viewport {
        width: 1280,
        height: 720
    }));

    host.clear_calls();
    host.run_frames(1);
    let calls = host.calls();
    assert!(calls.contains(&GlCall::Uniform2f {
        name: "uResolution".into(),
        x: 1280.0,
        y: 720.0,
    }));
    assert_eq!(calls.last(), Some(&STRIP_DRAW));
}

#[test]
fn destroy_twice_detaches_once() {
    let host = page(800, 600);
    let mut effect = EffectController::construct(host.clone(), "aurora-bg");
    host.run_frames(3);

    effect.destroy();
    effect.destroy();

    assert_eq!(effect.status(), EffectStatus::Destroyed);
    assert!(host.children("aurora-bg").is_empty());
    assert_eq!(host.pending_frames(), 0);
    assert_eq!(host.resize_listener_count(), 0);

    let draws_before = host.draw_calls().len();
    host.resize_container("aurora-bg", SurfaceSize::new(10, 10));
    assert_eq!(host.run_frames(5), 0);
    assert_eq!(host.draw_calls().len(), draws_before);

    let deletes = host
        .calls()
        .iter()
        .filter(|call| matches!(call, GlCall::DeleteProgram { .. }))
        .count();
    assert_eq!(deletes, 1);
}

#[test]
fn refused_frame_leaves_effect_stalled_but_attached() {
    let host = page(100, 100);
    host.refuse_frames(true);

    let mut effect = EffectController::construct(host.clone(), "aurora-bg");
    assert_eq!(effect.status(), EffectStatus::Stalled);
    assert_eq!(host.children("aurora-bg").len(), 1);

    effect.destroy();
    assert!(host.children("aurora-bg").is_empty());
}
