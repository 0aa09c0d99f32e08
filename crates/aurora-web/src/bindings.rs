//! Page-facing exports.

use aurora::{EffectController, EffectStatus};
use wasm_bindgen::prelude::*;

use crate::console::initialise_tracing;
use crate::host::WebHost;

enum Handle {
    Live(EffectController<WebHost>),
    /// The host itself could not be set up; nothing was touched.
    Unhosted,
}

/// Animated aurora backdrop bound to one container element.
///
/// ```js
/// const effect = new AuroraEffect("aurora-bg");
/// window.addEventListener("pagehide", () => effect.destroy());
/// ```
///
/// The constructor never throws. When the effect cannot run it logs why and
/// leaves the page as it was.
#[wasm_bindgen]
pub struct AuroraEffect {
    handle: Handle,
}

#[wasm_bindgen]
impl AuroraEffect {
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str) -> AuroraEffect {
        let handle = match WebHost::new() {
            Ok(host) => Handle::Live(EffectController::construct(host, container_id)),
            Err(err) => {
                tracing::error!(container = container_id, error = %format!("{err:#}"), "browser host unavailable");
                Handle::Unhosted
            }
        };
        AuroraEffect { handle }
    }

    /// Stops the animation, removes the canvas, and frees GPU objects.
    pub fn destroy(&mut self) {
        if let Handle::Live(controller) = &mut self.handle {
            controller.destroy();
        }
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        matches!(&self.handle, Handle::Live(controller) if controller.is_running())
    }

    /// `running`, `stalled`, `destroyed`, or the failure code when disabled.
    #[wasm_bindgen(getter)]
    pub fn status(&self) -> String {
        match &self.handle {
            Handle::Live(controller) => match controller.status() {
                EffectStatus::Running => String::from("running"),
                EffectStatus::Stalled => String::from("stalled"),
                EffectStatus::Destroyed => String::from("destroyed"),
                EffectStatus::Disabled { code } => code.to_owned(),
            },
            Handle::Unhosted => String::from("HOST_UNAVAILABLE"),
        }
    }
}

/// Routes `tracing` output to the browser console.
///
/// `filter` takes `EnvFilter` directives such as `"debug"` or
/// `"aurora=trace"`; the default is `info`. Calling it again is harmless.
#[wasm_bindgen(js_name = initLogging)]
pub fn init_logging(filter: Option<String>) {
    initialise_tracing(filter.as_deref());
}
