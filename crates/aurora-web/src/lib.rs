//! Browser host for the aurora backdrop.
//!
//! ```text
//!   <script type="module">
//!          │ initLogging(), new AuroraEffect("aurora-bg")
//!          ▼
//!   bindings::AuroraEffect ──▶ aurora::EffectController<WebHost>
//!                                      │
//!          WebHost ◀───────────────────┘
//!            ├─ <canvas> + getContext("webgl2" | "webgl") ─▶ glow::Context
//!            ├─ requestAnimationFrame / cancelAnimationFrame
//!            └─ window "resize" listener
//! ```
//!
//! Only meaningful on `wasm32`; on other targets the crate is empty.

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod console;
#[cfg(target_arch = "wasm32")]
mod host;

#[cfg(target_arch = "wasm32")]
pub use bindings::{init_logging, AuroraEffect};
#[cfg(target_arch = "wasm32")]
pub use console::{initialise_tracing, MakeConsoleWriter};
#[cfg(target_arch = "wasm32")]
pub use host::WebHost;
