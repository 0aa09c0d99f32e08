//! CPU reference for the aurora colour function.
//!
//! Mirrors [`FRAGMENT_SHADER_SOURCE`](crate::compile::FRAGMENT_SHADER_SOURCE)
//! line for line so the visual contract can be checked without a GPU: a
//! two-axis sine interference value picks between the brand colours, the
//! horizontal coordinate blends toward the accent, and alpha is the wave
//! scaled by [`OPACITY_CEILING`].

/// Deep brand green.
pub const BASE_COLOR: [f32; 3] = [0.059, 0.298, 0.227];
/// Brand gold, reached at the wave crest.
pub const CREST_COLOR: [f32; 3] = [1.000, 0.824, 0.000];
/// Lighter green the pattern fades toward on the right edge.
pub const ACCENT_COLOR: [f32; 3] = [0.104, 0.420, 0.310];

/// Horizontal wave frequency (radians per unit of `uv.x`).
pub const WAVE_FREQUENCY_X: f32 = 8.0;
/// Vertical wave frequency (radians per unit of `uv.y`).
pub const WAVE_FREQUENCY_Y: f32 = 6.0;
/// Scale applied to `uTime` before it drives the phase.
pub const TIME_SCALE: f32 = 0.5;
/// Relative phase speed of the vertical wave.
pub const VERTICAL_PHASE_RATE: f32 = 0.8;
/// Maximum output alpha.
pub const OPACITY_CEILING: f32 = 0.3;

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

/// Interference value in `[0, 1]` at normalised coordinate `uv`.
pub fn wave(uv: [f32; 2], time: f32) -> f32 {
    let phase = time * TIME_SCALE;
    let horizontal = (uv[0] * WAVE_FREQUENCY_X + phase).sin() * 0.5 + 0.5;
    let vertical = (uv[1] * WAVE_FREQUENCY_Y + phase * VERTICAL_PHASE_RATE).sin() * 0.5 + 0.5;
    horizontal * vertical
}

/// Straight-alpha RGBA the fragment stage emits at `uv` for `time`.
pub fn sample(uv: [f32; 2], time: f32) -> [f32; 4] {
    let wave = wave(uv, time);
    let color = mix(BASE_COLOR, CREST_COLOR, wave);
    let [r, g, b] = mix(color, ACCENT_COLOR, uv[0]);
    [r, g, b, wave * OPACITY_CEILING]
}
