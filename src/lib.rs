//! Turtle-copter race - a water-track racing game
//!
//! Core modules:
//! - `sim`: Race simulation (flight physics, waves, track progress, collisions)
//! - `services`: Interfaces to the audio and particle collaborators
//! - `renderer`: GPU-facing wave shader and asset slots
//! - `platform`: Browser bridge (wasm32 only)
//! - `settings`: Presentation preferences

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod platform;
pub mod renderer;
pub mod services;
pub mod settings;
pub mod sim;

pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the simulation will integrate (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;
    /// Nominal display refresh used by the demo and tests
    pub const FRAME_DT: f32 = 1.0 / 60.0;

    /// Wake ripple radius around the player
    pub const RIPPLE_RADIUS: f32 = 50.0;

    /// Samples in the coarse track table used for global nearest-point scans
    pub const TRACK_COARSE_SAMPLES: usize = 200;
    /// Samples in the local progress search window
    pub const PROGRESS_WINDOW_SAMPLES: usize = 30;
    /// Step between progress window samples (in t)
    pub const PROGRESS_WINDOW_STEP: f32 = 0.002;

    /// Lap wrap hysteresis: previous t must exceed this...
    pub const LAP_WRAP_HIGH: f32 = 0.9;
    /// ...and the new t must be below this
    pub const LAP_WRAP_LOW: f32 = 0.1;

    /// Speed used to normalise the engine sound (units/s)
    pub const ENGINE_SPEED_REF: f32 = 150.0;
    /// Minimum speed for the drift squeal
    pub const DRIFT_SOUND_MIN_SPEED: f32 = 20.0;
}

/// Wrap a track parameter into [0, 1)
#[inline]
pub fn wrap_unit(t: f32) -> f32 {
    let w = t.rem_euclid(1.0);
    // rem_euclid can round up to exactly 1.0 for tiny negative inputs
    if w >= 1.0 { 0.0 } else { w }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + (b - a) * f
}

/// Frame-rate dependent exponential smoothing: `lerp(current, target, dt * rate)`.
///
/// The blend factor is capped at 1 so a large dt can never overshoot.
#[inline]
pub fn approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(current, target, (dt * rate).min(1.0))
}

/// Forward unit vector for a yaw angle (yaw 0 faces +Z)
#[inline]
pub fn forward_from_yaw(yaw: f32) -> glam::Vec3 {
    glam::Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw angle that faces along `dir` (ignores the vertical component)
#[inline]
pub fn yaw_from_direction(dir: glam::Vec3) -> f32 {
    dir.x.atan2(dir.z)
}
