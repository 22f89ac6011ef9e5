//! Procedural wave field
//!
//! Sum of sinusoids plus a player-centred wake ripple. Gameplay and the water
//! shader read the same term table (see `renderer::water`), so the surface the
//! player sees is the surface the physics tests against.

use glam::Vec2;

use crate::consts::RIPPLE_RADIUS;

/// Which horizontal axis a wave term travels along
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveAxis {
    /// `sin(x * frequency + t * speed)`
    X,
    /// `cos(z * frequency + t * speed)`
    Z,
}

/// One sinusoid of the wave field
#[derive(Debug, Clone, Copy)]
pub struct WaveTerm {
    pub axis: WaveAxis,
    pub frequency: f32,
    pub speed: f32,
    pub amplitude: f32,
}

/// Three octaves, each an x-sine / z-cosine pair
pub const WAVE_TERMS: [WaveTerm; 6] = [
    WaveTerm { axis: WaveAxis::X, frequency: 0.01, speed: 1.0, amplitude: 3.0 },
    WaveTerm { axis: WaveAxis::Z, frequency: 0.015, speed: 0.8, amplitude: 3.0 },
    WaveTerm { axis: WaveAxis::X, frequency: 0.03, speed: 1.5, amplitude: 1.5 },
    WaveTerm { axis: WaveAxis::Z, frequency: 0.05, speed: 1.2, amplitude: 1.5 },
    WaveTerm { axis: WaveAxis::X, frequency: 0.1, speed: 3.0, amplitude: 0.5 },
    WaveTerm { axis: WaveAxis::Z, frequency: 0.12, speed: 2.8, amplitude: 0.5 },
];

/// Ripple spatial frequency (per unit distance)
pub const RIPPLE_SPATIAL_FREQ: f32 = 1.5;
/// Ripple angular speed (rad/s)
pub const RIPPLE_ANGULAR_SPEED: f32 = 10.0;
/// Ripple peak amplitude at the centre
pub const RIPPLE_AMPLITUDE: f32 = 1.5;

impl WaveTerm {
    #[inline]
    fn eval(&self, x: f32, z: f32, t: f32) -> f32 {
        match self.axis {
            WaveAxis::X => (x * self.frequency + t * self.speed).sin() * self.amplitude,
            WaveAxis::Z => (z * self.frequency + t * self.speed).cos() * self.amplitude,
        }
    }
}

/// Base wave height at (x, z) and time t
pub fn wave_height(x: f32, z: f32, t: f32) -> f32 {
    WAVE_TERMS.iter().map(|term| term.eval(x, z, t)).sum()
}

/// Wake ripple around `center`; exactly zero at or beyond `RIPPLE_RADIUS`
pub fn ripple(x: f32, z: f32, t: f32, center: Vec2) -> f32 {
    let d = Vec2::new(x, z).distance(center);
    if d >= RIPPLE_RADIUS {
        return 0.0;
    }
    let intensity = 1.0 - d / RIPPLE_RADIUS;
    (d * RIPPLE_SPATIAL_FREQ - t * RIPPLE_ANGULAR_SPEED).sin() * RIPPLE_AMPLITUDE * intensity
}

/// Surface height, with the wake ripple when a reference point is supplied
pub fn surface_height(x: f32, z: f32, t: f32, ripple_center: Option<Vec2>) -> f32 {
    let base = wave_height(x, z, t);
    match ripple_center {
        Some(center) => base + ripple(x, z, t, center),
        None => base,
    }
}

/// Upper bound on |wave_height|
pub fn max_wave_amplitude() -> f32 {
    WAVE_TERMS.iter().map(|term| term.amplitude).sum()
}
