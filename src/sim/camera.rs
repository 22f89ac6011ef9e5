//! Chase camera
//!
//! Trails the player at a yaw-rotated offset and reports whether it has dipped
//! under the rendered surface so the renderer can switch to the underwater look.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::state::Racer;
use super::wave::surface_height;

/// Offset behind and above the player, in the player's yaw frame
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 15.0, -35.0);
/// Follow smoothing rate
pub const CAMERA_FOLLOW_RATE: f32 = 3.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChaseCamera {
    pub pos: Vec3,
    pub look_at: Vec3,
    pub underwater: bool,
}

/// Ideal camera position for a racer
pub fn ideal_position(racer: &Racer) -> Vec3 {
    let (sin, cos) = racer.yaw.sin_cos();
    // Rotate the offset about +Y by yaw
    let offset = Vec3::new(
        CAMERA_OFFSET.x * cos + CAMERA_OFFSET.z * sin,
        CAMERA_OFFSET.y,
        -CAMERA_OFFSET.x * sin + CAMERA_OFFSET.z * cos,
    );
    racer.pos + offset
}

impl ChaseCamera {
    /// Jump straight to the ideal position (race start / restart)
    pub fn snap_behind(&mut self, racer: &Racer) {
        self.pos = ideal_position(racer);
        self.look_at = racer.pos;
    }

    /// Ease toward the ideal position and re-test submersion against the
    /// surface as drawn (base waves plus the player's wake ripple)
    pub fn follow(&mut self, racer: &Racer, time: f32, dt: f32) {
        let target = ideal_position(racer);
        self.pos = self.pos.lerp(target, (dt * CAMERA_FOLLOW_RATE).min(1.0));
        self.look_at = racer.pos;

        let ripple_center = Vec2::new(racer.pos.x, racer.pos.z);
        let surface = surface_height(self.pos.x, self.pos.z, time, Some(ripple_center));
        self.underwater = self.pos.y < surface;
    }
}
