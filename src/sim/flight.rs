//! Player flight model
//!
//! One integration step for the controllable racer. Surfaced/submerged is
//! derived from the wave field each step; the overheat lock is stored on the
//! racer and has hysteresis: it sets when energy hits zero and clears only at
//! a full recharge.

use serde::{Deserialize, Serialize};

use super::config::FlightConfig;
use super::state::Racer;
use super::tick::TickInput;
use super::wave::wave_height;
use crate::{approach, forward_from_yaw};

/// Rotor spin rate (rad/s, visual only)
pub const ROTOR_SPIN_RATE: f32 = -25.0;
/// Pitch target per unit of vertical speed (visual only)
const PITCH_PER_VERTICAL_SPEED: f32 = -0.01;
const MAX_PITCH: f32 = 0.8;
const PITCH_RATE: f32 = 5.0;

/// Derived flight state after a step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightMode {
    pub submerged: bool,
    /// Ascend held above water with energy available
    pub flying: bool,
}

/// Yaw rate for the current steering input. Both or neither direction held
/// gives zero.
pub fn turn_rate(input: &TickInput, cfg: &FlightConfig) -> f32 {
    let base = match (input.turn_left, input.turn_right) {
        (true, false) => cfg.turn_speed,
        (false, true) => -cfg.turn_speed,
        _ => 0.0,
    };
    if input.drift { base * cfg.drift_turn_mult } else { base }
}

/// Bank angle the racer leans toward for a turn rate
pub fn bank_target(turn_rate: f32, drifting: bool, cfg: &FlightConfig) -> f32 {
    if drifting {
        if turn_rate == 0.0 { 0.0 } else { cfg.drift_bank * turn_rate.signum() }
    } else {
        turn_rate * cfg.bank_per_turn
    }
}

/// Flight is usable only with energy left and no overheat lock
#[inline]
pub fn can_fly(racer: &Racer) -> bool {
    racer.flight_energy > 0.0 && !racer.overheated
}

fn update_overheat(racer: &mut Racer, max_energy: f32) {
    if racer.flight_energy <= 0.0 {
        racer.overheated = true;
    } else if racer.flight_energy >= max_energy {
        racer.overheated = false;
    }
}

/// Advance the player by one step of `dt` seconds at simulation time `time`
pub fn step_flight(
    racer: &mut Racer,
    input: &TickInput,
    cfg: &FlightConfig,
    time: f32,
    dt: f32,
) -> FlightMode {
    // Steering
    let rate = turn_rate(input, cfg);
    racer.yaw += rate * dt;
    racer.bank = approach(racer.bank, bank_target(rate, input.drift, cfg), cfg.bank_rate, dt);

    // Thrust (reverse is half strength)
    let forward = forward_from_yaw(racer.yaw);
    if input.accelerate {
        racer.vel += forward * cfg.acceleration * dt;
    } else if input.brake {
        racer.vel -= forward * cfg.acceleration * 0.5 * dt;
    }

    update_overheat(racer, cfg.max_flight_energy);

    let submerged = racer.pos.y < wave_height(racer.pos.x, racer.pos.z, time);
    let mut flying = false;
    if submerged {
        racer.vertical_speed += cfg.buoyancy * dt;
        if input.ascend {
            racer.vertical_speed += cfg.surface_speed * dt;
        }
        if input.dive {
            racer.vertical_speed -= cfg.dive_speed * dt;
        }
        racer.vel *= cfg.water_drag;
        racer.vertical_speed *= cfg.water_drag;
        racer.flight_energy += cfg.flight_regen * dt;
    } else {
        racer.vertical_speed -= cfg.gravity * dt;
        racer.vel *= if input.drift { cfg.drift_friction } else { cfg.friction };
        if input.ascend && can_fly(racer) {
            // Cancel gravity and climb
            racer.vertical_speed += (cfg.gravity + cfg.surface_speed) * dt;
            racer.flight_energy -= cfg.flight_drain * dt;
            flying = true;
        } else {
            racer.flight_energy += cfg.flight_regen * dt;
        }
    }
    racer.flight_energy = racer.flight_energy.clamp(0.0, cfg.max_flight_energy);
    update_overheat(racer, cfg.max_flight_energy);

    // Integrate: velocity first, then the vertical channel once
    racer.pos += racer.vel * dt;
    racer.pos.y += racer.vertical_speed * dt;
    if racer.pos.y < cfg.floor_limit {
        racer.pos.y = cfg.floor_limit;
        racer.vertical_speed = 0.0;
    }

    // Visual only
    racer.rotor_angle = (racer.rotor_angle + ROTOR_SPIN_RATE * dt).rem_euclid(std::f32::consts::TAU);
    let pitch_target = (racer.vertical_speed * PITCH_PER_VERTICAL_SPEED).clamp(-MAX_PITCH, MAX_PITCH);
    racer.pitch = approach(racer.pitch, pitch_target, PITCH_RATE, dt);

    FlightMode { submerged, flying }
}
