//! Per-frame motion for everything the player doesn't steer
//!
//! Each update is a function of the entity, elapsed time and `dt`. Only the AI
//! racers read other entities (the player for rubber-banding, obstacles for
//! avoidance).

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec3;

use super::config::RaceConfig;
use super::progress::{crossed_start_line, is_ahead};
use super::state::{
    GameEvent, Obstacle, ObstacleKind, ParticleKind, Pickup, PickupKind, Pilot, Predator,
    PredatorKind, RaceState, Racer, Wildlife, WildlifeKind,
};
use super::track::TrackSpline;
use super::wave::wave_height;
use crate::{approach, lerp, wrap_unit, yaw_from_direction};

const MINE_SPIN_RATE: f32 = 1.0;
const MINE_ROCK_FREQ: f32 = 2.0;
const MINE_ROCK_AMPLITUDE: f32 = 0.2;
const DRIFTWOOD_ROLL_RATE: f32 = 0.5;

const JELLYFISH_BOB: f32 = 5.0;
const JELLYFISH_PULSE: f32 = 0.1;
const JELLYFISH_SQUASH_RECOVERY: f32 = 3.0;

const POWER_FISH_BOB: f32 = 1.0;
const POWER_FISH_SPIN_RATE: f32 = 2.0;

const FISH_SCHOOL_SPEED: f32 = 10.0;
/// Fish schools wrap around a square of this half-width
const FISH_SCHOOL_BOUNDS: f32 = 1500.0;
const CLOUD_WRAP: f32 = 3000.0;
/// Seconds between the starts of two dolphin leaps
const DOLPHIN_CYCLE: f32 = 8.0;
const DOLPHIN_LEAP_TIME: f32 = 2.0;
/// Apex height above the launch depth
const DOLPHIN_LEAP_HEIGHT: f32 = 20.0;
const DOLPHIN_LEAP_DEPTH: f32 = -5.0;
const DOLPHIN_LEAP_LENGTH: f32 = 40.0;
/// Drift of the resting position between leaps (units/s along +Z)
const DOLPHIN_DRIFT: f32 = 5.0;
const DOLPHIN_SPLASH_PARTICLES: u32 = 3;

/// Visual rotor spin for AI racers (rad/s)
const AI_ROTOR_SPIN_RATE: f32 = -25.0;

/// Float mines and driftwood on the waves
pub fn update_obstacle(obstacle: &mut Obstacle, time: f32, dt: f32) {
    let surface = wave_height(obstacle.pos.x, obstacle.pos.z, time);
    obstacle.pos.y = surface + obstacle.kind.float_height();
    match obstacle.kind {
        ObstacleKind::Mine => {
            obstacle.spin += MINE_SPIN_RATE * dt;
            obstacle.tilt = (time * MINE_ROCK_FREQ).sin() * MINE_ROCK_AMPLITUDE;
        }
        ObstacleKind::Driftwood => {
            obstacle.spin += DRIFTWOOD_ROLL_RATE * dt;
        }
    }
}

pub fn update_predator(predator: &mut Predator, time: f32, dt: f32) {
    match &mut predator.kind {
        PredatorKind::Shark {
            center,
            orbit_radius,
            angle,
            turn_speed,
            depth,
            tail_swing,
        } => {
            *angle += *turn_speed * dt;
            let (sin, cos) = angle.sin_cos();
            let mut pos = *center + Vec3::new(cos, 0.0, sin) * *orbit_radius;
            pos.y = wave_height(pos.x, pos.z, time) - *depth;
            predator.pos = pos;
            // Direction of travel around the orbit
            let heading = Vec3::new(-sin, 0.0, cos) * turn_speed.signum();
            predator.yaw = yaw_from_direction(heading);
            *tail_swing = (time * 10.0).sin() * 0.5;
        }
        PredatorKind::Jellyfish {
            depth,
            phase,
            scale,
            squash,
        } => {
            predator.pos.y = *depth + (time + *phase).sin() * JELLYFISH_BOB;
            *scale = 1.0 + (time * 5.0 + *phase).sin() * JELLYFISH_PULSE;
            *squash = approach(*squash, 1.0, JELLYFISH_SQUASH_RECOVERY, dt);
        }
    }
}

pub fn update_pickup(pickup: &mut Pickup, time: f32, dt: f32) {
    match &mut pickup.kind {
        PickupKind::PowerFish {
            active,
            bob_offset,
            spin,
        } => {
            if !*active {
                return;
            }
            pickup.pos.y = pickup.home.y + (time * 3.0 + *bob_offset).sin() * POWER_FISH_BOB;
            *spin += POWER_FISH_SPIN_RATE * dt;
        }
        PickupKind::BoostPad {
            pulse,
            arrow_offset,
            ..
        } => {
            *pulse = 1.0 + (time * 5.0).sin() * 0.1;
            *arrow_offset = (time * 10.0).sin() * 2.0;
        }
    }
}

/// Cosmetic motion. Returns a splash when a dolphin breaks the surface.
pub fn update_wildlife(wildlife: &mut Wildlife, time: f32, dt: f32) -> Option<GameEvent> {
    match &mut wildlife.kind {
        WildlifeKind::Seagull {
            center,
            orbit_radius,
            speed,
            angle,
            flap,
        } => {
            *angle += *speed * dt;
            let (sin, cos) = angle.sin_cos();
            wildlife.pos = *center + Vec3::new(cos, 0.0, sin) * *orbit_radius;
            wildlife.pos.y = center.y + (time + *angle).sin() * 5.0;
            wildlife.yaw = yaw_from_direction(Vec3::new(-sin, 0.0, cos));
            *flap = (time * 15.0).sin() * 0.5 + 1.0;
            None
        }
        WildlifeKind::FishSchool { velocity } => {
            wildlife.pos += *velocity * FISH_SCHOOL_SPEED * dt;
            for axis in [&mut wildlife.pos.x, &mut wildlife.pos.z] {
                if *axis > FISH_SCHOOL_BOUNDS {
                    *axis = -FISH_SCHOOL_BOUNDS;
                } else if *axis < -FISH_SCHOOL_BOUNDS {
                    *axis = FISH_SCHOOL_BOUNDS;
                }
            }
            wildlife.yaw = yaw_from_direction(*velocity);
            None
        }
        WildlifeKind::Dolphin { base, timer, roll } => {
            let was_above = wildlife.pos.y > 0.0;
            *timer += dt;
            let phase = timer.rem_euclid(DOLPHIN_CYCLE);
            if phase < DOLPHIN_LEAP_TIME {
                // Parabolic arc along +X
                let p = phase / DOLPHIN_LEAP_TIME;
                let height = (1.0 - 4.0 * (p - 0.5) * (p - 0.5)) * DOLPHIN_LEAP_HEIGHT;
                wildlife.pos = Vec3::new(
                    base.x + p * DOLPHIN_LEAP_LENGTH,
                    DOLPHIN_LEAP_DEPTH + height,
                    base.z,
                );
                wildlife.yaw = FRAC_PI_2;
                *roll = (0.5 - p) * 2.0;
            } else {
                base.z += DOLPHIN_DRIFT * dt;
                wildlife.pos = *base;
                *roll = 0.0;
            }
            let is_above = wildlife.pos.y > 0.0;
            (was_above != is_above).then_some(GameEvent::Particles {
                pos: Vec3::new(wildlife.pos.x, 0.0, wildlife.pos.z),
                count: DOLPHIN_SPLASH_PARTICLES,
                kind: ParticleKind::Splash,
            })
        }
        WildlifeKind::Cloud { speed } => {
            wildlife.pos.x += *speed * dt;
            if wildlife.pos.x > CLOUD_WRAP {
                wildlife.pos.x = -CLOUD_WRAP;
            }
            None
        }
    }
}

/// Advance every non-racer entity by one frame
pub fn update_world(state: &mut RaceState, dt: f32) {
    let time = state.time;
    for obstacle in &mut state.obstacles {
        update_obstacle(obstacle, time, dt);
    }
    for predator in &mut state.predators {
        update_predator(predator, time, dt);
    }
    for pickup in &mut state.pickups {
        update_pickup(pickup, time, dt);
    }
    let splashes: Vec<GameEvent> = state
        .wildlife
        .iter_mut()
        .filter_map(|w| update_wildlife(w, time, dt))
        .collect();
    state.events.extend(splashes);
}

/// What happened to an AI racer this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiStep {
    pub lapped: bool,
    /// Crossed the line after the final lap this frame
    pub finished: bool,
}

/// Lateral offset from the centreline: a slow wander plus a push away from
/// every obstacle inside the avoidance radius
pub fn ai_lateral_offset(
    ai: &Racer,
    wander_phase: f32,
    side: Vec3,
    obstacles: &[Obstacle],
    config: &RaceConfig,
    time: f32,
) -> f32 {
    let cfg = &config.ai;
    let mut offset = (time + wander_phase).sin() * cfg.wander;
    let radius_sq = cfg.avoid_radius * cfg.avoid_radius;
    for obstacle in obstacles {
        let away = Vec3::new(ai.pos.x - obstacle.pos.x, 0.0, ai.pos.z - obstacle.pos.z);
        if away.length_squared() < radius_sq {
            // Push toward whichever side of the obstacle the racer is already on
            offset += if away.dot(side) >= 0.0 { cfg.avoid_push } else { -cfg.avoid_push };
        }
    }
    offset
}

/// Drive one AI racer along the track
pub fn update_ai(
    ai: &mut Racer,
    player: &Racer,
    obstacles: &[Obstacle],
    track: &TrackSpline,
    config: &RaceConfig,
    time: f32,
    dt: f32,
) -> AiStep {
    if ai.resetting {
        return AiStep::default();
    }
    let cfg = &config.ai;
    let ahead = is_ahead(ai, player);
    let Pilot::Ai(pilot) = &mut ai.pilot else {
        return AiStep::default();
    };

    // Rubber-banding: ease off when ahead of the player, push when behind
    let mult = if ahead { cfg.hold_back_mult } else { cfg.catch_up_mult };
    pilot.speed = approach(pilot.speed, pilot.base_speed * mult, cfg.speed_smoothing, dt);
    let speed = pilot.speed;
    let wander_phase = pilot.wander_phase;

    let mut step = AiStep::default();
    let prev_t = ai.t;
    ai.t = wrap_unit(ai.t + speed * cfg.speed_to_t * dt);
    if crossed_start_line(prev_t, ai.t) {
        ai.lap += 1;
        step.lapped = true;
        if ai.lap > config.total_laps && !ai.finished {
            ai.finished = true;
            step.finished = true;
        }
    }

    let side = track.side_normal_at(ai.t);
    let offset = ai_lateral_offset(ai, wander_phase, side, obstacles, config, time);
    let mut target = track.point_at(ai.t) + side * offset;
    target.y = wave_height(target.x, target.z, time) + cfg.cruise_height;

    let old = ai.pos;
    let blend = (dt * cfg.follow_rate).min(1.0);
    ai.pos.x = lerp(ai.pos.x, target.x, blend);
    ai.pos.z = lerp(ai.pos.z, target.z, blend);
    ai.pos.y = lerp(ai.pos.y, target.y, blend);
    if dt > 0.0 {
        ai.vel = (ai.pos - old) / dt;
    }

    let look = track.point_at(ai.t + cfg.look_ahead) - ai.pos;
    if look.length_squared() > f32::EPSILON {
        ai.yaw = yaw_from_direction(look);
    }
    ai.rotor_angle = (ai.rotor_angle + AI_ROTOR_SPIN_RATE * dt).rem_euclid(TAU);
    step
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward_from_yaw;
    use crate::sim::world::{SHARK_ORBIT_RADIUS, WorldLayout};

    const DT: f32 = 1.0 / 60.0;

    fn shark(turn_speed: f32) -> Predator {
        Predator {
            id: 1,
            pos: Vec3::ZERO,
            yaw: 0.0,
            kind: PredatorKind::Shark {
                center: Vec3::new(100.0, 0.0, 100.0),
                orbit_radius: SHARK_ORBIT_RADIUS,
                angle: 0.0,
                turn_speed,
                depth: 5.0,
                tail_swing: 0.0,
            },
        }
    }

    #[test]
    fn test_shark_orbits_under_surface() {
        let mut s = shark(1.0);
        let mut time = 0.0;
        for _ in 0..120 {
            time += DT;
            update_predator(&mut s, time, DT);
            let flat = Vec3::new(s.pos.x - 100.0, 0.0, s.pos.z - 100.0);
            assert!((flat.length() - SHARK_ORBIT_RADIUS).abs() < 1e-3);
            let surface = wave_height(s.pos.x, s.pos.z, time);
            assert!((s.pos.y - (surface - 5.0)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_shark_faces_direction_of_travel() {
        let mut s = shark(1.0);
        update_predator(&mut s, 0.0, DT);
        let before = s.pos;
        update_predator(&mut s, DT, DT);
        let travel = (s.pos - before).with_y(0.0).normalize();
        assert!(forward_from_yaw(s.yaw).dot(travel) > 0.99);
    }

    #[test]
    fn test_jellyfish_bobs_and_recovers() {
        let mut jelly = Predator {
            id: 2,
            pos: Vec3::new(5.0, -30.0, 5.0),
            yaw: 0.0,
            kind: PredatorKind::Jellyfish {
                depth: -30.0,
                phase: 0.0,
                scale: 1.0,
                squash: 0.5,
            },
        };
        for i in 0..300 {
            update_predator(&mut jelly, i as f32 * DT, DT);
            assert!((jelly.pos.y + 30.0).abs() <= JELLYFISH_BOB + 1e-4);
            assert_eq!(jelly.pos.x, 5.0);
        }
        let PredatorKind::Jellyfish { squash, .. } = jelly.kind else {
            panic!("kind changed");
        };
        assert!((squash - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_obstacles_ride_waves() {
        let mut mine = Obstacle {
            id: 1,
            kind: ObstacleKind::Mine,
            pos: Vec3::new(10.0, -99.0, 20.0),
            radius: 5.0,
            spin: 0.0,
            tilt: 0.0,
        };
        update_obstacle(&mut mine, 1.0, DT);
        assert!((mine.pos.y - (wave_height(10.0, 20.0, 1.0) + 2.0)).abs() < 1e-5);
        assert!(mine.spin > 0.0);

        let mut wood = Obstacle { kind: ObstacleKind::Driftwood, radius: 4.0, ..mine.clone() };
        update_obstacle(&mut wood, 1.0, DT);
        assert!((wood.pos.y - wave_height(10.0, 20.0, 1.0)).abs() < 1e-5);
    }

    #[test]
    fn test_inactive_power_fish_is_still() {
        let home = Vec3::new(0.0, -10.0, 0.0);
        let mut fish = Pickup {
            id: 1,
            pos: home,
            home,
            kind: PickupKind::PowerFish {
                active: false,
                bob_offset: 0.0,
                spin: 0.0,
            },
        };
        update_pickup(&mut fish, 0.7, DT);
        assert_eq!(fish.pos, home);
    }

    #[test]
    fn test_dolphin_splashes_on_entry_and_exit() {
        let base = Vec3::new(0.0, -10.0, 0.0);
        let mut dolphin = Wildlife {
            id: 1,
            pos: base,
            yaw: 0.0,
            kind: WildlifeKind::Dolphin { base, timer: 0.0, roll: 0.0 },
        };
        let splashes = (0..(DOLPHIN_CYCLE / DT) as usize)
            .filter_map(|i| update_wildlife(&mut dolphin, i as f32 * DT, DT))
            .count();
        assert_eq!(splashes, 2);
    }

    fn race() -> RaceState {
        let config = RaceConfig::default();
        let track = TrackSpline::default_circuit().unwrap();
        let layout = WorldLayout::bare(&config);
        RaceState::new(config, track, layout, 1)
    }

    #[test]
    fn test_ai_rubber_banding() {
        let mut state = race();
        let obstacles = Vec::new();

        // Far ahead of the player: target is the hold-back speed
        let mut ai = state.ais[0].clone();
        ai.lap = 2;
        let base = match &ai.pilot {
            Pilot::Ai(p) => p.base_speed,
            Pilot::Player => unreachable!(),
        };
        for _ in 0..2000 {
            update_ai(&mut ai, &state.player, &obstacles, &state.track, &state.config, 0.0, DT);
        }
        let Pilot::Ai(p) = &ai.pilot else { unreachable!() };
        assert!((p.speed - base * 0.8).abs() < 1e-3);

        // Behind the player: catch up
        state.player.lap = 3;
        let mut ai = state.ais[0].clone();
        for _ in 0..2000 {
            update_ai(&mut ai, &state.player, &obstacles, &state.track, &state.config, 0.0, DT);
        }
        let Pilot::Ai(p) = &ai.pilot else { unreachable!() };
        assert!((p.speed - base * 1.3).abs() < 1e-3);
    }

    #[test]
    fn test_ai_advances_and_laps() {
        let state = race();
        let mut ai = state.ais[0].clone();
        ai.t = 0.999;
        let step = update_ai(&mut ai, &state.player, &[], &state.track, &state.config, 0.0, 0.1);
        assert!(step.lapped);
        assert!(!step.finished);
        assert_eq!(ai.lap, 2);
        assert!(ai.t < 0.1);

        ai.lap = state.config.total_laps;
        ai.t = 0.999;
        let step = update_ai(&mut ai, &state.player, &[], &state.track, &state.config, 0.0, 0.1);
        assert!(step.finished);
        assert!(ai.finished);
    }

    #[test]
    fn test_ai_frozen_while_resetting() {
        let state = race();
        let mut ai = state.ais[1].clone();
        ai.resetting = true;
        let before = ai.clone();
        update_ai(&mut ai, &state.player, &[], &state.track, &state.config, 1.0, DT);
        assert_eq!(ai.pos, before.pos);
        assert_eq!(ai.t, before.t);
    }

    #[test]
    fn test_ai_steers_away_from_obstacle() {
        let state = race();
        let ai = state.ais[0].clone();
        let side = state.track.side_normal_at(ai.t);
        // Obstacle just to the racer's left (negative side)
        let obstacle = Obstacle {
            id: 99,
            kind: ObstacleKind::Mine,
            pos: ai.pos - side * 10.0,
            radius: 5.0,
            spin: 0.0,
            tilt: 0.0,
        };
        let clear = ai_lateral_offset(&ai, 0.0, side, &[], &state.config, 0.0);
        let pushed = ai_lateral_offset(&ai, 0.0, side, &[obstacle], &state.config, 0.0);
        assert!((pushed - clear - state.config.ai.avoid_push).abs() < 1e-4);
    }
}
