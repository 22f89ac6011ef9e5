//! Collision detection and response
//!
//! Exhaustive per-frame distance checks between racers and every entity
//! group. Each group has its own response: scenery bounces, hazards crash,
//! jellyfish knock back, pickups reward.

use glam::Vec3;

use super::state::{
    CrashCause, GameEvent, ParticleKind, PickupKind, PredatorKind, RaceState, ScheduledAction,
    SoundEffect,
};
use crate::forward_from_yaw;

const DECORATION_SPARKS: u32 = 10;
const OBSTACLE_SPARKS: u32 = 30;
const SHARK_SPLASH: u32 = 20;
const JELLYFISH_SPLASH: u32 = 15;
const POWER_FISH_SPARKS: u32 = 10;
const BOOST_BUBBLES: u32 = 20;
const AI_CRASH_SPARKS: u32 = 20;
/// Vertical scale given to a jellyfish after it is bumped
const JELLYFISH_SQUASH: f32 = 0.5;

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Fallback push direction when the racer sits exactly on an entity centre:
/// back the way it came, else +X
fn fallback_normal(velocity: Vec3) -> Vec3 {
    let back = Vec3::new(-velocity.x, 0.0, -velocity.z).normalize_or_zero();
    if back == Vec3::ZERO { Vec3::X } else { back }
}

/// Unit outward normal from `center` to `pos` in the horizontal plane
pub fn horizontal_normal(pos: Vec3, center: Vec3, velocity: Vec3) -> Vec3 {
    let n = Vec3::new(pos.x - center.x, 0.0, pos.z - center.z).normalize_or_zero();
    if n == Vec3::ZERO { fallback_normal(velocity) } else { n }
}

/// Outward normal from a jellyfish, biased upward by `lift` and renormalised
pub fn knockback_normal(pos: Vec3, center: Vec3, velocity: Vec3, lift: f32) -> Vec3 {
    let mut n = (pos - center).normalize_or_zero();
    if n == Vec3::ZERO {
        n = fallback_normal(velocity);
    }
    n.y = lift;
    n.normalize_or(Vec3::Y)
}

#[inline]
fn within_horizontal(a: Vec3, b: Vec3, reach: f32) -> bool {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    dx * dx + dz * dz < reach * reach
}

#[inline]
fn within(a: Vec3, b: Vec3, reach: f32) -> bool {
    a.distance_squared(b) < reach * reach
}

/// Run every player check for this frame
pub fn resolve_player(state: &mut RaceState) {
    if state.player.resetting || !state.is_active() {
        return;
    }

    bounce_off_decorations(state);

    let margin = state.config.collision.obstacle_margin;
    let pos = state.player.pos;
    let hazard = state
        .obstacles
        .iter()
        .find(|o| within(pos, o.pos, o.radius + margin))
        .map(|o| CrashCause::from(o.kind));
    if let Some(cause) = hazard {
        crash_player(state, cause);
        return;
    }

    let shark_radius = state.config.collision.shark_radius;
    let bitten = state
        .predators
        .iter()
        .any(|p| matches!(p.kind, PredatorKind::Shark { .. }) && within(pos, p.pos, shark_radius));
    if bitten {
        crash_player(state, CrashCause::Shark);
        return;
    }

    knock_back_from_jellyfish(state);
    collect_pickups(state);
}

/// Scenery: reflect, damp and push out. Repeats every frame while overlapping.
fn bounce_off_decorations(state: &mut RaceState) {
    let cfg = &state.config.collision;
    let player = &mut state.player;
    for deco in &state.decorations {
        if !within_horizontal(player.pos, deco.pos, deco.radius + cfg.decoration_margin) {
            continue;
        }
        let normal = horizontal_normal(player.pos, deco.pos, player.vel);
        player.pos += normal * cfg.decoration_push;
        player.vel = reflect_velocity(player.vel, normal) * cfg.decoration_damping;
        state.events.push(GameEvent::Particles {
            pos: player.pos,
            count: DECORATION_SPARKS,
            kind: ParticleKind::Spark,
        });
        state.events.push(GameEvent::Sound(SoundEffect::Crash));
    }
}

fn knock_back_from_jellyfish(state: &mut RaceState) {
    let cfg = &state.config.collision;
    let player = &mut state.player;
    for predator in &mut state.predators {
        let PredatorKind::Jellyfish { squash, .. } = &mut predator.kind else {
            continue;
        };
        if !within(player.pos, predator.pos, cfg.jellyfish_radius) {
            continue;
        }
        let normal = knockback_normal(player.pos, predator.pos, player.vel, cfg.jellyfish_lift);
        player.pos += normal * cfg.jellyfish_push;
        player.vel = reflect_velocity(player.vel, normal) * cfg.jellyfish_damping;
        *squash = JELLYFISH_SQUASH;
        state.events.push(GameEvent::Particles {
            pos: player.pos,
            count: JELLYFISH_SPLASH,
            kind: ParticleKind::Splash,
        });
        state.events.push(GameEvent::Sound(SoundEffect::Splash));
    }
}

fn collect_pickups(state: &mut RaceState) {
    let cfg = &state.config.collision;
    let max_energy = state.config.flight.max_flight_energy;
    let player = &mut state.player;
    for pickup in &mut state.pickups {
        match &mut pickup.kind {
            PickupKind::PowerFish { active, .. } => {
                if !*active || !within(player.pos, pickup.pos, cfg.power_fish_radius) {
                    continue;
                }
                *active = false;
                player.flight_energy = (player.flight_energy + cfg.power_fish_energy).min(max_energy);
                state.events.push(GameEvent::Sound(SoundEffect::LapComplete));
                state.events.push(GameEvent::Particles {
                    pos: pickup.pos,
                    count: POWER_FISH_SPARKS,
                    kind: ParticleKind::Spark,
                });
                state.events.push(GameEvent::EnergyCollected { pickup_id: pickup.id });
            }
            PickupKind::BoostPad { facing_yaw, .. } => {
                if !within(player.pos, pickup.pos, cfg.boost_radius) {
                    continue;
                }
                player.vel += forward_from_yaw(*facing_yaw) * cfg.boost_impulse;
                state.events.push(GameEvent::Particles {
                    pos: player.pos,
                    count: BOOST_BUBBLES,
                    kind: ParticleKind::Bubble,
                });
                state.events.push(GameEvent::Sound(SoundEffect::Splash));
                state.events.push(GameEvent::Boosted { pickup_id: pickup.id });
            }
        }
    }
}

/// Freeze the player, show the crash banner and queue the respawn
fn crash_player(state: &mut RaceState, cause: CrashCause) {
    let (kind, count) = match cause {
        CrashCause::Shark => (ParticleKind::Splash, SHARK_SPLASH),
        CrashCause::Mine | CrashCause::Driftwood => (ParticleKind::Spark, OBSTACLE_SPARKS),
    };
    let pos = state.player.pos;
    state.player.resetting = true;
    state.player.vel = Vec3::ZERO;
    state.player.vertical_speed = 0.0;
    state.message = Some(cause.message());
    state.emit(GameEvent::Particles { pos, count, kind });
    state.emit(GameEvent::Sound(SoundEffect::Crash));
    state.emit(GameEvent::PlayerCrashed { cause });
    state.schedule(state.config.collision.player_crash_delay, ScheduledAction::RespawnPlayer);
    log::debug!("Player crashed ({cause:?}) at t={:.3}", state.player.t);
}

/// AI racers only crash into floating hazards. Decorations, predators and
/// pickups are player-only; AIs pass straight through them.
pub fn resolve_ais(state: &mut RaceState) {
    let margin = state.config.collision.obstacle_margin;
    let mut crashed = Vec::new();
    for ai in state.ais.iter_mut().filter(|ai| !ai.resetting) {
        let hit = state
            .obstacles
            .iter()
            .any(|o| within(ai.pos, o.pos, o.radius + margin));
        if !hit {
            continue;
        }
        ai.resetting = true;
        ai.vel = Vec3::ZERO;
        state.events.push(GameEvent::Particles {
            pos: ai.pos,
            count: AI_CRASH_SPARKS,
            kind: ParticleKind::Spark,
        });
        state.events.push(GameEvent::AiCrashed { racer_id: ai.id });
        crashed.push(ai.id);
    }
    for racer_id in crashed {
        log::debug!("AI {racer_id} crashed");
        state.schedule(
            state.config.collision.ai_crash_delay,
            ScheduledAction::ResumeAi { racer_id },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::RaceConfig;
    use crate::sim::state::{Decoration, DecorationKind, Obstacle, ObstacleKind, Pickup, Predator};
    use crate::sim::track::TrackSpline;
    use crate::sim::world::WorldLayout;
    use proptest::prelude::*;

    fn bare_race() -> RaceState {
        let config = RaceConfig::default();
        let track = TrackSpline::default_circuit().unwrap();
        let layout = WorldLayout::bare(&config);
        let mut state = RaceState::new(config, track, layout, 1);
        // Park the AI racers well away from anything the tests place
        for ai in &mut state.ais {
            ai.pos = Vec3::new(5000.0, 0.0, 5000.0);
        }
        state
    }

    fn rock(id: u32, pos: Vec3) -> Decoration {
        Decoration { id, kind: DecorationKind::Rock, pos, radius: 15.0 }
    }

    #[test]
    fn test_reflect_velocity() {
        let reflected = reflect_velocity(Vec3::new(100.0, 0.0, 0.0), Vec3::new(-1.0, 0.0, 0.0));
        assert!((reflected - Vec3::new(-100.0, 0.0, 0.0)).length() < 1e-4);
    }

    #[test]
    fn test_zero_normal_falls_back() {
        let n = horizontal_normal(Vec3::ONE, Vec3::ONE, Vec3::new(0.0, 0.0, 10.0));
        assert!((n - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
        let n = horizontal_normal(Vec3::ONE, Vec3::ONE, Vec3::ZERO);
        assert_eq!(n, Vec3::X);
        let n = knockback_normal(Vec3::ONE, Vec3::ONE, Vec3::ZERO, 0.5);
        assert!(n.is_finite());
        assert!((n.length() - 1.0).abs() < 1e-5);
        assert!(n.y > 0.0);
    }

    #[test]
    fn test_decoration_bounce() {
        let mut state = bare_race();
        state.player.pos = Vec3::new(0.0, 0.0, 0.0);
        state.player.vel = Vec3::new(40.0, 0.0, 0.0);
        state.decorations.push(rock(500, Vec3::new(10.0, 0.0, 0.0)));

        resolve_player(&mut state);

        // Bounced back along -X at half speed, pushed out
        assert!((state.player.vel - Vec3::new(-20.0, 0.0, 0.0)).length() < 1e-4);
        assert!((state.player.pos.x + 1.5).abs() < 1e-4);
        assert!(!state.player.resetting);
        assert!(state.events.iter().any(|e| matches!(
            e,
            GameEvent::Particles { kind: ParticleKind::Spark, .. }
        )));
    }

    #[test]
    fn test_mine_crash_schedules_respawn() {
        let mut state = bare_race();
        let pos = state.player.pos;
        state.obstacles.push(Obstacle {
            id: 600,
            kind: ObstacleKind::Mine,
            pos: pos + Vec3::new(3.0, 0.0, 0.0),
            radius: 5.0,
            spin: 0.0,
            tilt: 0.0,
        });
        resolve_player(&mut state);

        assert!(state.player.resetting);
        assert_eq!(state.message, Some("BOOM!"));
        assert_eq!(state.scheduled.len(), 1);
        assert_eq!(state.scheduled[0].action, ScheduledAction::RespawnPlayer);
        assert!((state.scheduled[0].fire_at - 1.5).abs() < 1e-6);
        assert!(state.events.contains(&GameEvent::PlayerCrashed { cause: CrashCause::Mine }));

        // Frozen: a second pass does nothing
        state.events.clear();
        resolve_player(&mut state);
        assert_eq!(state.scheduled.len(), 1);
        assert!(state.events.is_empty());
    }

    #[test]
    fn test_shark_bite() {
        let mut state = bare_race();
        let pos = state.player.pos;
        state.predators.push(Predator {
            id: 700,
            pos: pos + Vec3::new(0.0, -5.0, 0.0),
            yaw: 0.0,
            kind: PredatorKind::Shark {
                center: pos,
                orbit_radius: 30.0,
                angle: 0.0,
                turn_speed: 1.0,
                depth: 5.0,
                tail_swing: 0.0,
            },
        });
        resolve_player(&mut state);
        assert!(state.player.resetting);
        assert_eq!(state.message, Some("CHOMP!"));
    }

    #[test]
    fn test_jellyfish_knockback_is_not_a_crash() {
        let mut state = bare_race();
        state.player.pos = Vec3::new(0.0, -30.0, 0.0);
        state.player.vel = Vec3::new(0.0, 0.0, 50.0);
        state.predators.push(Predator {
            id: 701,
            pos: Vec3::new(0.0, -30.0, 4.0),
            yaw: 0.0,
            kind: PredatorKind::Jellyfish { depth: -30.0, phase: 0.0, scale: 1.0, squash: 1.0 },
        });
        resolve_player(&mut state);

        assert!(!state.player.resetting);
        assert!(state.player.vel.z < 0.0);
        assert!(state.player.vel.length() <= 50.0 * 0.8 + 1e-3);
        assert!(state.player.pos.y > -30.0);
        let PredatorKind::Jellyfish { squash, .. } = state.predators[0].kind else {
            panic!("kind changed");
        };
        assert_eq!(squash, JELLYFISH_SQUASH);
        assert!(state.events.contains(&GameEvent::Sound(SoundEffect::Splash)));
    }

    #[test]
    fn test_power_fish_single_use() {
        let mut state = bare_race();
        state.player.flight_energy = 70.0;
        let pos = state.player.pos;
        state.pickups.push(Pickup {
            id: 800,
            pos,
            home: pos,
            kind: PickupKind::PowerFish { active: true, bob_offset: 0.0, spin: 0.0 },
        });
        resolve_player(&mut state);
        assert_eq!(state.player.flight_energy, 100.0);
        assert!(!state.pickups[0].is_active());

        state.player.flight_energy = 10.0;
        resolve_player(&mut state);
        assert_eq!(state.player.flight_energy, 10.0);
    }

    #[test]
    fn test_boost_pad_every_frame() {
        let mut state = bare_race();
        let pos = state.player.pos;
        state.pickups.push(Pickup {
            id: 801,
            pos,
            home: pos,
            kind: PickupKind::BoostPad { facing_yaw: 0.0, pulse: 1.0, arrow_offset: 0.0 },
        });
        resolve_player(&mut state);
        resolve_player(&mut state);
        assert!((state.player.vel.z - 600.0).abs() < 1e-3);
        let boosts = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::Boosted { .. }))
            .count();
        assert_eq!(boosts, 2);
    }

    #[test]
    fn test_ai_crash_and_schedule() {
        let mut state = bare_race();
        let ai_pos = Vec3::new(100.0, 0.0, 100.0);
        state.ais[1].pos = ai_pos;
        state.obstacles.push(Obstacle {
            id: 900,
            kind: ObstacleKind::Driftwood,
            pos: ai_pos,
            radius: 4.0,
            spin: 0.0,
            tilt: 0.0,
        });
        resolve_ais(&mut state);
        assert!(state.ais[1].resetting);
        assert!(!state.ais[0].resetting);
        let id = state.ais[1].id;
        assert_eq!(state.scheduled.len(), 1);
        assert_eq!(state.scheduled[0].action, ScheduledAction::ResumeAi { racer_id: id });
        assert!((state.scheduled[0].fire_at - 1.0).abs() < 1e-6);
        // No crash banner for AI racers
        assert_eq!(state.message, None);
    }

    #[test]
    fn test_ai_passes_through_non_obstacles() {
        let mut state = bare_race();
        let pos = Vec3::new(100.0, 0.0, 100.0);
        state.ais[0].pos = pos;
        state.ais[0].vel = Vec3::new(0.0, 0.0, 40.0);
        state.decorations.push(rock(510, pos));
        state.predators.push(Predator {
            id: 710,
            pos,
            yaw: 0.0,
            kind: PredatorKind::Jellyfish { depth: 0.0, phase: 0.0, scale: 1.0, squash: 1.0 },
        });
        state.pickups.push(Pickup {
            id: 810,
            pos,
            home: pos,
            kind: PickupKind::PowerFish { active: true, bob_offset: 0.0, spin: 0.0 },
        });
        state.events.clear();

        resolve_ais(&mut state);
        assert!(!state.ais[0].resetting);
        assert_eq!(state.ais[0].pos, pos);
        assert_eq!(state.ais[0].vel, Vec3::new(0.0, 0.0, 40.0));
        assert!(state.pickups[0].is_active());
        assert!(state.events.is_empty());
        assert!(state.scheduled.is_empty());
    }

    proptest! {
        #[test]
        fn prop_decoration_never_speeds_up(
            vx in -200.0f32..200.0,
            vz in -200.0f32..200.0,
            ox in -19.0f32..19.0,
            oz in -19.0f32..19.0,
        ) {
            let mut state = bare_race();
            state.player.pos = Vec3::new(ox, 0.0, oz);
            state.player.vel = Vec3::new(vx, 0.0, vz);
            state.decorations.push(rock(500, Vec3::ZERO));
            let before = state.player.vel.length();
            resolve_player(&mut state);
            prop_assert!(state.player.vel.is_finite());
            prop_assert!(state.player.vel.length() <= before + 1e-3);
        }

        #[test]
        fn prop_jellyfish_never_speeds_up(
            vx in -200.0f32..200.0,
            vy in -50.0f32..50.0,
            vz in -200.0f32..200.0,
            ox in -4.0f32..4.0,
            oz in -4.0f32..4.0,
        ) {
            let mut state = bare_race();
            state.player.pos = Vec3::new(ox, -30.0, oz);
            state.player.vel = Vec3::new(vx, vy, vz);
            state.predators.push(Predator {
                id: 701,
                pos: Vec3::new(0.0, -30.0, 0.0),
                yaw: 0.0,
                kind: PredatorKind::Jellyfish { depth: -30.0, phase: 0.0, scale: 1.0, squash: 1.0 },
            });
            let before = state.player.vel.length();
            resolve_player(&mut state);
            prop_assert!(state.player.vel.is_finite());
            prop_assert!(state.player.vel.length() <= before + 1e-3);
        }
    }
}
