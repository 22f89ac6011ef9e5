//! Seeded world layout
//!
//! Places hazards, scenery, predators, pickups and wildlife around the track.
//! The same seed always produces the same layout.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::config::RaceConfig;
use super::state::{
    Decoration, DecorationKind, Obstacle, ObstacleKind, Pickup, PickupKind, Predator,
    PredatorKind, Wildlife, WildlifeKind,
};
use super::track::TrackSpline;
use crate::{forward_from_yaw, yaw_from_direction};

pub const OBSTACLE_COUNT: usize = 80;
pub const DECORATION_ATTEMPTS: usize = 200;
pub const SHARK_COUNT: usize = 10;
pub const JELLYFISH_COUNT: usize = 30;
pub const POWER_FISH_COUNT: usize = 20;
pub const BOOST_PAD_COUNT: usize = 10;

pub const SEAGULL_COUNT: usize = 30;
pub const FISH_SCHOOL_COUNT: usize = 20;
pub const DOLPHIN_COUNT: usize = 8;
pub const CLOUD_COUNT: usize = 80;

/// Side length of the square scenery is scattered over
const SCENERY_EXTENT: f32 = 4000.0;
/// Scenery keeps this far (beyond track width) from the centreline
const SCENERY_CLEARANCE: f32 = 30.0;
/// Collision radius of every decoration
const DECORATION_RADIUS: f32 = 15.0;
/// Centreline samples used for the scenery clearance test
const CLEARANCE_SAMPLES: usize = 400;

pub const SHARK_ORBIT_RADIUS: f32 = 30.0;
/// Sharks swim this far under the local wave height
pub const SHARK_DEPTH: f32 = 5.0;
/// Jellyfish bob around this depth
pub const JELLYFISH_DEPTH: f32 = -30.0;
/// Boost pads sit this far above the floor limit
const BOOST_PAD_FLOOR_GAP: f32 = 10.0;

/// Initial placement of every non-racer entity
#[derive(Debug, Clone, Default)]
pub struct WorldLayout {
    /// One entry per AI racer
    pub ai_base_speeds: Vec<f32>,
    pub obstacles: Vec<Obstacle>,
    pub decorations: Vec<Decoration>,
    pub predators: Vec<Predator>,
    pub pickups: Vec<Pickup>,
    pub wildlife: Vec<Wildlife>,
}

impl WorldLayout {
    /// Racers only, no world entities. AI racers cruise at the middle of the
    /// configured speed band.
    pub fn bare(config: &RaceConfig) -> Self {
        let mid = (config.ai.base_speed_min + config.ai.base_speed_max) * 0.5;
        Self {
            ai_base_speeds: vec![mid; config.ai.count],
            ..Default::default()
        }
    }

    /// Generate a full layout from a seed
    pub fn generate(config: &RaceConfig, track: &TrackSpline, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut last_id = 0u32;
        let mut next_id = || {
            last_id += 1;
            last_id
        };

        let ai = &config.ai;
        let ai_base_speeds = (0..ai.count)
            .map(|_| rng.random_range(ai.base_speed_min..=ai.base_speed_max))
            .collect();

        let width = config.track_width;

        // Hazards along the racing line (keep the start straight clear)
        let obstacles = (0..OBSTACLE_COUNT)
            .map(|_| {
                let t = 0.05 + rng.random::<f32>() * 0.9;
                let kind = if rng.random::<f32>() > 0.5 {
                    ObstacleKind::Mine
                } else {
                    ObstacleKind::Driftwood
                };
                let offset = (rng.random::<f32>() - 0.5) * width * 1.5;
                let pos = track.point_at(t) + track.side_normal_at(t) * offset;
                let spin = match kind {
                    ObstacleKind::Mine => 0.0,
                    ObstacleKind::Driftwood => rng.random::<f32>() * PI,
                };
                Obstacle {
                    id: next_id(),
                    kind,
                    pos,
                    radius: kind.default_radius(),
                    spin,
                    tilt: 0.0,
                }
            })
            .collect();

        // Scenery off the racing line
        let clearance = width + SCENERY_CLEARANCE;
        let line: Vec<Vec3> = (0..CLEARANCE_SAMPLES)
            .map(|i| track.point_at(i as f32 / CLEARANCE_SAMPLES as f32))
            .collect();
        let mut decorations = Vec::new();
        for _ in 0..DECORATION_ATTEMPTS {
            let x = (rng.random::<f32>() - 0.5) * SCENERY_EXTENT;
            let z = (rng.random::<f32>() - 0.5) * SCENERY_EXTENT;
            let roll = rng.random::<f32>();
            let spot = Vec3::new(x, 0.0, z);
            if line.iter().any(|p| p.distance(spot) < clearance) {
                continue;
            }
            let (kind, y) = if roll < 0.4 {
                (DecorationKind::Rock, 0.0)
            } else if roll < 0.7 {
                (DecorationKind::Coral, -5.0)
            } else if roll < 0.85 {
                (DecorationKind::Statue, 5.0)
            } else {
                (DecorationKind::Seaweed, 5.0)
            };
            decorations.push(Decoration {
                id: next_id(),
                kind,
                pos: Vec3::new(x, y, z),
                radius: DECORATION_RADIUS,
            });
        }

        let mut predators = Vec::new();
        for i in 0..SHARK_COUNT {
            let t = 0.1 + i as f32 * 0.09;
            let jitter = Vec3::new(
                (rng.random::<f32>() - 0.5) * 100.0,
                0.0,
                (rng.random::<f32>() - 0.5) * 100.0,
            );
            let center = track.point_at(t) + jitter;
            let turn_speed = 0.5 + rng.random::<f32>();
            let angle = rng.random::<f32>() * TAU;
            predators.push(Predator {
                id: next_id(),
                pos: center + Vec3::new(angle.cos(), 0.0, angle.sin()) * SHARK_ORBIT_RADIUS,
                yaw: 0.0,
                kind: PredatorKind::Shark {
                    center,
                    orbit_radius: SHARK_ORBIT_RADIUS,
                    angle,
                    turn_speed,
                    depth: SHARK_DEPTH,
                    tail_swing: 0.0,
                },
            });
        }
        for _ in 0..JELLYFISH_COUNT {
            let t = rng.random::<f32>();
            let offset = (rng.random::<f32>() - 0.5) * width * 2.0;
            let mut pos = track.point_at(t) + track.side_normal_at(t) * offset;
            pos.y = JELLYFISH_DEPTH;
            predators.push(Predator {
                id: next_id(),
                pos,
                yaw: 0.0,
                kind: PredatorKind::Jellyfish {
                    depth: JELLYFISH_DEPTH,
                    phase: rng.random::<f32>() * TAU,
                    scale: 1.0,
                    squash: 1.0,
                },
            });
        }

        let mut pickups = Vec::new();
        for _ in 0..POWER_FISH_COUNT {
            let t = rng.random::<f32>();
            let offset = (rng.random::<f32>() - 0.5) * width * 1.5;
            let mut pos = track.point_at(t) + track.side_normal_at(t) * offset;
            // Just under the surface
            pos.y = -5.0 - rng.random::<f32>() * 10.0;
            pickups.push(Pickup {
                id: next_id(),
                pos,
                home: pos,
                kind: PickupKind::PowerFish {
                    active: true,
                    bob_offset: rng.random::<f32>() * PI,
                    spin: 0.0,
                },
            });
        }
        let pad_depth = config.flight.floor_limit + BOOST_PAD_FLOOR_GAP;
        for i in 0..BOOST_PAD_COUNT {
            let t = i as f32 / BOOST_PAD_COUNT as f32 + 0.05;
            let mut pos = track.point_at(t);
            pos.y = pad_depth;
            pickups.push(Pickup {
                id: next_id(),
                pos,
                home: pos,
                kind: PickupKind::BoostPad {
                    facing_yaw: yaw_from_direction(track.tangent_at(t)),
                    pulse: 1.0,
                    arrow_offset: 0.0,
                },
            });
        }

        let mut wildlife = Vec::new();
        for _ in 0..SEAGULL_COUNT {
            let center = Vec3::new(
                (rng.random::<f32>() - 0.5) * 1000.0,
                50.0 + rng.random::<f32>() * 50.0,
                (rng.random::<f32>() - 0.5) * 1000.0,
            );
            wildlife.push(Wildlife {
                id: next_id(),
                pos: center,
                yaw: 0.0,
                kind: WildlifeKind::Seagull {
                    center,
                    orbit_radius: 50.0 + rng.random::<f32>() * 100.0,
                    speed: 0.5 + rng.random::<f32>() * 0.5,
                    angle: rng.random::<f32>() * TAU,
                    flap: 1.0,
                },
            });
        }
        for _ in 0..FISH_SCHOOL_COUNT {
            let pos = Vec3::new(
                (rng.random::<f32>() - 0.5) * 800.0,
                -10.0 - rng.random::<f32>() * 20.0,
                (rng.random::<f32>() - 0.5) * 800.0,
            );
            let heading = rng.random::<f32>() * TAU;
            wildlife.push(Wildlife {
                id: next_id(),
                pos,
                yaw: heading,
                kind: WildlifeKind::FishSchool {
                    velocity: forward_from_yaw(heading),
                },
            });
        }
        for _ in 0..DOLPHIN_COUNT {
            let base = Vec3::new(
                (rng.random::<f32>() - 0.5) * 1000.0,
                -10.0,
                (rng.random::<f32>() - 0.5) * 1000.0,
            );
            wildlife.push(Wildlife {
                id: next_id(),
                pos: base,
                yaw: 0.0,
                kind: WildlifeKind::Dolphin {
                    base,
                    timer: rng.random::<f32>() * 10.0,
                    roll: 0.0,
                },
            });
        }
        for _ in 0..CLOUD_COUNT {
            let pos = Vec3::new(
                (rng.random::<f32>() - 0.5) * SCENERY_EXTENT,
                200.0 + rng.random::<f32>() * 100.0,
                (rng.random::<f32>() - 0.5) * SCENERY_EXTENT,
            );
            wildlife.push(Wildlife {
                id: next_id(),
                pos,
                yaw: 0.0,
                kind: WildlifeKind::Cloud {
                    speed: rng.random::<f32>() * 5.0 + 2.0,
                },
            });
        }

        Self {
            ai_base_speeds,
            obstacles,
            decorations,
            predators,
            pickups,
            wildlife,
        }
    }
}
