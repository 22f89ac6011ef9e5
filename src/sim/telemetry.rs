//! Read-only views of the race for the HUD, audio and renderer

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::camera::ChaseCamera;
use super::state::{
    DecorationKind, ObstacleKind, PickupKind, PredatorKind, RaceState, Racer, WildlifeKind,
};
use crate::consts::{DRIFT_SOUND_MIN_SPEED, ENGINE_SPEED_REF};

/// Displayed km/h per unit/s
const KMH_PER_SPEED: f32 = 2.0;

/// Engine pitch parameter in [0, 1]
pub fn speed_ratio(racer: &Racer) -> f32 {
    (racer.speed() / ENGINE_SPEED_REF).min(1.0)
}

/// HUD numbers for the current frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    /// Lap shown on the HUD (never past the final lap)
    pub lap: u32,
    pub total_laps: u32,
    pub rank: usize,
    pub racer_count: usize,
    pub speed_kmh: u32,
    pub energy_pct: f32,
    pub overheated: bool,
    pub message: Option<String>,
    pub race_over: bool,
    pub final_rank: Option<usize>,
    /// Camera below the drawn surface
    pub underwater: bool,
    pub speed_ratio: f32,
    /// Drift squeal on
    pub drifting: bool,
}

impl Telemetry {
    pub fn capture(state: &RaceState) -> Self {
        let player = &state.player;
        let speed = player.speed();
        Self {
            lap: player.lap.min(state.config.total_laps),
            total_laps: state.config.total_laps,
            rank: state.rank,
            racer_count: state.ais.len() + 1,
            speed_kmh: (speed * KMH_PER_SPEED).floor() as u32,
            energy_pct: player.flight_energy / state.config.flight.max_flight_energy * 100.0,
            overheated: player.overheated,
            message: state.message.map(str::to_owned),
            race_over: !state.is_active(),
            final_rank: state.final_rank,
            underwater: state.camera.underwater,
            speed_ratio: speed_ratio(player),
            drifting: state.input.drift && speed > DRIFT_SOUND_MIN_SPEED,
        }
    }
}

/// What the renderer should draw for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visual {
    Player,
    Ai,
    Mine,
    Driftwood,
    Rock,
    Coral,
    Statue,
    Seaweed,
    Shark,
    Jellyfish,
    PowerFish,
    BoostPad,
    Seagull,
    FishSchool,
    Dolphin,
    Cloud,
}

/// Pose of one visible entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub id: u32,
    pub visual: Visual,
    pub pos: Vec3,
    pub yaw: f32,
    /// Roll about the heading (bank, dolphin roll)
    pub roll: f32,
    /// Pitch, or the mine tilt / driftwood roll
    pub pitch: f32,
    /// Rotor angle, shark tail swing, boost arrow offset, seagull flap
    pub anim: f32,
    pub scale: Vec3,
}

impl Pose {
    fn new(id: u32, visual: Visual, pos: Vec3) -> Self {
        Self {
            id,
            visual,
            pos,
            yaw: 0.0,
            roll: 0.0,
            pitch: 0.0,
            anim: 0.0,
            scale: Vec3::ONE,
        }
    }
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub time: f32,
    /// Centre of the wake ripple (player x/z)
    pub ripple_center: Vec2,
    pub camera: ChaseCamera,
    /// Dolphins use the detailed model instead of the placeholder
    pub detailed_dolphins: bool,
    pub poses: Vec<Pose>,
}

fn racer_pose(racer: &Racer) -> Pose {
    let visual = if racer.is_player() { Visual::Player } else { Visual::Ai };
    Pose {
        yaw: racer.yaw,
        roll: racer.bank,
        pitch: racer.pitch,
        anim: racer.rotor_angle,
        ..Pose::new(racer.id, visual, racer.pos)
    }
}

impl Snapshot {
    pub fn capture(state: &RaceState, detailed_dolphins: bool) -> Self {
        let mut poses = Vec::with_capacity(
            1 + state.ais.len()
                + state.obstacles.len()
                + state.decorations.len()
                + state.predators.len()
                + state.pickups.len()
                + state.wildlife.len(),
        );
        poses.extend(state.racers().map(racer_pose));

        poses.extend(state.obstacles.iter().map(|o| {
            let visual = match o.kind {
                ObstacleKind::Mine => Visual::Mine,
                ObstacleKind::Driftwood => Visual::Driftwood,
            };
            Pose { yaw: o.spin, pitch: o.tilt, ..Pose::new(o.id, visual, o.pos) }
        }));

        poses.extend(state.decorations.iter().map(|d| {
            let visual = match d.kind {
                DecorationKind::Rock => Visual::Rock,
                DecorationKind::Coral => Visual::Coral,
                DecorationKind::Statue => Visual::Statue,
                DecorationKind::Seaweed => Visual::Seaweed,
            };
            Pose::new(d.id, visual, d.pos)
        }));

        poses.extend(state.predators.iter().map(|p| match p.kind {
            PredatorKind::Shark { tail_swing, .. } => Pose {
                yaw: p.yaw,
                anim: tail_swing,
                ..Pose::new(p.id, Visual::Shark, p.pos)
            },
            PredatorKind::Jellyfish { scale, squash, .. } => Pose {
                scale: Vec3::new(scale, scale * squash, scale),
                ..Pose::new(p.id, Visual::Jellyfish, p.pos)
            },
        }));

        // Collected power fish are hidden until restart
        poses.extend(state.pickups.iter().filter(|p| p.is_active()).map(|p| match p.kind {
            PickupKind::PowerFish { spin, .. } => {
                Pose { yaw: spin, ..Pose::new(p.id, Visual::PowerFish, p.pos) }
            }
            PickupKind::BoostPad { facing_yaw, pulse, arrow_offset } => Pose {
                yaw: facing_yaw,
                anim: arrow_offset,
                scale: Vec3::splat(pulse),
                ..Pose::new(p.id, Visual::BoostPad, p.pos)
            },
        }));

        poses.extend(state.wildlife.iter().map(|w| {
            let base = Pose { yaw: w.yaw, ..Pose::new(w.id, Visual::Cloud, w.pos) };
            match w.kind {
                WildlifeKind::Seagull { flap, .. } => {
                    Pose { visual: Visual::Seagull, anim: flap, ..base }
                }
                WildlifeKind::FishSchool { .. } => Pose { visual: Visual::FishSchool, ..base },
                WildlifeKind::Dolphin { roll, .. } => Pose { visual: Visual::Dolphin, roll, ..base },
                WildlifeKind::Cloud { .. } => base,
            }
        }));

        Self {
            time: state.time,
            ripple_center: Vec2::new(state.player.pos.x, state.player.pos.z),
            camera: state.camera.clone(),
            detailed_dolphins,
            poses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::RaceConfig;
    use crate::sim::tick::TickInput;
    use crate::sim::track::TrackSpline;
    use crate::sim::world::WorldLayout;

    fn race() -> RaceState {
        let config = RaceConfig::default();
        let track = TrackSpline::default_circuit().unwrap();
        let layout = WorldLayout::generate(&config, &track, 5);
        RaceState::new(config, track, layout, 5)
    }

    #[test]
    fn test_speed_readout() {
        let mut state = race();
        state.player.vel = glam::Vec3::new(30.0, 0.0, 40.0);
        let hud = Telemetry::capture(&state);
        assert_eq!(hud.speed_kmh, 100);
        assert!((hud.speed_ratio - 50.0 / 150.0).abs() < 1e-6);
        assert!(!hud.drifting);

        state.input = TickInput { drift: true, ..Default::default() };
        assert!(Telemetry::capture(&state).drifting);
        state.player.vel = glam::Vec3::new(10.0, 0.0, 0.0);
        assert!(!Telemetry::capture(&state).drifting);

        state.player.vel = glam::Vec3::new(1000.0, 0.0, 0.0);
        assert_eq!(Telemetry::capture(&state).speed_ratio, 1.0);
    }

    #[test]
    fn test_hud_lap_and_energy() {
        let mut state = race();
        state.player.lap = 4;
        state.player.flight_energy = 25.0;
        state.message = Some("CHOMP!");
        let hud = Telemetry::capture(&state);
        assert_eq!(hud.lap, 3);
        assert_eq!(hud.energy_pct, 25.0);
        assert_eq!(hud.message.as_deref(), Some("CHOMP!"));
        assert_eq!(hud.racer_count, 4);
    }

    #[test]
    fn test_snapshot_hides_collected_fish() {
        let mut state = race();
        let all = Snapshot::capture(&state, false).poses.len();
        let fish = state
            .pickups
            .iter_mut()
            .find(|p| matches!(p.kind, PickupKind::PowerFish { .. }))
            .unwrap();
        if let PickupKind::PowerFish { active, .. } = &mut fish.kind {
            *active = false;
        }
        let snapshot = Snapshot::capture(&state, false);
        assert_eq!(snapshot.poses.len(), all - 1);
        assert_eq!(snapshot.poses[0].visual, Visual::Player);
        assert!(serde_json::to_string(&snapshot).is_ok());
    }
}
