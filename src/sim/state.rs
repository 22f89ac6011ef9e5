//! Race state and entity types
//!
//! The whole simulation lives in one `RaceState` owned by the frame loop.
//! Entities are tagged variants with per-kind payloads so behaviour and
//! collision code can match exhaustively.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::camera::ChaseCamera;
use super::config::RaceConfig;
use super::flight::FlightMode;
use super::tick::TickInput;
use super::track::TrackSpline;
use super::world::WorldLayout;

/// Current phase of the race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacePhase {
    /// Simulation advancing
    Racing,
    /// Player completed the final lap; simulation frozen
    Finished,
}

/// Steering state owned by an AI racer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiPilot {
    /// Position in the starting grid (also phases the lateral wander)
    pub index: usize,
    pub base_speed: f32,
    /// Current cruise speed, eased toward the rubber-band target
    pub speed: f32,
    pub wander_phase: f32,
}

/// Who controls a racer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Pilot {
    Player,
    Ai(AiPilot),
}

/// A turtle-copter. Player and AI share this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Racer {
    pub id: u32,
    pub pilot: Pilot,
    pub pos: Vec3,
    /// Velocity from thrust and impulses
    pub vel: Vec3,
    /// Buoyancy / gravity / flight channel, integrated into y separately
    pub vertical_speed: f32,
    pub yaw: f32,
    pub bank: f32,
    /// Visual only
    pub pitch: f32,
    /// Visual only
    pub rotor_angle: f32,
    pub flight_energy: f32,
    pub overheated: bool,
    pub lap: u32,
    /// Progress along the track in [0, 1)
    pub t: f32,
    pub finished: bool,
    /// Frozen after a crash until a scheduled resume
    pub resetting: bool,
}

impl Racer {
    fn base(id: u32, pilot: Pilot, max_energy: f32) -> Self {
        Self {
            id,
            pilot,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            vertical_speed: 0.0,
            yaw: 0.0,
            bank: 0.0,
            pitch: 0.0,
            rotor_angle: 0.0,
            flight_energy: max_energy,
            overheated: false,
            lap: 1,
            t: 0.0,
            finished: false,
            resetting: false,
        }
    }

    pub fn player(id: u32, max_energy: f32) -> Self {
        Self::base(id, Pilot::Player, max_energy)
    }

    pub fn ai(id: u32, index: usize, base_speed: f32, max_energy: f32) -> Self {
        Self::base(
            id,
            Pilot::Ai(AiPilot {
                index,
                base_speed,
                speed: base_speed,
                wander_phase: index as f32,
            }),
            max_energy,
        )
    }

    pub fn is_player(&self) -> bool {
        matches!(self.pilot, Pilot::Player)
    }

    /// Horizontal + vertical speed magnitude from `vel`
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Race progress as a single comparable number
    pub fn progress(&self) -> (u32, f32) {
        (self.lap, self.t)
    }

    /// Drop all motion and put the racer at a pose
    pub fn place(&mut self, pos: Vec3, yaw: f32) {
        self.pos = pos;
        self.yaw = yaw;
        self.vel = Vec3::ZERO;
        self.vertical_speed = 0.0;
        self.bank = 0.0;
        self.pitch = 0.0;
    }
}

/// Hazard kinds that crash a racer on contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    Mine,
    Driftwood,
}

impl ObstacleKind {
    pub fn default_radius(&self) -> f32 {
        match self {
            ObstacleKind::Mine => 5.0,
            ObstacleKind::Driftwood => 4.0,
        }
    }

    /// Height above the local wave the obstacle floats at
    pub fn float_height(&self) -> f32 {
        match self {
            ObstacleKind::Mine => 2.0,
            ObstacleKind::Driftwood => 0.0,
        }
    }
}

/// A floating hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub kind: ObstacleKind,
    pub pos: Vec3,
    pub radius: f32,
    /// Spin about the vertical axis (mines) or roll (driftwood)
    pub spin: f32,
    /// Rocking tilt (mines)
    pub tilt: f32,
}

/// Static scenery kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    Rock,
    Coral,
    Statue,
    Seaweed,
}

/// Static scenery racers bounce off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decoration {
    pub id: u32,
    pub kind: DecorationKind,
    pub pos: Vec3,
    pub radius: f32,
}

/// Predator behaviour payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PredatorKind {
    /// Circles `center` just under the surface
    Shark {
        center: Vec3,
        orbit_radius: f32,
        angle: f32,
        turn_speed: f32,
        depth: f32,
        tail_swing: f32,
    },
    /// Bobs in place around a fixed depth
    Jellyfish {
        depth: f32,
        phase: f32,
        /// Pulse scale
        scale: f32,
        /// Vertical squash after a bump (1 = none)
        squash: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Predator {
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub kind: PredatorKind,
}

/// Pickup payloads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PickupKind {
    /// Restores flight energy; single use until restart
    PowerFish {
        active: bool,
        bob_offset: f32,
        spin: f32,
    },
    /// Forward impulse every frame a racer is in range
    BoostPad {
        facing_yaw: f32,
        pulse: f32,
        arrow_offset: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec3,
    /// Placement position, restored on restart
    pub home: Vec3,
    pub kind: PickupKind,
}

impl Pickup {
    /// Whether the pickup can currently be collided with
    pub fn is_active(&self) -> bool {
        match self.kind {
            PickupKind::PowerFish { active, .. } => active,
            PickupKind::BoostPad { .. } => true,
        }
    }
}

/// Cosmetic wildlife (never collides, never affects laps)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WildlifeKind {
    Seagull {
        center: Vec3,
        orbit_radius: f32,
        speed: f32,
        angle: f32,
        flap: f32,
    },
    FishSchool {
        velocity: Vec3,
    },
    Dolphin {
        base: Vec3,
        timer: f32,
        roll: f32,
    },
    Cloud {
        speed: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wildlife {
    pub id: u32,
    pub pos: Vec3,
    pub yaw: f32,
    pub kind: WildlifeKind,
}

/// Discrete sounds the audio collaborator plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundEffect {
    Crash,
    Splash,
    LapComplete,
}

/// Particle bursts the particle collaborator spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Spark,
    Splash,
    Bubble,
}

/// What took the player out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrashCause {
    Mine,
    Driftwood,
    Shark,
}

impl CrashCause {
    pub fn message(&self) -> &'static str {
        match self {
            CrashCause::Mine => "BOOM!",
            CrashCause::Driftwood => "CRASH!",
            CrashCause::Shark => "CHOMP!",
        }
    }
}

impl From<ObstacleKind> for CrashCause {
    fn from(kind: ObstacleKind) -> Self {
        match kind {
            ObstacleKind::Mine => CrashCause::Mine,
            ObstacleKind::Driftwood => CrashCause::Driftwood,
        }
    }
}

/// Events emitted during a tick, drained by the platform layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Sound(SoundEffect),
    Particles {
        pos: Vec3,
        count: u32,
        kind: ParticleKind,
    },
    LapCompleted { lap: u32 },
    PlayerCrashed { cause: CrashCause },
    PlayerRespawned { t: f32 },
    AiCrashed { racer_id: u32 },
    AiResumed { racer_id: u32 },
    EnergyCollected { pickup_id: u32 },
    Boosted { pickup_id: u32 },
    RaceFinished { rank: usize },
    RaceRestarted,
}

/// Deferred work, tagged with the race epoch it was scheduled in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScheduledAction {
    RespawnPlayer,
    ResumeAi { racer_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub epoch: u32,
    /// Simulation time (seconds) at which the action fires
    pub fire_at: f32,
    pub action: ScheduledAction,
}

/// Complete race state
#[derive(Debug, Clone)]
pub struct RaceState {
    pub config: RaceConfig,
    pub track: TrackSpline,
    /// Seed the world layout was generated from
    pub seed: u64,
    /// Incremented on every restart; scheduled events from older epochs are dropped
    pub epoch: u32,
    /// Elapsed simulation time (seconds)
    pub time: f32,
    pub frame: u64,
    pub phase: RacePhase,
    /// Input sampled at the start of the latest tick
    pub input: TickInput,
    pub player: Racer,
    /// Player's surfaced/submerged and flying state from the latest step
    pub flight_mode: FlightMode,
    pub ais: Vec<Racer>,
    pub obstacles: Vec<Obstacle>,
    pub decorations: Vec<Decoration>,
    pub predators: Vec<Predator>,
    pub pickups: Vec<Pickup>,
    pub wildlife: Vec<Wildlife>,
    pub camera: ChaseCamera,
    /// Live player rank (1 = leading)
    pub rank: usize,
    /// Set when the race finishes
    pub final_rank: Option<usize>,
    /// HUD banner (crash text)
    pub message: Option<&'static str>,
    pub scheduled: Vec<ScheduledEvent>,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl RaceState {
    /// Build a race from a track and a generated world layout
    pub fn new(config: RaceConfig, track: TrackSpline, layout: WorldLayout, seed: u64) -> Self {
        let max_energy = config.flight.max_flight_energy;
        let mut state = Self {
            config,
            track,
            seed,
            epoch: 0,
            time: 0.0,
            frame: 0,
            phase: RacePhase::Racing,
            input: TickInput::default(),
            player: Racer::player(0, max_energy),
            flight_mode: FlightMode::default(),
            ais: Vec::new(),
            obstacles: Vec::new(),
            decorations: Vec::new(),
            predators: Vec::new(),
            pickups: Vec::new(),
            wildlife: Vec::new(),
            camera: ChaseCamera::default(),
            rank: 1,
            final_rank: None,
            message: None,
            scheduled: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };

        state.player.id = state.next_entity_id();
        for (index, &base_speed) in layout.ai_base_speeds.iter().enumerate() {
            let id = state.next_entity_id();
            state.ais.push(Racer::ai(id, index, base_speed, max_energy));
        }
        // Re-key layout entities into the race's id space
        state.obstacles = layout.obstacles;
        state.decorations = layout.decorations;
        state.predators = layout.predators;
        state.pickups = layout.pickups;
        state.wildlife = layout.wildlife;
        let mut next_id = state.next_id;
        let mut rekey = |id: &mut u32| {
            *id = next_id;
            next_id += 1;
        };
        state.obstacles.iter_mut().for_each(|e| rekey(&mut e.id));
        state.decorations.iter_mut().for_each(|e| rekey(&mut e.id));
        state.predators.iter_mut().for_each(|e| rekey(&mut e.id));
        state.pickups.iter_mut().for_each(|e| rekey(&mut e.id));
        state.wildlife.iter_mut().for_each(|e| rekey(&mut e.id));
        state.next_id = next_id;

        state.reset_racers();
        state.camera.snap_behind(&state.player);
        log::info!(
            "Race ready: seed {}, {} AI, {} obstacles, {} decorations, {} predators, {} pickups",
            seed,
            state.ais.len(),
            state.obstacles.len(),
            state.decorations.len(),
            state.predators.len(),
            state.pickups.len()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn is_active(&self) -> bool {
        self.phase == RacePhase::Racing
    }

    /// All racers, player first
    pub fn racers(&self) -> impl Iterator<Item = &Racer> {
        std::iter::once(&self.player).chain(self.ais.iter())
    }

    /// Start offset of an AI racer in the grid
    pub fn ai_start_t(&self, index: usize) -> f32 {
        self.config.ai.start_t + index as f32 * self.config.ai.start_spacing
    }

    /// Queue an action for `delay` seconds from now in the current epoch
    pub fn schedule(&mut self, delay: f32, action: ScheduledAction) {
        self.scheduled.push(ScheduledEvent {
            epoch: self.epoch,
            fire_at: self.time + delay,
            action,
        });
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Put every racer back on the grid: lap 1, staggered t, at rest
    fn reset_racers(&mut self) {
        let max_energy = self.config.flight.max_flight_energy;
        let respawn_height = self.config.respawn_height;

        let start = self.track.point_at(0.0);
        let yaw = crate::yaw_from_direction(self.track.tangent_at(0.0));
        let player = &mut self.player;
        player.place(Vec3::new(start.x, respawn_height, start.z), yaw);
        player.t = 0.0;
        player.lap = 1;
        player.finished = false;
        player.resetting = false;
        player.flight_energy = max_energy;
        player.overheated = false;

        for i in 0..self.ais.len() {
            let t = self.ai_start_t(i);
            let pos = self.track.point_at(t);
            let yaw = crate::yaw_from_direction(self.track.tangent_at(t));
            let ai = &mut self.ais[i];
            ai.place(pos, yaw);
            ai.t = crate::wrap_unit(t);
            ai.lap = 1;
            ai.finished = false;
            ai.resetting = false;
            ai.flight_energy = max_energy;
            ai.overheated = false;
            if let Pilot::Ai(pilot) = &mut ai.pilot {
                pilot.speed = pilot.base_speed;
            }
        }
    }

    /// Restart the race in place. Everything transient is reset synchronously
    /// and the epoch advances so in-flight scheduled events become stale.
    pub fn restart(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
        self.scheduled.clear();
        self.phase = RacePhase::Racing;
        self.rank = 1;
        self.final_rank = None;
        self.message = None;
        self.flight_mode = FlightMode::default();

        self.reset_racers();

        for pickup in &mut self.pickups {
            pickup.pos = pickup.home;
            if let PickupKind::PowerFish { active, .. } = &mut pickup.kind {
                *active = true;
            }
        }

        self.camera.snap_behind(&self.player);
        self.emit(GameEvent::Sound(SoundEffect::LapComplete));
        self.emit(GameEvent::RaceRestarted);
        log::info!("Race restarted (epoch {})", self.epoch);
    }
}
