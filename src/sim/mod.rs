//! Deterministic race simulation
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Clamped frame delta only
//! - Seeded RNG only (world layout)
//! - Stable iteration order (player first, then entities in id order)
//! - No rendering or platform dependencies

pub mod behaviors;
pub mod camera;
pub mod collision;
pub mod config;
pub mod flight;
pub mod progress;
pub mod state;
pub mod telemetry;
pub mod tick;
pub mod track;
pub mod wave;
pub mod world;

pub use camera::ChaseCamera;
pub use config::{AiConfig, CollisionConfig, ConfigError, FlightConfig, RaceConfig};
pub use flight::{FlightMode, step_flight};
pub use state::{
    CrashCause, GameEvent, ParticleKind, Pickup, PickupKind, RacePhase, RaceState, Racer,
    SoundEffect,
};
pub use telemetry::{Pose, Snapshot, Telemetry, Visual};
pub use tick::{TickInput, tick};
pub use track::{TrackError, TrackSpline};
pub use wave::{surface_height, wave_height};
pub use world::WorldLayout;

/// Build a race on the default circuit with a seeded world layout
pub fn new_race(config: RaceConfig, seed: u64) -> Result<RaceState, TrackError> {
    let track = TrackSpline::new(track::DEFAULT_CIRCUIT.to_vec(), config.track_width)?;
    let layout = WorldLayout::generate(&config, &track, seed);
    Ok(RaceState::new(config, track, layout, seed))
}
