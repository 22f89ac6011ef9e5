//! Platform glue
//!
//! `Session` owns one race plus everything around it that is not simulation:
//! settings, asset slots, the audio sink and the particle queue. The browser
//! bridge (`web`) and the native demo both drive a race through it.

#[cfg(target_arch = "wasm32")]
pub mod web;

use serde::Serialize;
use thiserror::Error;

use crate::renderer::{Assets, WaterUniforms};
use crate::services::{AudioService, ParticleBurst, ParticleQueue, route_events};
use crate::settings::Settings;
use crate::sim::{
    ConfigError, GameEvent, RaceConfig, RaceState, Snapshot, Telemetry, TickInput, TrackError,
    new_race, tick,
};

/// Anything that can stop a race from being set up
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Track(#[from] TrackError),
}

/// Build a race from optional config JSON (defaults when absent)
pub fn start_race(config_json: Option<&str>, seed: u64) -> Result<RaceState, SetupError> {
    let config = match config_json {
        Some(json) if !json.trim().is_empty() => RaceConfig::from_json(json)?,
        _ => RaceConfig::default(),
    };
    let race = new_race(config, seed)?;
    log::info!(
        "Race started: seed {seed}, {} laps, {} AI racers",
        race.config.total_laps,
        race.ais.len()
    );
    Ok(race)
}

/// Rolling FPS over the last 60 frames
#[derive(Debug, Clone)]
pub struct FpsCounter {
    frame_times: [f64; 60],
    frame_index: usize,
    fps: u32,
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self { frame_times: [0.0; 60], frame_index: 0, fps: 0 }
    }
}

impl FpsCounter {
    /// Record a frame timestamp in milliseconds
    pub fn record(&mut self, time_ms: f64) {
        self.frame_times[self.frame_index] = time_ms;
        self.frame_index = (self.frame_index + 1) % 60;

        // Oldest sample is the next slot to be overwritten
        let oldest_time = self.frame_times[self.frame_index];
        if oldest_time > 0.0 {
            let elapsed = time_ms - oldest_time;
            if elapsed > 0.0 {
                self.fps = (59_000.0 / elapsed).round() as u32;
            }
        }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// What the page receives after each frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    #[serde(flatten)]
    pub telemetry: Telemetry,
    /// Present only when the FPS counter is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

/// One race and its presentation-side collaborators
pub struct Session<A: AudioService> {
    pub race: RaceState,
    pub settings: Settings,
    pub assets: Assets,
    audio: A,
    particles: ParticleQueue,
    fps: FpsCounter,
    last_events: Vec<GameEvent>,
}

impl<A: AudioService> Session<A> {
    pub fn new(race: RaceState, settings: Settings, audio: A) -> Self {
        let particles = ParticleQueue::new(settings.max_particles());
        Self {
            race,
            settings,
            assets: Assets::default(),
            audio,
            particles,
            fps: FpsCounter::default(),
            last_events: Vec::new(),
        }
    }

    /// Advance one display frame and dispatch its events
    pub fn frame(&mut self, dt: f32, input: &TickInput) -> Telemetry {
        tick(&mut self.race, input, dt);
        let telemetry = Telemetry::capture(&self.race);
        self.last_events = self.race.drain_events();
        route_events(&self.last_events, &telemetry, &mut self.audio, &mut self.particles);
        telemetry
    }

    /// `frame` plus FPS bookkeeping, for hosts that supply a timestamp
    pub fn frame_report(&mut self, dt: f32, input: &TickInput, now_ms: f64) -> FrameReport {
        self.fps.record(now_ms);
        let telemetry = self.frame(dt, input);
        FrameReport {
            telemetry,
            fps: self.settings.show_fps.then(|| self.fps.fps()),
        }
    }

    /// Events routed by the most recent frame
    pub fn last_events(&self) -> &[GameEvent] {
        &self.last_events
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.race, self.assets.detailed_dolphins(&self.settings))
    }

    pub fn water_uniforms(&self, aspect: f32) -> WaterUniforms {
        WaterUniforms::from_snapshot(&self.snapshot(), aspect)
    }

    pub fn drain_particles(&mut self) -> Vec<ParticleBurst> {
        self.particles.drain()
    }

    pub fn restart(&mut self) {
        self.race.restart();
        self.particles.drain();
    }

    pub fn apply_settings(&mut self, settings: Settings) {
        self.particles.set_max_particles(settings.max_particles());
        self.settings = settings;
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }
}
