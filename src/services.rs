//! Interfaces to the audio and particle collaborators
//!
//! The simulation only records `GameEvent`s. After each frame the platform
//! layer drains them and routes sounds and particle bursts to whatever
//! implements these traits (Web Audio in the browser, recorders natively).

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::{GameEvent, ParticleKind, SoundEffect, Telemetry};

/// Sound output. Fire-and-forget.
pub trait AudioService {
    fn play_effect(&mut self, effect: SoundEffect);
    /// Engine pitch (0..=1) and drift squeal, every frame
    fn update_continuous(&mut self, speed_ratio: f32, drifting: bool);
}

/// Cosmetic particle output
pub trait ParticleService {
    fn spawn(&mut self, pos: Vec3, count: u32, kind: ParticleKind);
}

/// Dispatch one frame's events and continuous audio parameters
pub fn route_events(
    events: &[GameEvent],
    telemetry: &Telemetry,
    audio: &mut impl AudioService,
    particles: &mut impl ParticleService,
) {
    for event in events {
        match event {
            GameEvent::Sound(effect) => audio.play_effect(*effect),
            GameEvent::Particles { pos, count, kind } => particles.spawn(*pos, *count, *kind),
            _ => {}
        }
    }
    audio.update_continuous(telemetry.speed_ratio, telemetry.drifting);
}

/// One particle burst waiting for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleBurst {
    pub pos: Vec3,
    pub count: u32,
    pub kind: ParticleKind,
}

/// Buffers bursts between frames, capped at `max_particles` particles
#[derive(Debug, Clone, Default)]
pub struct ParticleQueue {
    bursts: Vec<ParticleBurst>,
    queued: u32,
    max_particles: u32,
}

impl ParticleQueue {
    pub fn new(max_particles: usize) -> Self {
        Self {
            bursts: Vec::new(),
            queued: 0,
            max_particles: u32::try_from(max_particles).unwrap_or(u32::MAX),
        }
    }

    pub fn set_max_particles(&mut self, max_particles: usize) {
        self.max_particles = u32::try_from(max_particles).unwrap_or(u32::MAX);
    }

    pub fn len(&self) -> usize {
        self.bursts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bursts.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ParticleBurst> {
        self.queued = 0;
        std::mem::take(&mut self.bursts)
    }
}

impl ParticleService for ParticleQueue {
    fn spawn(&mut self, pos: Vec3, count: u32, kind: ParticleKind) {
        let count = count.min(self.max_particles.saturating_sub(self.queued));
        if count == 0 {
            return;
        }
        self.queued += count;
        self.bursts.push(ParticleBurst { pos, count, kind });
    }
}

/// Audio sink that remembers what it was asked to play
#[derive(Debug, Clone, Default)]
pub struct RecordingAudio {
    pub effects: Vec<SoundEffect>,
    pub speed_ratio: f32,
    pub drifting: bool,
}

impl AudioService for RecordingAudio {
    fn play_effect(&mut self, effect: SoundEffect) {
        self.effects.push(effect);
    }

    fn update_continuous(&mut self, speed_ratio: f32, drifting: bool) {
        self.speed_ratio = speed_ratio;
        self.drifting = drifting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{RaceConfig, new_race};

    #[test]
    fn test_route_events() {
        let race = new_race(RaceConfig::default(), 1).unwrap();
        let mut telemetry = Telemetry::capture(&race);
        telemetry.speed_ratio = 0.5;
        telemetry.drifting = true;

        let events = vec![
            GameEvent::Sound(SoundEffect::Crash),
            GameEvent::Particles { pos: Vec3::ONE, count: 30, kind: ParticleKind::Spark },
            GameEvent::LapCompleted { lap: 2 },
            GameEvent::Sound(SoundEffect::LapComplete),
        ];
        let mut audio = RecordingAudio::default();
        let mut particles = ParticleQueue::new(500);
        route_events(&events, &telemetry, &mut audio, &mut particles);

        assert_eq!(audio.effects, vec![SoundEffect::Crash, SoundEffect::LapComplete]);
        assert_eq!(audio.speed_ratio, 0.5);
        assert!(audio.drifting);
        let bursts = particles.drain();
        assert_eq!(bursts.len(), 1);
        assert_eq!(bursts[0].kind, ParticleKind::Spark);
        assert!(particles.is_empty());
    }

    #[test]
    fn test_particle_cap() {
        let mut queue = ParticleQueue::new(25);
        queue.spawn(Vec3::ZERO, 20, ParticleKind::Bubble);
        queue.spawn(Vec3::ZERO, 20, ParticleKind::Bubble);
        queue.spawn(Vec3::ZERO, 20, ParticleKind::Bubble);
        let bursts = queue.drain();
        assert_eq!(bursts.len(), 2);
        assert_eq!(bursts[1].count, 5);

        // Cap resets per drain
        queue.spawn(Vec3::ZERO, 20, ParticleKind::Splash);
        assert_eq!(queue.len(), 1);

        // Particles off
        let mut off = ParticleQueue::new(0);
        off.spawn(Vec3::ZERO, 10, ParticleKind::Spark);
        assert!(off.is_empty());
    }
}
