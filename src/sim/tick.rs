//! Per-frame simulation step
//!
//! Advances the whole race by one frame in a fixed order: scheduled events,
//! world entities, player flight, lap bookkeeping, collisions, AI racers,
//! rank and camera.

use serde::{Deserialize, Serialize};

use super::behaviors::{update_ai, update_world};
use super::collision::{resolve_ais, resolve_player};
use super::flight::step_flight;
use super::progress::{advance, crossed_start_line, rank_of, respawn_pose};
use super::state::{GameEvent, RacePhase, RaceState, ScheduledAction, SoundEffect};
use crate::consts::MAX_FRAME_DT;

/// Input commands for a single frame, sampled at frame start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub accelerate: bool,
    /// Reverse thrust
    pub brake: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub drift: bool,
    pub dive: bool,
    /// Surface when underwater, fly when above
    pub ascend: bool,
}

impl TickInput {
    pub const ACCELERATE: u8 = 1 << 0;
    pub const BRAKE: u8 = 1 << 1;
    pub const TURN_LEFT: u8 = 1 << 2;
    pub const TURN_RIGHT: u8 = 1 << 3;
    pub const DRIFT: u8 = 1 << 4;
    pub const DIVE: u8 = 1 << 5;
    pub const ASCEND: u8 = 1 << 6;

    /// Decode the packed key mask the web layer sends each frame
    pub fn from_bits(bits: u8) -> Self {
        Self {
            accelerate: bits & Self::ACCELERATE != 0,
            brake: bits & Self::BRAKE != 0,
            turn_left: bits & Self::TURN_LEFT != 0,
            turn_right: bits & Self::TURN_RIGHT != 0,
            drift: bits & Self::DRIFT != 0,
            dive: bits & Self::DIVE != 0,
            ascend: bits & Self::ASCEND != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        [
            (self.accelerate, Self::ACCELERATE),
            (self.brake, Self::BRAKE),
            (self.turn_left, Self::TURN_LEFT),
            (self.turn_right, Self::TURN_RIGHT),
            (self.drift, Self::DRIFT),
            (self.dive, Self::DIVE),
            (self.ascend, Self::ASCEND),
        ]
        .into_iter()
        .filter(|(held, _)| *held)
        .fold(0, |acc, (_, bit)| acc | bit)
    }
}

/// Advance the race by one frame of `dt` seconds (clamped to `MAX_FRAME_DT`)
pub fn tick(state: &mut RaceState, input: &TickInput, dt: f32) {
    // Don't tick once the race is over
    if !state.is_active() {
        return;
    }
    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };

    state.input = *input;
    state.frame += 1;
    state.time += dt;

    run_scheduled(state);
    // A respawn just past the line can complete the final lap
    if !state.is_active() {
        return;
    }
    update_world(state, dt);

    // Only the player freezes during a crash; the rest of the world keeps going
    if !state.player.resetting {
        let time = state.time;
        state.flight_mode = step_flight(&mut state.player, input, &state.config.flight, time, dt);
        update_player_progress(state);
        if !state.is_active() {
            return;
        }
    }

    resolve_player(state);
    update_ais(state, dt);
    resolve_ais(state);

    state.rank = rank_of(&state.player, &state.ais);
    if !state.player.resetting {
        let time = state.time;
        state.camera.follow(&state.player, time, dt);
    }
}

/// Fire every due scheduled event that belongs to the current race epoch
fn run_scheduled(state: &mut RaceState) {
    let now = state.time;
    let (due, pending): (Vec<_>, Vec<_>) = state
        .scheduled
        .drain(..)
        .partition(|event| event.fire_at <= now);
    state.scheduled = pending;

    for event in due {
        if event.epoch != state.epoch {
            log::warn!(
                "Dropping stale {:?} from epoch {} (current {})",
                event.action,
                event.epoch,
                state.epoch
            );
            continue;
        }
        match event.action {
            ScheduledAction::RespawnPlayer => respawn_player(state),
            ScheduledAction::ResumeAi { racer_id } => resume_ai(state, racer_id),
        }
    }
}

/// Put the player back on the nearest track point after a crash. Landing
/// across the start line counts the lap the crash interrupted.
pub fn respawn_player(state: &mut RaceState) {
    // Full scan: the player may be far from its last tracked t
    let (t, pos, yaw) = respawn_pose(&state.track, state.player.pos, state.config.respawn_height);
    let lapped = crossed_start_line(state.player.t, t);
    let player = &mut state.player;
    player.place(pos, yaw);
    player.t = t;
    if lapped {
        player.lap += 1;
    }
    player.resetting = false;
    player.flight_energy = state.config.flight.max_flight_energy;
    player.overheated = false;
    state.message = None;
    state.emit(GameEvent::PlayerRespawned { t });
    log::debug!("Player respawned at t={t:.3}");
    if lapped {
        complete_lap(state);
    }
}

fn resume_ai(state: &mut RaceState, racer_id: u32) {
    let resume_height = state.config.ai.resume_height;
    let Some(ai) = state.ais.iter_mut().find(|ai| ai.id == racer_id) else {
        log::warn!("Resume for unknown AI racer {racer_id}");
        return;
    };
    ai.resetting = false;
    ai.pos.y = resume_height;
    state.emit(GameEvent::AiResumed { racer_id });
}

/// Track the player along the course; count laps and finish the race
fn update_player_progress(state: &mut RaceState) {
    if advance(&mut state.player, &state.track) {
        complete_lap(state);
    }
}

/// Announce the lap the player just started, or finish on the last one
fn complete_lap(state: &mut RaceState) {
    state.emit(GameEvent::Sound(SoundEffect::LapComplete));
    let lap = state.player.lap;
    if lap > state.config.total_laps {
        finish_race(state);
    } else {
        state.emit(GameEvent::LapCompleted { lap });
        log::info!("Lap {lap}/{}", state.config.total_laps);
    }
}

/// Freeze the race and record the final standing. Rank is taken before the
/// player is marked finished so AI racers that already finished count ahead.
fn finish_race(state: &mut RaceState) {
    let rank = rank_of(&state.player, &state.ais);
    state.player.finished = true;
    state.phase = RacePhase::Finished;
    state.rank = rank;
    state.final_rank = Some(rank);
    state.emit(GameEvent::RaceFinished { rank });
    log::info!("Race finished: position {rank}/{}", state.ais.len() + 1);
}

fn update_ais(state: &mut RaceState, dt: f32) {
    let time = state.time;
    for ai in &mut state.ais {
        let step = update_ai(
            ai,
            &state.player,
            &state.obstacles,
            &state.track,
            &state.config,
            time,
            dt,
        );
        if step.finished {
            log::info!("AI {} finished", ai.id);
        } else if step.lapped {
            log::debug!("AI {} on lap {}", ai.id, ai.lap);
        }
    }
}
