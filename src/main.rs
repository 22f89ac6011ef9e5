//! Turtle-copter race entry point
//!
//! The browser build is driven from the page through `platform::web::WebRace`.
//! Natively this runs a headless race with a simple autopilot and logs how it
//! went. Usage: `turtlecopter-race [seed] [seconds]`.

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use turtlecopter_race::consts::FRAME_DT;
    use turtlecopter_race::platform::{Session, start_race};
    use turtlecopter_race::services::RecordingAudio;
    use turtlecopter_race::sim::{FlightMode, GameEvent, RaceState, TickInput};
    use turtlecopter_race::{Settings, wrap_unit};

    /// How far ahead (in t) the autopilot aims
    const LOOK_AHEAD: f32 = 0.02;
    /// Heading error (radians) tolerated before turning
    const STEER_DEADBAND: f32 = 0.05;

    /// Steer toward a point ahead on the track, stay on top of the water
    fn autopilot(race: &RaceState) -> TickInput {
        let player = &race.player;
        let target = race.track.point_at(wrap_unit(player.t + LOOK_AHEAD));
        let to_target = target - player.pos;
        let desired = turtlecopter_race::yaw_from_direction(to_target);
        let error = (desired - player.yaw + std::f32::consts::PI)
            .rem_euclid(std::f32::consts::TAU)
            - std::f32::consts::PI;

        TickInput {
            accelerate: true,
            turn_left: error > STEER_DEADBAND,
            turn_right: error < -STEER_DEADBAND,
            ascend: race.flight_mode.submerged,
            ..Default::default()
        }
    }

    pub fn run(seed: u64, seconds: f32) {
        let race = match start_race(None, seed) {
            Ok(race) => race,
            Err(e) => {
                log::error!("Could not set up race: {e}");
                return;
            }
        };
        let mut session = Session::new(race, Settings::default(), RecordingAudio::default());

        let frames = (seconds / FRAME_DT).ceil() as u64;
        let mut crashes = 0;
        for _ in 0..frames {
            let input = autopilot(&session.race);
            let hud = session.frame(FRAME_DT, &input);

            for event in session.last_events() {
                match event {
                    GameEvent::PlayerCrashed { cause } => {
                        crashes += 1;
                        log::info!("t={:.1}s crashed: {:?}", session.race.time, cause);
                    }
                    GameEvent::EnergyCollected { .. } => {
                        log::info!(
                            "t={:.1}s power fish, energy {:.0}%",
                            session.race.time,
                            hud.energy_pct
                        );
                    }
                    _ => {}
                }
            }
            session.drain_particles();

            if hud.race_over {
                break;
            }
        }

        let hud = turtlecopter_race::sim::Telemetry::capture(&session.race);
        let mode = match session.race.flight_mode {
            FlightMode { flying: true, .. } => "flying",
            FlightMode { submerged: true, .. } => "submerged",
            _ => "surfaced",
        };
        log::info!(
            "Finished after {:.1}s: lap {}/{}, rank {}/{}, {} crashes, {} sounds, {}",
            session.race.time,
            hud.lap,
            hud.total_laps,
            hud.final_rank.unwrap_or(hud.rank),
            hud.racer_count,
            crashes,
            session.audio().effects.len(),
            mode
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Turtle-copter race (native, headless) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(1);
    let seconds = args.next().and_then(|s| s.parse().ok()).unwrap_or(240.0);
    demo::run(seed, seconds);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The page drives the race through `WebRace`
}
