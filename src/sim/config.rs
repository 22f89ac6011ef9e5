//! Race tuning
//!
//! Every physics and gameplay constant the simulation reads. Deserialised with
//! defaults so a partial JSON override only touches the fields it names.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be finite, got {value}")]
    NotFinite { field: &'static str, value: f32 },
    #[error("{field} {value} is out of range: {reason}")]
    OutOfRange {
        field: &'static str,
        value: f32,
        reason: &'static str,
    },
    #[error("total_laps must be at least 1")]
    NoLaps,
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Player flight and handling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Forward thrust (units/s²); reverse is half of this
    pub acceleration: f32,
    /// Per-tick velocity multiplier on the surface
    pub friction: f32,
    /// Per-tick velocity multiplier on the surface while drifting
    pub drift_friction: f32,
    /// Yaw rate (rad/s)
    pub turn_speed: f32,
    /// Yaw rate multiplier while drifting
    pub drift_turn_mult: f32,
    /// Bank target while drifting (radians)
    pub drift_bank: f32,
    /// Bank target per rad/s of turn rate when not drifting
    pub bank_per_turn: f32,
    /// Bank smoothing rate
    pub bank_rate: f32,
    /// Upward acceleration underwater
    pub buoyancy: f32,
    /// Extra climb from the ascend input
    pub surface_speed: f32,
    /// Downward acceleration from the dive input
    pub dive_speed: f32,
    /// Per-tick velocity multiplier underwater
    pub water_drag: f32,
    /// Downward acceleration above water
    pub gravity: f32,
    pub max_flight_energy: f32,
    /// Energy regenerated per second when not flying
    pub flight_regen: f32,
    /// Energy drained per second while flying
    pub flight_drain: f32,
    /// Hard lower bound on altitude
    pub floor_limit: f32,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            acceleration: 350.0,
            friction: 0.98,
            drift_friction: 0.99,
            turn_speed: 1.8,
            drift_turn_mult: 2.5,
            drift_bank: std::f32::consts::FRAC_PI_3,
            bank_per_turn: 0.2,
            bank_rate: 5.0,
            buoyancy: 40.0,
            surface_speed: 60.0,
            dive_speed: 80.0,
            water_drag: 0.96,
            gravity: 30.0,
            max_flight_energy: 100.0,
            flight_regen: 15.0,
            flight_drain: 30.0,
            floor_limit: -150.0,
        }
    }
}

/// AI racer parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub count: usize,
    /// Start offset of the first AI racer (t)
    pub start_t: f32,
    /// Start offset between consecutive AI racers (t)
    pub start_spacing: f32,
    pub base_speed_min: f32,
    pub base_speed_max: f32,
    /// Converts cruise speed into t per second
    pub speed_to_t: f32,
    /// Cruise multiplier for racers behind the player
    pub catch_up_mult: f32,
    /// Cruise multiplier for racers ahead of the player
    pub hold_back_mult: f32,
    pub speed_smoothing: f32,
    /// Amplitude of the sinusoidal lateral wander
    pub wander: f32,
    /// Obstacles within this distance push the lateral offset
    pub avoid_radius: f32,
    pub avoid_push: f32,
    pub follow_rate: f32,
    /// Height above the waves the AI cruises at
    pub cruise_height: f32,
    /// How far ahead (t) the AI looks when facing along the course
    pub look_ahead: f32,
    /// Altitude an AI racer resumes at after a crash
    pub resume_height: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            count: 3,
            start_t: 0.02,
            start_spacing: 0.02,
            base_speed_min: 0.35,
            base_speed_max: 0.45,
            speed_to_t: 0.04,
            catch_up_mult: 1.3,
            hold_back_mult: 0.8,
            speed_smoothing: 0.5,
            wander: 15.0,
            avoid_radius: 40.0,
            avoid_push: 50.0,
            follow_rate: 2.0,
            cruise_height: 2.0,
            look_ahead: 0.05,
            resume_height: 20.0,
        }
    }
}

/// Collision thresholds and responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Added to a decoration's radius (horizontal test)
    pub decoration_margin: f32,
    pub decoration_push: f32,
    pub decoration_damping: f32,
    /// Added to an obstacle's radius (3D test)
    pub obstacle_margin: f32,
    pub shark_radius: f32,
    pub jellyfish_radius: f32,
    pub jellyfish_push: f32,
    pub jellyfish_damping: f32,
    /// Vertical component given to the jellyfish knockback normal
    pub jellyfish_lift: f32,
    pub power_fish_radius: f32,
    pub power_fish_energy: f32,
    pub boost_radius: f32,
    pub boost_impulse: f32,
    /// Seconds from a player crash to respawn
    pub player_crash_delay: f32,
    /// Seconds an AI racer stays frozen after a crash
    pub ai_crash_delay: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            decoration_margin: 5.0,
            decoration_push: 1.5,
            decoration_damping: 0.5,
            obstacle_margin: 3.0,
            shark_radius: 8.0,
            jellyfish_radius: 7.0,
            jellyfish_push: 3.0,
            jellyfish_damping: 0.8,
            jellyfish_lift: 0.5,
            power_fish_radius: 8.0,
            power_fish_energy: 50.0,
            boost_radius: 15.0,
            boost_impulse: 300.0,
            player_crash_delay: 1.5,
            ai_crash_delay: 1.0,
        }
    }
}

/// Complete race configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub total_laps: u32,
    pub track_width: f32,
    /// Altitude the player respawns at
    pub respawn_height: f32,
    pub flight: FlightConfig,
    pub ai: AiConfig,
    pub collision: CollisionConfig,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            total_laps: 3,
            track_width: 45.0,
            respawn_height: 30.0,
            flight: FlightConfig::default(),
            ai: AiConfig::default(),
            collision: CollisionConfig::default(),
        }
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite { field, value })
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, reason: "must be > 0" })
    }
}

fn damping(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value, reason: "must be in (0, 1]" })
    }
}

impl RaceConfig {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_laps == 0 {
            return Err(ConfigError::NoLaps);
        }
        positive("track_width", self.track_width)?;
        finite("respawn_height", self.respawn_height)?;

        let f = &self.flight;
        positive("flight.acceleration", f.acceleration)?;
        damping("flight.friction", f.friction)?;
        damping("flight.drift_friction", f.drift_friction)?;
        damping("flight.water_drag", f.water_drag)?;
        positive("flight.turn_speed", f.turn_speed)?;
        positive("flight.drift_turn_mult", f.drift_turn_mult)?;
        finite("flight.drift_bank", f.drift_bank)?;
        finite("flight.bank_per_turn", f.bank_per_turn)?;
        positive("flight.bank_rate", f.bank_rate)?;
        positive("flight.buoyancy", f.buoyancy)?;
        finite("flight.surface_speed", f.surface_speed)?;
        finite("flight.dive_speed", f.dive_speed)?;
        positive("flight.gravity", f.gravity)?;
        positive("flight.max_flight_energy", f.max_flight_energy)?;
        positive("flight.flight_regen", f.flight_regen)?;
        positive("flight.flight_drain", f.flight_drain)?;
        finite("flight.floor_limit", f.floor_limit)?;
        if self.respawn_height <= f.floor_limit {
            return Err(ConfigError::OutOfRange {
                field: "respawn_height",
                value: self.respawn_height,
                reason: "must be above flight.floor_limit",
            });
        }

        let a = &self.ai;
        finite("ai.start_t", a.start_t)?;
        finite("ai.start_spacing", a.start_spacing)?;
        positive("ai.base_speed_min", a.base_speed_min)?;
        positive("ai.base_speed_max", a.base_speed_max)?;
        if a.base_speed_max < a.base_speed_min {
            return Err(ConfigError::OutOfRange {
                field: "ai.base_speed_max",
                value: a.base_speed_max,
                reason: "must be >= ai.base_speed_min",
            });
        }
        positive("ai.speed_to_t", a.speed_to_t)?;
        positive("ai.catch_up_mult", a.catch_up_mult)?;
        positive("ai.hold_back_mult", a.hold_back_mult)?;
        positive("ai.speed_smoothing", a.speed_smoothing)?;
        finite("ai.wander", a.wander)?;
        finite("ai.avoid_radius", a.avoid_radius)?;
        finite("ai.avoid_push", a.avoid_push)?;
        positive("ai.follow_rate", a.follow_rate)?;
        finite("ai.cruise_height", a.cruise_height)?;
        positive("ai.look_ahead", a.look_ahead)?;
        finite("ai.resume_height", a.resume_height)?;

        let c = &self.collision;
        finite("collision.decoration_margin", c.decoration_margin)?;
        finite("collision.decoration_push", c.decoration_push)?;
        damping("collision.decoration_damping", c.decoration_damping)?;
        finite("collision.obstacle_margin", c.obstacle_margin)?;
        positive("collision.shark_radius", c.shark_radius)?;
        positive("collision.jellyfish_radius", c.jellyfish_radius)?;
        finite("collision.jellyfish_push", c.jellyfish_push)?;
        damping("collision.jellyfish_damping", c.jellyfish_damping)?;
        finite("collision.jellyfish_lift", c.jellyfish_lift)?;
        positive("collision.power_fish_radius", c.power_fish_radius)?;
        finite("collision.power_fish_energy", c.power_fish_energy)?;
        positive("collision.boost_radius", c.boost_radius)?;
        finite("collision.boost_impulse", c.boost_impulse)?;
        positive("collision.player_crash_delay", c.player_crash_delay)?;
        positive("collision.ai_crash_delay", c.ai_crash_delay)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RaceConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = RaceConfig::from_json(r#"{"total_laps": 5, "flight": {"gravity": 20.0}}"#)
            .expect("valid override");
        assert_eq!(config.total_laps, 5);
        assert_eq!(config.flight.gravity, 20.0);
        assert_eq!(config.flight.acceleration, 350.0);
        assert_eq!(config.ai.count, 3);
    }

    #[test]
    fn zero_laps_invalid() {
        let mut config = RaceConfig::default();
        config.total_laps = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoLaps)));
    }

    #[test]
    fn drag_above_one_invalid() {
        let mut config = RaceConfig::default();
        config.flight.water_drag = 1.2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { field: "flight.water_drag", .. })
        ));
    }

    #[test]
    fn nan_rejected() {
        let mut config = RaceConfig::default();
        config.collision.boost_impulse = f32::NAN;
        assert!(matches!(config.validate(), Err(ConfigError::NotFinite { .. })));
    }

    #[test]
    fn malformed_json_rejected() {
        assert!(matches!(
            RaceConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }
}
