//! Presentation preferences
//!
//! Nothing here affects the simulation. The page hands these over as JSON.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    /// Particles queued per frame
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 30,
            QualityPreset::Medium => 120,
            QualityPreset::High => 400,
        }
    }

    /// Whether the detailed dolphin model is worth loading
    pub fn detailed_models(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Splash, spark and bubble bursts
    pub particles: bool,
    /// Loaded dolphin mesh instead of the primitive placeholder
    pub detailed_dolphins: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// One-shot effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Rotor, turbine and drift volume (0.0 - 1.0)
    pub engine_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            particles: true,
            detailed_dolphins: true,

            show_fps: false,

            master_volume: 0.5,
            sfx_volume: 1.0,
            engine_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        if !preset.detailed_models() {
            self.detailed_dolphins = false;
        }
    }

    /// Parse settings sent by the page; missing fields keep defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.clamp_volumes();
        Ok(settings)
    }

    fn clamp_volumes(&mut self) {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.engine_volume = self.engine_volume.clamp(0.0, 1.0);
    }

    /// Effective one-shot volume
    pub fn effect_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume * self.sfx_volume }
    }

    /// Effective continuous engine volume
    pub fn continuous_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume * self.engine_volume }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Draw the detailed dolphin when it has loaded
    pub fn wants_detailed_dolphins(&self) -> bool {
        self.detailed_dolphins && self.quality.detailed_models()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings = Settings::from_json(r#"{"muted": true, "master_volume": 3.0}"#).unwrap();
        assert!(settings.muted);
        assert_eq!(settings.master_volume, 1.0);
        assert_eq!(settings.quality, QualityPreset::Medium);
        assert_eq!(settings.effect_volume(), 0.0);
        assert_eq!(settings.continuous_volume(), 0.0);
        assert!(Settings::from_json("not json").is_err());
    }

    #[test]
    fn test_volumes() {
        let settings = Settings { master_volume: 0.5, sfx_volume: 0.4, engine_volume: 0.2, ..Default::default() };
        assert!((settings.effect_volume() - 0.2).abs() < 1e-6);
        assert!((settings.continuous_volume() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_presets() {
        let low = Settings::from_preset(QualityPreset::Low);
        assert!(!low.wants_detailed_dolphins());
        assert_eq!(low.max_particles(), 30);
        assert!(Settings::from_preset(QualityPreset::High).wants_detailed_dolphins());

        let off = Settings { particles: false, ..Default::default() };
        assert_eq!(off.max_particles(), 0);

        // Presets arrive by variant name in the settings JSON
        let high = Settings::from_json(r#"{"quality": "High"}"#).unwrap();
        assert_eq!(high.quality, QualityPreset::High);
        assert!(Settings::from_json(r#"{"quality": "Ultra"}"#).is_err());
    }
}
