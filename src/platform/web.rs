//! Browser bridge
//!
//! The page owns the animation loop, input and GPU context. Each display frame
//! it calls `frame(dt, inputBits, now)` and reads back JSON.

use std::sync::Once;

use wasm_bindgen::prelude::*;

use super::{Session, start_race};
use crate::audio::AudioManager;
use crate::renderer::water_shader_source;
use crate::settings::Settings;
use crate::sim::TickInput;

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }
    });
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_settings(json: Option<String>) -> Result<Settings, JsValue> {
    match json {
        Some(json) if !json.trim().is_empty() => Settings::from_json(&json).map_err(js_err),
        _ => Ok(Settings::default()),
    }
}

/// One race running in the page
#[wasm_bindgen]
pub struct WebRace {
    session: Session<AudioManager>,
}

#[wasm_bindgen]
impl WebRace {
    /// `seed` 0 picks one from the clock
    #[wasm_bindgen(constructor)]
    pub fn new(
        seed: f64,
        config_json: Option<String>,
        settings_json: Option<String>,
    ) -> Result<WebRace, JsValue> {
        init_logging();
        let seed = if seed > 0.0 { seed as u64 } else { js_sys::Date::now() as u64 };
        let race = start_race(config_json.as_deref(), seed).map_err(js_err)?;
        let settings = parse_settings(settings_json)?;
        let audio = AudioManager::new(&settings);
        Ok(WebRace { session: Session::new(race, settings, audio) })
    }

    /// Advance one frame; returns the HUD telemetry as JSON
    pub fn frame(&mut self, dt: f32, input_bits: u8, now_ms: f64) -> Result<String, JsValue> {
        let input = TickInput::from_bits(input_bits);
        let report = self.session.frame_report(dt, &input, now_ms);
        if report.telemetry.race_over {
            self.session.audio_mut().stop_engine();
        }
        serde_json::to_string(&report).map_err(js_err)
    }

    /// Poses for every visible entity plus the camera, as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.snapshot()).map_err(js_err)
    }

    /// Particle bursts queued since the last call, as JSON
    #[wasm_bindgen(js_name = drainParticles)]
    pub fn drain_particles(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_particles()).map_err(js_err)
    }

    pub fn restart(&mut self) {
        self.session.restart();
        self.session.audio_mut().restart_engine();
    }

    /// Water uniform block bytes for the current frame
    #[wasm_bindgen(js_name = waterUniforms)]
    pub fn water_uniforms(&self, aspect: f32) -> Vec<u8> {
        bytemuck::bytes_of(&self.session.water_uniforms(aspect)).to_vec()
    }

    /// WGSL for the water surface
    #[wasm_bindgen(js_name = waterShader)]
    pub fn water_shader() -> String {
        water_shader_source()
    }

    #[wasm_bindgen(js_name = dolphinModelLoaded)]
    pub fn dolphin_model_loaded(&mut self) {
        self.session.assets.dolphin.mark_ready("dolphin");
    }

    #[wasm_bindgen(js_name = dolphinModelFailed)]
    pub fn dolphin_model_failed(&mut self, reason: &str) {
        self.session.assets.dolphin.mark_failed("dolphin", reason);
    }

    #[wasm_bindgen(js_name = setSettings)]
    pub fn set_settings(&mut self, settings_json: &str) -> Result<(), JsValue> {
        let settings = Settings::from_json(settings_json).map_err(js_err)?;
        self.session.audio_mut().apply_settings(&settings);
        self.session.apply_settings(settings);
        Ok(())
    }

    /// Call from a user gesture so the browser lets audio start
    #[wasm_bindgen(js_name = resumeAudio)]
    pub fn resume_audio(&self) {
        self.session.audio().resume();
    }
}
