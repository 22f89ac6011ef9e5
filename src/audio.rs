//! Audio system using Web Audio API
//!
//! Procedurally generated sound effects - no external files needed!
//! One-shots for crashes, splashes and lap chimes, plus a continuous
//! rotor/turbine engine and a drift squeal driven every frame.

use web_sys::{
    AudioBuffer, AudioContext, BiquadFilterNode, BiquadFilterType, GainNode, OscillatorNode,
    OscillatorType,
};

use crate::services::AudioService;
use crate::settings::Settings;
use crate::sim::SoundEffect;

/// Long-running engine voices
struct Engine {
    /// Low square "chop" whose gain is pumped by `rotor_lfo`
    rotor: OscillatorNode,
    rotor_lfo: OscillatorNode,
    rotor_gain: GainNode,
    turbine: OscillatorNode,
    turbine_gain: GainNode,
    drift: OscillatorNode,
    drift_gain: GainNode,
}

/// Audio manager for the race
pub struct AudioManager {
    ctx: Option<AudioContext>,
    engine: Option<Engine>,
    /// Engine stays silent until `restart_engine`
    engine_stopped: bool,
    effect_volume: f32,
    continuous_volume: f32,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // Try to create audio context (may fail if not in secure context)
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            engine: None,
            engine_stopped: false,
            effect_volume: settings.effect_volume(),
            continuous_volume: settings.continuous_volume(),
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.effect_volume = settings.effect_volume();
        self.continuous_volume = settings.continuous_volume();
    }

    /// Silence the engine (race over, page hidden)
    pub fn stop_engine(&mut self) {
        self.engine_stopped = true;
        if let Some(engine) = self.engine.take() {
            for osc in [&engine.rotor, &engine.rotor_lfo, &engine.turbine, &engine.drift] {
                osc.stop().ok();
            }
        }
    }

    /// Let the engine start again on the next update
    pub fn restart_engine(&mut self) {
        self.engine_stopped = false;
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effect_volume;
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Crash => self.play_crash(ctx, vol),
            SoundEffect::Splash => self.play_splash(ctx, vol),
            SoundEffect::LapComplete => self.play_lap_chime(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// White noise buffer of `seconds` length
    fn noise_buffer(&self, ctx: &AudioContext, seconds: f32) -> Option<AudioBuffer> {
        let rate = ctx.sample_rate();
        let len = (rate * seconds) as u32;
        let buffer = ctx.create_buffer(1, len, rate).ok()?;
        let samples: Vec<f32> = (0..len).map(|_| rand::random_range(-1.0..1.0)).collect();
        buffer.copy_to_channel(&samples, 0).ok()?;
        Some(buffer)
    }

    /// Noise through a low-pass filter into a gain envelope
    fn create_noise(
        &self,
        ctx: &AudioContext,
        seconds: f32,
        cutoff: f32,
    ) -> Option<(web_sys::AudioBufferSourceNode, BiquadFilterNode, GainNode)> {
        let buffer = self.noise_buffer(ctx, seconds)?;
        let source = ctx.create_buffer_source().ok()?;
        source.set_buffer(Some(&buffer));

        let filter = ctx.create_biquad_filter().ok()?;
        filter.set_type(BiquadFilterType::Lowpass);
        filter.frequency().set_value(cutoff);

        let gain = ctx.create_gain().ok()?;
        source.connect_with_audio_node(&filter).ok()?;
        filter.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((source, filter, gain))
    }

    /// Crash - short burst of static with a low thud
    fn play_crash(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((source, _filter, gain)) = self.create_noise(ctx, 0.3, 4000.0) {
            gain.gain().set_value_at_time(vol * 0.7, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                .ok();
            source.start().ok();
            source.stop_with_when(t + 0.3).ok();
        }

        if let Some((osc, gain)) = self.create_osc(ctx, 90.0, OscillatorType::Sine) {
            gain.gain().set_value_at_time(vol * 0.4, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(40.0, t + 0.25)
                .ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }
    }

    /// Splash - falling filtered noise
    fn play_splash(&self, ctx: &AudioContext, vol: f32) {
        let Some((source, filter, gain)) = self.create_noise(ctx, 1.0, 600.0) else {
            return;
        };
        let t = ctx.current_time();

        filter.frequency().set_value_at_time(600.0, t).ok();
        filter
            .frequency()
            .exponential_ramp_to_value_at_time(100.0, t + 1.0)
            .ok();
        gain.gain().set_value_at_time(vol * 0.8, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + 1.0)
            .ok();

        source.start().ok();
        source.stop_with_when(t + 1.0).ok();
    }

    /// Lap complete - octave chime
    fn play_lap_chime(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 880.0, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain().linear_ramp_to_value_at_time(0.01, t + 0.6).ok();
        osc.frequency().set_value_at_time(880.0, t).ok();
        osc.frequency().set_value_at_time(1760.0, t + 0.1).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.6).ok();
    }

    /// Start the engine voices silent; `update_engine` drives them
    fn start_engine(&self, ctx: &AudioContext) -> Option<Engine> {
        let (rotor, rotor_gain) = self.create_osc(ctx, 150.0, OscillatorType::Square)?;
        rotor_gain.gain().set_value(0.0);

        // LFO pumps the rotor gain for the chop
        let rotor_lfo = ctx.create_oscillator().ok()?;
        rotor_lfo.set_type(OscillatorType::Sine);
        rotor_lfo.frequency().set_value(5.0);
        rotor_lfo
            .connect_with_audio_param(&rotor_gain.gain())
            .ok()?;

        let (turbine, turbine_gain) = self.create_osc(ctx, 800.0, OscillatorType::Sawtooth)?;
        turbine_gain.gain().set_value(0.0);

        let (drift, drift_gain) = self.create_osc(ctx, 1200.0, OscillatorType::Triangle)?;
        drift_gain.gain().set_value(0.0);

        for osc in [&rotor, &rotor_lfo, &turbine, &drift] {
            osc.start().ok()?;
        }
        log::debug!("Engine audio started");

        Some(Engine {
            rotor,
            rotor_lfo,
            rotor_gain,
            turbine,
            turbine_gain,
            drift,
            drift_gain,
        })
    }

    fn update_engine(&mut self, speed_ratio: f32, drifting: bool) {
        let Some(ctx) = &self.ctx else { return };
        if self.engine_stopped || ctx.state() != web_sys::AudioContextState::Running {
            return;
        }
        if self.engine.is_none() {
            self.engine = self.start_engine(ctx);
        }
        let Some(engine) = &self.engine else { return };

        let t = ctx.current_time();
        let vol = self.continuous_volume;
        let ratio = speed_ratio.clamp(0.0, 1.0);

        engine
            .rotor_lfo
            .frequency()
            .set_target_at_time(5.0 + 8.0 * ratio, t, 0.1)
            .ok();
        engine
            .rotor
            .frequency()
            .set_target_at_time(150.0 + 100.0 * ratio, t, 0.1)
            .ok();
        engine
            .rotor_gain
            .gain()
            .set_target_at_time(vol * 0.25, t, 0.1)
            .ok();

        engine
            .turbine
            .frequency()
            .set_target_at_time(800.0 + 400.0 * ratio, t, 0.1)
            .ok();
        engine
            .turbine_gain
            .gain()
            .set_target_at_time(vol * 0.05 * (0.3 + ratio), t, 0.1)
            .ok();

        let drift = if drifting { vol * 0.4 } else { 0.0 };
        engine.drift_gain.gain().set_target_at_time(drift, t, 0.2).ok();
    }
}

impl AudioService for AudioManager {
    fn play_effect(&mut self, effect: SoundEffect) {
        self.play(effect);
    }

    fn update_continuous(&mut self, speed_ratio: f32, drifting: bool) {
        self.update_engine(speed_ratio, drifting);
    }
}
