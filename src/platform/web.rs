//! Browser bridge
//!
//! The page owns the canvas, menus and key capture. Each animation frame it
//! hands over the latest input and the `requestAnimationFrame` timestamp, and
//! gets back the tick's events plus a snapshot to draw, as JSON.

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::sim::{FrameClock, GameEvent, GameSession, InputState, Snapshot, tick};
use crate::tuning::{DifficultyPreset, Tuning, WaveMode};

#[derive(Serialize)]
struct FrameReport {
    events: Vec<GameEvent>,
    snapshot: Snapshot,
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebSession {
    session: GameSession,
    clock: FrameClock,
    input: InputState,
}

#[wasm_bindgen]
impl WebSession {
    /// `preset` is a difficulty name; `floors` picks the dungeon layout
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64, preset: &str, floors: bool) -> Result<WebSession, JsValue> {
        let preset = DifficultyPreset::parse(preset).unwrap_or_default();
        let base = if floors { Tuning::dungeon() } else { Tuning::obelisk() };
        Self::with_tuning(seed, base.with_preset(preset))
    }

    /// Seed from the wall clock
    pub fn random(preset: &str, floors: bool) -> Result<WebSession, JsValue> {
        let seed = js_sys::Date::now() as u64;
        Self::new(seed, preset, floors)
    }

    /// Custom balance sheet as JSON
    #[wasm_bindgen(js_name = fromTuning)]
    pub fn from_tuning(seed: u64, json: &str) -> Result<WebSession, JsValue> {
        let tuning = Tuning::from_json(json).map_err(to_js)?;
        Self::with_tuning(seed, tuning)
    }

    fn with_tuning(seed: u64, tuning: Tuning) -> Result<WebSession, JsValue> {
        crate::platform::init_logging(log::Level::Info);
        let clock = FrameClock::new(tuning.frame.max_delta_ms);
        let session = GameSession::new(seed, tuning).map_err(to_js)?;
        log::info!(
            "Web session ready ({})",
            match session.tuning().mode {
                WaveMode::Stream => "stream",
                WaveMode::Floors => "floors",
            }
        );
        Ok(WebSession {
            session,
            clock,
            input: InputState::default(),
        })
    }

    pub fn start(&mut self) {
        self.clock.reset();
        self.session.start();
    }

    pub fn pause(&mut self) {
        self.session.pause();
    }

    pub fn resume(&mut self) {
        // Time spent paused must not reach the next tick
        self.clock.reset();
        self.session.resume();
    }

    /// Latest input as JSON (`InputState` fields, all optional)
    #[wasm_bindgen(js_name = setInput)]
    pub fn set_input(&mut self, json: &str) -> Result<(), JsValue> {
        self.input = serde_json::from_str(json).map_err(to_js)?;
        Ok(())
    }

    /// Advance to `now_ms` and report what happened
    pub fn frame(&mut self, now_ms: f64) -> Result<String, JsValue> {
        let events = if self.session.is_over() {
            Vec::new()
        } else {
            let delta = self.clock.delta(now_ms);
            let events = tick(&mut self.session, &self.input, delta);
            // The pause toggle is one-shot
            self.input.pause = false;
            events
        };
        let report = FrameReport {
            events,
            snapshot: self.session.snapshot(),
        };
        serde_json::to_string(&report).map_err(to_js)
    }

    #[wasm_bindgen(js_name = isOver)]
    pub fn is_over(&self) -> bool {
        self.session.is_over()
    }

    /// Score for the high-score table once the run has ended
    #[wasm_bindgen(js_name = finalLevel)]
    pub fn final_level(&self) -> Option<u32> {
        self.session.outcome().map(|o| o.final_level)
    }
}
