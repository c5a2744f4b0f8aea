//! Browser bindings
//!
//! The page owns the animation loop: it calls `advance` with the elapsed
//! milliseconds each frame and redraws from the returned JSON events.

use wasm_bindgen::prelude::*;

use crate::error::GameError;
use crate::geometry::Side;
use crate::session::{FrameClock, Session};
use crate::settings::GameConfig;

fn to_js(error: GameError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

/// A session driven from JavaScript
#[wasm_bindgen]
pub struct WebSession {
    session: Session,
    clock: FrameClock,
}

#[wasm_bindgen]
impl WebSession {
    /// Start a session from the stored config, seeded from the wall clock
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<WebSession, JsValue> {
        console_error_panic_hook::set_once();
        // A second session on the same page finds the logger already installed
        let _ = console_log::init_with_level(log::Level::Info);

        let seed = js_sys::Date::now() as u64;
        let session = Session::new(GameConfig::load(), seed)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        log::info!("Orbit Wager starting (seed {})", seed);
        Ok(WebSession {
            session,
            clock: FrameClock::new(),
        })
    }

    /// Move time forward by a frame delta; returns the events emitted as a JSON array
    pub fn advance(&mut self, elapsed_ms: f64) -> Result<String, JsValue> {
        let whole_ms = self.clock.take(elapsed_ms);
        self.session.advance(whole_ms);
        self.drain_events()
    }

    /// Pending events as a JSON array
    pub fn drain_events(&mut self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.drain_events())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn start_round(&mut self) -> Result<(), JsValue> {
        self.session.start_round().map_err(to_js)
    }

    pub fn start_batch(&mut self, count: u32) -> Result<(), JsValue> {
        self.session.start_batch(count).map_err(to_js)
    }

    pub fn cancel_batch(&mut self) -> bool {
        self.session.cancel_batch()
    }

    pub fn stage_chip(&mut self, value: u32) -> Result<(), JsValue> {
        self.session.stage_chip(u64::from(value)).map_err(to_js)
    }

    pub fn clear_staged_bet(&mut self) -> Result<(), JsValue> {
        self.session.clear_staged_bet().map_err(to_js)
    }

    /// `"in"`, `"out"`, or anything else to clear the side
    pub fn select_bet_type(&mut self, side: &str) -> Result<(), JsValue> {
        self.session
            .select_bet_type(Side::from_str(side))
            .map_err(to_js)
    }

    pub fn reset_bankroll(&mut self) -> Result<(), JsValue> {
        self.session.reset_bankroll().map_err(to_js)
    }

    pub fn bankroll(&self) -> f64 {
        self.session.bankroll() as f64
    }

    pub fn staged(&self) -> f64 {
        self.session.wager().staged as f64
    }

    /// `"in"`, `"out"`, or empty
    pub fn bet_type(&self) -> String {
        self.session
            .wager()
            .side
            .map(|s| s.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn is_betting_locked(&self) -> bool {
        self.session.is_betting_locked()
    }

    pub fn is_bankrupt(&self) -> bool {
        self.session.is_bankrupt()
    }

    /// Chip denominations from the config
    pub fn chips(&self) -> Vec<f64> {
        self.session.config().chips.iter().map(|&c| c as f64).collect()
    }

    pub fn orbit_radius(&self) -> f64 {
        self.session.config().orbit_radius
    }

    /// Persist the active config to LocalStorage
    pub fn save_config(&self) {
        self.session.config().save();
    }

    /// Summary of settled rounds as JSON
    pub fn summary(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.session.history().summary())
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
