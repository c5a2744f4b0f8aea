//! Game configuration
//!
//! Loaded from LocalStorage on the web and from a JSON file on native.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ledger::Odds;

/// Countdown pace presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Pace {
    /// 5 second rounds
    Quick,
    /// 10 second rounds
    #[default]
    Standard,
}

impl Pace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pace::Quick => "Quick",
            Pace::Standard => "Standard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "quick" | "fast" => Some(Pace::Quick),
            "standard" | "std" => Some(Pace::Standard),
            _ => None,
        }
    }

    /// Countdown length for this preset
    pub fn countdown_ms(&self) -> u64 {
        match self {
            Pace::Quick => 5_000,
            Pace::Standard => 10_000,
        }
    }

    /// Pause between batched rounds
    pub fn batch_pause_ms(&self) -> u64 {
        match self {
            Pace::Quick => 500,
            Pace::Standard => 1_000,
        }
    }
}

/// Game configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Countdown pace preset
    pub pace: Pace,

    // === Round ===
    /// Round countdown length (ms)
    pub countdown_ms: u64,
    /// Slowest dot speed (radians/sec, must be > 0)
    pub min_speed: f64,
    /// Fastest dot speed (radians/sec)
    pub max_speed: f64,
    /// Orbit radius used for cartesian positions and edge proximity
    pub orbit_radius: f64,

    // === Batch ===
    /// Pause after each settlement before the next batched round (ms)
    pub batch_pause_ms: u64,
    /// Largest accepted batch
    pub max_batch: u32,

    // === Money ===
    /// Bankroll at session start and after a reset
    pub starting_bankroll: u64,
    /// Chip denominations offered to the player
    pub chips: Vec<u64>,
    /// Payout multipliers per side
    pub odds: Odds,
}

impl Default for GameConfig {
    fn default() -> Self {
        let pace = Pace::Standard;
        Self {
            pace,

            countdown_ms: pace.countdown_ms(),
            min_speed: 0.6,
            max_speed: 3.0,
            orbit_radius: 150.0,

            batch_pause_ms: pace.batch_pause_ms(),
            max_batch: 100,

            starting_bankroll: 1_000,
            chips: vec![1, 5, 10, 25, 100],
            odds: Odds::default(),
        }
    }
}

impl GameConfig {
    /// Create a config from a pace preset (applies preset defaults)
    pub fn from_preset(pace: Pace) -> Self {
        let mut config = Self::default();
        config.apply_preset(pace);
        config
    }

    /// Apply a pace preset (updates pace-dependent timings)
    pub fn apply_preset(&mut self, pace: Pace) {
        self.pace = pace;
        self.countdown_ms = pace.countdown_ms();
        self.batch_pause_ms = pace.batch_pause_ms();
    }

    /// Reject values the round engine and ledger cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.countdown_ms == 0 {
            return Err(ConfigError::Invalid("countdown_ms must be positive".into()));
        }
        if !(self.min_speed > 0.0) || !self.max_speed.is_finite() {
            return Err(ConfigError::Invalid(
                "dot speeds must be positive and finite".into(),
            ));
        }
        if self.min_speed > self.max_speed {
            return Err(ConfigError::Invalid(format!(
                "min_speed {} exceeds max_speed {}",
                self.min_speed, self.max_speed
            )));
        }
        if !(self.orbit_radius > 0.0) {
            return Err(ConfigError::Invalid("orbit_radius must be positive".into()));
        }
        if self.max_batch == 0 {
            return Err(ConfigError::Invalid("max_batch must be at least 1".into()));
        }
        if self.chips.contains(&0) {
            return Err(ConfigError::Invalid("chip values must be positive".into()));
        }
        if self.odds.in_hundredths == 0 || self.odds.out_hundredths == 0 {
            return Err(ConfigError::Invalid("odds must be positive".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON config; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "orbit_wager_config";

    /// Environment variable naming a JSON config file (native)
    pub const CONFIG_ENV: &'static str = "ORBIT_WAGER_CONFIG";

    /// Load config from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {e}"),
                }
            }
        }

        log::info!("Using default config");
        Self::default()
    }

    /// Serialize for storage; `from_json` reads it back
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Save config to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
        else {
            log::warn!("LocalStorage unavailable, config not saved");
            return;
        };

        match self.to_json() {
            Ok(json) => match storage.set_item(Self::STORAGE_KEY, &json) {
                Ok(()) => log::info!("Config saved ({} pace)", self.pace.as_str()),
                Err(_) => log::warn!("LocalStorage rejected the config"),
            },
            Err(e) => log::warn!("Config not saved: {e}"),
        }
    }

    /// Load config from the file named by `ORBIT_WAGER_CONFIG` (native)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(Self::CONFIG_ENV) {
            Ok(path) => {
                let json = std::fs::read_to_string(&path)?;
                let config = Self::from_json(&json)?;
                log::info!("Loaded config from {path}");
                Ok(config)
            }
            Err(_) => {
                log::info!("Using default config");
                Ok(Self::default())
            }
        }
    }
}
