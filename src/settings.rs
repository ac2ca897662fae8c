//! Player settings: the setup selection
//!
//! Persisted separately from high scores, in LocalStorage on wasm32 and a JSON
//! file natively.

use serde::{Deserialize, Serialize};

use crate::difficulty::{Difficulty, DifficultyConfig};
use crate::error::{ConfigError, SettingsError};
use crate::games::GameKind;
use crate::numeral::NumeralBase;
use crate::sim::SessionSetup;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Numeral base questions are asked in
    pub base: NumeralBase,
    pub difficulty: Difficulty,
    /// Last game played
    pub game: GameKind,
    /// Fixed seed for reproducible runs; fresh entropy when unset
    pub seed: Option<u64>,

    // === Demo ===
    /// Autopilot answer accuracy (0.0 - 1.0)
    pub autopilot_accuracy: f32,
    /// Autopilot delay between answers
    pub autopilot_reaction_ms: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base: NumeralBase::Binary,
            difficulty: Difficulty::Easy,
            game: GameKind::FallingNumbers,
            seed: None,
            autopilot_accuracy: 0.85,
            autopilot_reaction_ms: 600.0,
        }
    }
}

impl Settings {
    /// Validated difficulty snapshot for a new session
    pub fn session_config(&self) -> Result<DifficultyConfig, ConfigError> {
        let config = self.difficulty.config();
        config.validate()?;
        Ok(config)
    }

    /// Setup for the selected game
    pub fn setup(&self) -> SessionSetup {
        self.game.setup(self.base, self.difficulty)
    }

    /// Seed to run with: the fixed one, else fresh entropy
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.session_config()?;
        Ok(settings)
    }

    /// Load settings from a JSON file; a missing file yields the defaults
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: &std::path::Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), SettingsError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "base_arcade_settings";

    /// Load settings from LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {e}"),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }
}
