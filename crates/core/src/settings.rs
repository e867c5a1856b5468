//! User settings persistence.
//!
//! This module handles loading and saving user preferences: model overrides,
//! default scene parameters, brush size and an optional API key.

use crate::config::{Config, CredentialProvider};
use crate::error::{AppError, Result};
use crate::generation::GenerationParams;
use crate::mask::stroke::{clamp_brush_size, DEFAULT_BRUSH_SIZE};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// User-configurable settings persisted between sessions.
///
/// Settings are stored as JSON in the user's config directory
/// (e.g., `~/.config/archsketch/settings.json` on Linux).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Text model override; empty means use the configured default.
    #[serde(default)]
    pub text_model: String,
    /// Image model override; empty means use the configured default.
    #[serde(default)]
    pub image_model: String,
    /// Scene parameters preselected in the UI.
    #[serde(default)]
    pub params: GenerationParams,
    /// Display-space brush size for the mask canvas.
    #[serde(default = "default_brush_size")]
    pub brush_size: f32,
    /// API key override (takes precedence over environment).
    #[serde(default)]
    pub api_key: String,
}

fn default_brush_size() -> f32 {
    DEFAULT_BRUSH_SIZE
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_model: String::new(),
            image_model: String::new(),
            params: GenerationParams::default(),
            brush_size: DEFAULT_BRUSH_SIZE,
            api_key: String::new(),
        }
    }
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "archsketch", "archsketch").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from the default location, falling back to defaults if
    /// the file is missing or unreadable.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .ok()
            .and_then(|content| match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => Some(settings),
                Err(e) => {
                    log::warn!("ignoring corrupt settings file {}: {}", path.display(), e);
                    None
                }
            })
            .map(Settings::sanitized)
            .unwrap_or_default()
    }

    /// Persists settings to the default location.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            self.save_to(&path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Returns whether an API key is stored here (otherwise the environment is used).
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Applies the model overrides on top of `config`.
    pub fn apply_to(&self, config: &mut Config) {
        if !self.text_model.trim().is_empty() {
            config.text_model = self.text_model.trim().to_string();
        }
        if !self.image_model.trim().is_empty() {
            config.image_model = self.image_model.trim().to_string();
        }
    }

    fn sanitized(mut self) -> Self {
        self.brush_size = clamp_brush_size(self.brush_size);
        self
    }
}

impl CredentialProvider for Settings {
    fn api_key(&self) -> Result<String> {
        if self.has_api_key() {
            Ok(self.api_key.trim().to_string())
        } else {
            Err(AppError::config("no API key stored in settings"))
        }
    }
}
