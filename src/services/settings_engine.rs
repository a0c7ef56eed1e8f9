// gemmarks settings engine
// Loads, saves, and edits `settings.json`. Individual values are addressed
// with dot-separated keys such as `network.request_timeout_secs`.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn get_value(&self, key: &str) -> Result<Value, SettingsError>;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as pretty-printed JSON.
pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates an engine for `path_override`, or for `settings.json` in the
    /// platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string()
        });

        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    fn to_json(&self) -> Result<Value, SettingsError> {
        serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })
    }
}

/// Converts `a.b.c` into the JSON pointer `/a/b/c`.
fn key_pointer(key: &str) -> Result<String, SettingsError> {
    if key.is_empty() {
        return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
    }
    if key.split('.').any(str::is_empty) {
        return Err(SettingsError::InvalidKey(format!(
            "Key '{}' has an empty segment",
            key
        )));
    }
    Ok(format!("/{}", key.replace('.', "/")))
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from disk. A missing file yields the defaults; a
    /// malformed one is an error and leaves the current settings untouched.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        self.settings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Returns the value at a dot-separated key; a section key returns the
    /// whole section object.
    fn get_value(&self, key: &str) -> Result<Value, SettingsError> {
        let pointer = key_pointer(key)?;
        self.to_json()?
            .pointer(&pointer)
            .cloned()
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))
    }

    /// Replaces one value, validates the result against `AppSettings`, and
    /// saves. Only existing keys can be set.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let pointer = key_pointer(key)?;
        let mut json = self.to_json()?;

        match json.pointer_mut(&pointer) {
            Some(slot) => *slot = value,
            None => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )))
            }
        }

        self.settings = serde_json::from_value(json).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        self.save()
    }

    /// Resets all settings to defaults and saves.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
