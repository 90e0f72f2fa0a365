// MarkVault Settings Engine
// Manages engine settings: loading, saving, updating individual values, and resetting to defaults.
// Settings are stored as a JSON file; a few fields can be overridden from the environment.

use std::fs;
use std::path::Path;

use crate::types::errors::SettingsError;
use crate::types::settings::EngineSettings;

/// Prefix for every environment variable the engine reads.
pub const ENV_PREFIX: &str = "MARKVAULT";

/// Config file used when `MARKVAULT_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "markvault.json";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<EngineSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &EngineSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: EngineSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise uses `MARKVAULT_CONFIG`, falling back to `markvault.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .or_else(|| std::env::var(format!("{}_CONFIG", ENV_PREFIX)).ok())
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        Self {
            config_path,
            settings: EngineSettings::default(),
        }
    }

    /// Applies `MARKVAULT_DB_PATH` and `MARKVAULT_LOG` on top of the loaded file.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DB_PATH", ENV_PREFIX)) {
            if !val.is_empty() {
                self.settings.database_path = val;
            }
        }
        if let Ok(val) = std::env::var(format!("{}_LOG", ENV_PREFIX)) {
            if !val.is_empty() {
                self.settings.log_filter = val;
            }
        }
    }
}

/// Rejects settings the query engine cannot work with.
fn validate(settings: &EngineSettings) -> Result<(), SettingsError> {
    let query = &settings.query;
    if query.max_page_size == 0 {
        return Err(SettingsError::InvalidValue("query.max_page_size must be positive".to_string()));
    }
    if query.default_page_size == 0 || query.default_page_size > query.max_page_size {
        return Err(SettingsError::InvalidValue(format!(
            "query.default_page_size must be between 1 and {}",
            query.max_page_size
        )));
    }
    if query.export_batch_size == 0 {
        return Err(SettingsError::InvalidValue("query.export_batch_size must be positive".to_string()));
    }
    if settings.database_path.is_empty() {
        return Err(SettingsError::InvalidValue("database_path cannot be empty".to_string()));
    }
    Ok(())
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<EngineSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        self.settings = if path.exists() {
            let content = fs::read_to_string(path)
                .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
            let settings: EngineSettings = serde_json::from_str(&content).map_err(|e| {
                SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
            })?;
            validate(&settings)?;
            settings
        } else {
            EngineSettings::default()
        };

        self.apply_env_overrides();
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path.
    ///
    /// The current settings are converted to a `serde_json::Value`, the key
    /// path is walked and replaced, and the result is deserialized back into
    /// `EngineSettings` and validated before it is saved.
    ///
    /// # Examples
    /// - `"log_filter"` → updates `settings.log_filter`
    /// - `"query.max_page_size"` → updates `settings.query.max_page_size`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                if i == parts.len() - 1 {
                    match current {
                        serde_json::Value::Object(map) => {
                            if !map.contains_key(*part) {
                                return Err(SettingsError::InvalidKey(format!(
                                    "Key '{}' not found in settings",
                                    key
                                )));
                            }
                            map.insert(part.to_string(), value.clone());
                        }
                        _ => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Cannot navigate to key '{}': intermediate value is not an object",
                                key
                            )));
                        }
                    }
                } else {
                    current = match current.get_mut(*part) {
                        Some(v) => v,
                        None => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Key '{}' not found in settings",
                                key
                            )));
                        }
                    };
                }
            }
        }

        let new_settings: EngineSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = EngineSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
