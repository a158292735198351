use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location
pub const CONFIG_PATH_ENV: &str = "TAILOR_CONFIG_PATH";

/// Environment variable overriding the record storage file
pub const DATA_PATH_ENV: &str = "TAILOR_DATA_PATH";

/// Default name of the offline asset cache bucket
pub const DEFAULT_CACHE_BUCKET: &str = "v1";

/// User settings shared by the CLI and the GUI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Storage file holding the record collection
    pub data_path: PathBuf,
    /// Base URL the application shell assets are fetched from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_origin: Option<String>,
    /// Directory holding the offline cache buckets
    pub cache_dir: PathBuf,
    /// Name of the active cache bucket; bump it to invalidate cached assets
    pub cache_bucket: String,
    /// Clear the form before loading a record for editing
    pub clear_form_on_edit: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let data_root = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache_root = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_path: data_root.join("tailor").join("storage.json"),
            asset_origin: None,
            cache_dir: cache_root.join("tailor").join("offline"),
            cache_bucket: DEFAULT_CACHE_BUCKET.to_string(),
            clear_form_on_edit: false,
        }
    }
}

impl Settings {
    /// Loads settings from the provided path, or defaults if the file is missing
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if !path.as_ref().exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings file: {:?}", path.as_ref()))?;

        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {:?}", path.as_ref()))
    }

    /// Save the settings to the specified path
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(&self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Loads the settings from their default location
    pub fn load_default() -> Result<Self> {
        Self::load(get_settings_path()?)
    }
}

/// Gets the path to the settings file
pub fn get_settings_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }

    // Default to ~/.tailor.config
    let home_dir = dirs::home_dir().context("Failed to determine home directory")?;

    Ok(home_dir.join(".tailor.config"))
}

/// Determines the record storage file to use.
///
/// Priority: explicit command line path, then `TAILOR_DATA_PATH`, then the
/// `data_path` setting.
pub fn determine_data_path(cli_path: Option<&Path>, settings: &Settings) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_path_buf();
    }

    if let Ok(path) = env::var(DATA_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    settings.data_path.clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(temp_dir.path().join("none.config")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.cache_bucket, "v1");
        assert!(!settings.clear_form_on_edit);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/.tailor.config");

        let settings = Settings {
            asset_origin: Some("http://localhost:8080".to_string()),
            cache_bucket: "v2".to_string(),
            clear_form_on_edit: true,
            ..Settings::default()
        };
        settings.save(&path).unwrap();

        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(".tailor.config");
        fs::write(&path, "cache_bucket: v3\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.cache_bucket, "v3");
        assert_eq!(settings.data_path, Settings::default().data_path);
    }

    #[test]
    fn test_cli_path_wins() {
        let settings = Settings::default();
        let path = determine_data_path(Some(Path::new("/tmp/explicit.json")), &settings);
        assert_eq!(path, PathBuf::from("/tmp/explicit.json"));
    }
}
