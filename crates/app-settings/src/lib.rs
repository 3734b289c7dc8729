use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppSettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings path unavailable")]
    MissingSettingsPath,
}

pub type Result<T> = std::result::Result<T, AppSettingsError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropSettings {
    pub debounce_ms: u64,
    /// Width / height; `null` disables the constraint.
    pub aspect: Option<f64>,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            aspect: Some(1.0),
        }
    }
}

impl CropSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSettings {
    /// Directory holding one subdirectory per category.
    pub storage_root: Option<PathBuf>,
    pub crop: CropSettings,
}

impl MediaSettings {
    pub fn load() -> Result<Self> {
        load_impl()
    }

    pub fn save(&self) -> Result<()> {
        save_impl(self)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_string_pretty(self)?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    /// Configured storage root, or `<data dir>/clubmedia/images`.
    pub fn storage_root(&self) -> Result<PathBuf> {
        match &self.storage_root {
            Some(root) => Ok(root.clone()),
            None => default_storage_root(),
        }
    }

    pub fn set_storage_root(&mut self, root: PathBuf) {
        self.storage_root = Some(root);
    }
}

fn default_storage_root() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "ClubMedia", "clubmedia")
        .ok_or(AppSettingsError::MissingSettingsPath)?;
    Ok(dirs.data_dir().join("images"))
}

#[cfg(target_os = "windows")]
fn load_impl() -> Result<MediaSettings> {
    use winreg::enums::{HKEY_CURRENT_USER, KEY_READ};
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let key = hkcu
        .open_subkey_with_flags("Software\\ClubMedia", KEY_READ)
        .ok();

    if let Some(key) = key {
        if let Ok(payload) = key.get_value::<String, _>("MediaSettings") {
            return Ok(serde_json::from_str(&payload)?);
        }
    }

    Ok(MediaSettings::default())
}

#[cfg(target_os = "windows")]
fn save_impl(settings: &MediaSettings) -> Result<()> {
    use winreg::enums::{HKEY_CURRENT_USER, KEY_WRITE};
    use winreg::RegKey;

    let hkcu = RegKey::predef(HKEY_CURRENT_USER);
    let (key, _) = hkcu.create_subkey_with_flags("Software\\ClubMedia", KEY_WRITE)?;
    let payload = serde_json::to_string(settings)?;
    key.set_value("MediaSettings", &payload)?;
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn load_impl() -> Result<MediaSettings> {
    MediaSettings::load_from(&settings_file_path()?)
}

#[cfg(not(target_os = "windows"))]
fn save_impl(settings: &MediaSettings) -> Result<()> {
    settings.save_to(&settings_file_path()?)
}

#[cfg(not(target_os = "windows"))]
fn settings_file_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("org", "ClubMedia", "clubmedia")
        .ok_or(AppSettingsError::MissingSettingsPath)?;
    Ok(dirs.config_dir().join("settings.json"))
}
