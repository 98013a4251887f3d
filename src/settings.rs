use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::windowing::Preset;

/// Persisted viewer preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory whose sub-folders are offered as series.
    pub root: Option<PathBuf>,
    pub mobile: bool,
    /// Label of the window preset selected on start-up.
    pub preset: Option<String>,
}

impl Settings {
    pub fn preset(&self) -> Option<Preset> {
        let label = self.preset.as_deref()?;
        match label.parse() {
            Ok(preset) => Some(preset),
            Err(err) => {
                log::warn!("Ignoring preset in settings: {err}");
                None
            }
        }
    }
}

pub fn settings_file_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        return env::var_os("APPDATA")
            .map(PathBuf::from)
            .map(|base| base.join("slicewise").join("settings.toml"));
    }

    #[cfg(target_os = "macos")]
    {
        return env::var_os("HOME").map(PathBuf::from).map(|home| {
            home.join("Library")
                .join("Application Support")
                .join("slicewise")
                .join("settings.toml")
        });
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("slicewise").join("settings.toml"));
        }
        env::var_os("HOME")
            .map(PathBuf::from)
            .map(|home| home.join(".config").join("slicewise").join("settings.toml"))
    }
}

pub fn parse_settings(text: &str) -> Result<Settings> {
    toml::from_str(text).context("Invalid settings file")
}

/// Missing file means defaults; a broken one is an error.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text =
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("Could not parse {}", path.display()))
}

/// Same as [`load_settings`], degrading to defaults with a warning.
pub fn load_settings_or_default(path: Option<&Path>) -> Settings {
    let Some(path) = path else {
        return Settings::default();
    };
    load_settings(path).unwrap_or_else(|err| {
        log::warn!("Using default settings: {err:#}");
        Settings::default()
    })
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Could not create settings directory {}", parent.display()))?;
    }
    let text = toml::to_string_pretty(settings).context("Could not serialize settings")?;
    fs::write(path, text).with_context(|| format!("Could not write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_toml_roundtrip() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");
        let settings = Settings {
            root: Some(PathBuf::from("/data/studies")),
            mobile: true,
            preset: Some("Soft Tissue".to_string()),
        };

        save_settings(&path, &settings).expect("should write settings");
        assert_eq!(load_settings(&path).expect("settings should load"), settings);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let parsed = parse_settings("root = \"/srv/dicom\"\n").expect("should parse");
        assert_eq!(parsed.root, Some(PathBuf::from("/srv/dicom")));
        assert!(!parsed.mobile);
        assert_eq!(parsed.preset(), None);
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let loaded = load_settings(&dir.path().join("absent.toml")).expect("defaults");
        assert_eq!(loaded, Settings::default());
    }

    #[test]
    fn broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        fs::write(&path, "mobile = \"sometimes\"").expect("write");
        assert!(load_settings(&path).is_err());
        assert_eq!(load_settings_or_default(Some(&path)), Settings::default());
    }

    #[test]
    fn unknown_preset_is_ignored() {
        let settings = Settings {
            preset: Some("Bone".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.preset(), None);
        let settings = Settings {
            preset: Some("perfusion".to_string()),
            ..Settings::default()
        };
        assert_eq!(settings.preset(), Some(Preset::Perfusion));
    }
}
