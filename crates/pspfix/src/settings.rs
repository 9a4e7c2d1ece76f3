use crate::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_COUNTDOWN: u32 = 10;

/// Runtime options for a patch run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Shareware-limited edition: settings profiles are not copied and stock
    /// patching is preceded by a promotional countdown.
    pub limited: bool,
    /// Countdown length in seconds. Zero skips the delay entirely.
    pub countdown: u32,
    pub download: Option<DownloadSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    Http { base_url: String },
    Directory(PathBuf),
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limited: false,
            countdown: DEFAULT_COUNTDOWN,
            download: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    config: ConfigSection,
    #[serde(default)]
    download: Option<DownloadSection>,
}

#[derive(Debug, Deserialize)]
struct ConfigSection {
    #[serde(default)]
    limited: bool,
    #[serde(default = "default_countdown")]
    countdown: u32,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            limited: false,
            countdown: DEFAULT_COUNTDOWN,
        }
    }
}

fn default_countdown() -> u32 {
    DEFAULT_COUNTDOWN
}

#[derive(Debug, Deserialize)]
struct DownloadSection {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    directory: Option<PathBuf>,
}

impl TryFrom<SettingsFile> for Settings {
    type Error = Error;

    fn try_from(file: SettingsFile) -> Result<Self, Error> {
        let SettingsFile { config, download } = file;
        let download = match download {
            None => None,
            Some(DownloadSection {
                base_url: Some(_),
                directory: Some(_),
            }) => {
                return Err(Error::ConfigError(
                    "download.base_url and download.directory cannot both be set".to_string(),
                ))
            }
            Some(DownloadSection {
                base_url: Some(base_url),
                directory: None,
            }) => Some(DownloadSource::Http { base_url }),
            Some(DownloadSection {
                base_url: None,
                directory: Some(directory),
            }) => Some(DownloadSource::Directory(directory)),
            Some(DownloadSection {
                base_url: None,
                directory: None,
            }) => None,
        };

        Ok(Self {
            limited: config.limited,
            countdown: config.countdown,
            download,
        })
    }
}

impl Settings {
    pub fn from_toml_str(str: &str) -> Result<Self, Error> {
        let file =
            toml::from_str::<SettingsFile>(str).map_err(|e| Error::ConfigError(e.to_string()))?;
        file.try_into()
    }
}

pub fn load_settings(path: &Path) -> Result<Settings, Error> {
    let str = std::fs::read_to_string(path)?;
    Settings::from_toml_str(&str)
}
