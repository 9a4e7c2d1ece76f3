use std::path::PathBuf;

pub mod download;
pub mod extract;
pub mod fs;
pub mod install;
pub mod installation;
pub mod mapping;
pub mod patcher;
pub mod settings;

pub use download::{DirectoryDownloader, Downloader, HttpDownloader};
pub use extract::{Extractor, TarGzExtractor};
pub use fs::CopyOutcome;
pub use install::InstallReport;
pub use installation::Installation;
pub use mapping::{ControlFixEntry, GameConfigEntry, Mapper};
pub use patcher::{GameConfigPatcher, PatchSummary};
pub use settings::{load_settings, DownloadSource, Settings};

/// Folder holding the master copies of every control and settings variant.
pub const DEFAULTS_ID: &str = "PSP0000";
/// Game folders handled by this tool all start with this prefix.
pub const PLATFORM_PREFIX: &str = "PSP";

#[derive(Debug)]
pub enum Error {
    MissingRoot(PathBuf),
    MissingDefaults(PathBuf),
    IOError(std::io::Error),
    ConfigError(String),
    DownloadFailed { archive: String, reason: String },
    ExtractionFailed { archive: String, reason: String },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MissingRoot(path) => write!(f, "{} does not exist", path.display()),
            Error::MissingDefaults(path) => {
                write!(f, "defaults folder {} does not exist", path.display())
            }
            Error::IOError(err) => write!(f, "{err}"),
            Error::ConfigError(err) => write!(f, "{err}"),
            Error::DownloadFailed { archive, reason } => {
                write!(f, "could not download {archive}: {reason}")
            }
            Error::ExtractionFailed { archive, reason } => {
                write!(f, "could not extract {archive}: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}
