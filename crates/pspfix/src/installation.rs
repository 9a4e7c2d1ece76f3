use crate::{Error, DEFAULTS_ID};
use std::path::{Path, PathBuf};

const GAMES_DATA_DIR: &str = "games/data/family";
const STAGING_DIR: &str = "mcgames";
const MANIFEST_FILE: &str = "install.txt";

/// Root of one storage device being patched.
///
/// The root is never created here: [`Installation::open`] refuses paths that
/// do not exist, so every operation fails before touching the device.
#[derive(Debug, Clone)]
pub struct Installation {
    root: PathBuf,
}

impl Installation {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        if !root.exists() {
            return Err(Error::MissingRoot(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `games/data/family`, the parent of every game folder on an SD card.
    pub fn games_dir(&self) -> PathBuf {
        self.root.join(GAMES_DATA_DIR)
    }

    pub fn game_dir(&self, id: &str) -> PathBuf {
        self.games_dir().join(id)
    }

    pub fn defaults_dir(&self) -> PathBuf {
        self.game_dir(DEFAULTS_ID)
    }

    /// `mcgames`, where the console picks up folders injected from a USB stick.
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    pub fn staged_defaults_dir(&self) -> PathBuf {
        self.staging_dir().join(DEFAULTS_ID)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.staging_dir().join(MANIFEST_FILE)
    }
}
