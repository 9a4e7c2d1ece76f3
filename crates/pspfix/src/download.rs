use crate::{ControlFixEntry, Error};
use reqwest::blocking::Client;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Fetches the archive of a control fix into a staging folder.
pub trait Downloader {
    /// Returns the path of the fetched archive inside `staging`.
    fn download(&self, fix: &ControlFixEntry, staging: &Path) -> Result<PathBuf, Error>;
}

pub struct HttpDownloader {
    client: Client,
    base_url: String,
}

impl HttpDownloader {
    pub fn new(base_url: impl Into<String>) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url_for(&self, archive: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            archive.replace(' ', "%20")
        )
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, fix: &ControlFixEntry, staging: &Path) -> Result<PathBuf, Error> {
        let failed = |reason: String| Error::DownloadFailed {
            archive: fix.archive.clone(),
            reason,
        };

        let mut response = self
            .client
            .get(self.url_for(&fix.archive))
            .send()
            .map_err(|e| failed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(failed(format!("server responded with {}", response.status())));
        }

        let path = staging.join(&fix.archive);
        let mut file = File::create(&path)?;
        response
            .copy_to(&mut file)
            .map_err(|e| failed(e.to_string()))?;
        Ok(path)
    }
}

/// Takes archives from a local folder instead of the network.
pub struct DirectoryDownloader {
    directory: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl Downloader for DirectoryDownloader {
    fn download(&self, fix: &ControlFixEntry, staging: &Path) -> Result<PathBuf, Error> {
        let source = self.directory.join(&fix.archive);
        if !source.is_file() {
            return Err(Error::DownloadFailed {
                archive: fix.archive.clone(),
                reason: format!("{} does not exist", source.display()),
            });
        }

        let path = staging.join(&fix.archive);
        std::fs::copy(&source, &path)?;
        Ok(path)
    }
}
