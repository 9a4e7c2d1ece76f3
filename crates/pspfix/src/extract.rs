use crate::Error;
use flate2::read::GzDecoder;
use std::fs::File;
use std::path::Path;

pub trait Extractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), Error>;
}

/// Unpacks gzip-compressed tarballs, the format control fixes ship in.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzExtractor;

impl Extractor for TarGzExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), Error> {
        let failed = |reason: String| Error::ExtractionFailed {
            archive: archive
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| archive.display().to_string()),
            reason,
        };

        let file = File::open(archive).map_err(|e| failed(e.to_string()))?;
        tar::Archive::new(GzDecoder::new(file))
            .unpack(target)
            .map_err(|e| failed(e.to_string()))
    }
}
