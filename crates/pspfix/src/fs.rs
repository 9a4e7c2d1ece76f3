use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    MissingSource,
    MissingDestination,
}

impl CopyOutcome {
    pub fn is_copied(self) -> bool {
        self == CopyOutcome::Copied
    }
}

/// Creates a single directory level. An existing directory is not an error.
pub fn make_directory(path: &Path) -> std::io::Result<()> {
    match std::fs::create_dir(path) {
        Err(err) if err.kind() == ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        result => result,
    }
}

/// Overwrites `destination` with `source`.
///
/// Both files must already exist: a missing destination is never created,
/// so only files laid down by a full game install get replaced.
pub fn replace_file(source: &Path, destination: &Path) -> std::io::Result<CopyOutcome> {
    if !source.exists() {
        return Ok(CopyOutcome::MissingSource);
    }
    if !destination.exists() {
        return Ok(CopyOutcome::MissingDestination);
    }
    std::fs::copy(source, destination)?;
    Ok(CopyOutcome::Copied)
}
