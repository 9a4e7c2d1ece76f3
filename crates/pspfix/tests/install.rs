use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use pspfix::{
    ControlFixEntry, DirectoryDownloader, Downloader, Error, Extractor, GameConfigPatcher,
    Mapper, Settings, TarGzExtractor,
};
use tempfile::tempdir;

const MAPPING: &str = r#"
[stock.PSP0003]
control_type = 0
settings = 3
players = 2

[stock.PSP0005]
control_type = 0
settings = 2
players = 2

[control_fix.PSP0003]
name = "First"
archive = "first.tar.gz"
players = 2

[control_fix.PSP0005]
name = "Second"
archive = "second.tar.gz"
players = 2
"#;

/// Writes a placeholder archive and remembers which archives were asked for.
#[derive(Default)]
struct FakeDownloader {
    requested: RefCell<Vec<String>>,
    unavailable: Vec<String>,
}

impl Downloader for FakeDownloader {
    fn download(&self, fix: &ControlFixEntry, staging: &Path) -> Result<PathBuf, Error> {
        self.requested.borrow_mut().push(fix.archive.clone());
        if self.unavailable.contains(&fix.archive) {
            return Err(Error::DownloadFailed {
                archive: fix.archive.clone(),
                reason: "not found".to_string(),
            });
        }
        let path = staging.join(&fix.archive);
        fs::write(&path, fix.name.as_bytes())?;
        Ok(path)
    }
}

/// Copies the archive's contents into `<archive name>.extracted`.
#[derive(Default)]
struct FakeExtractor {
    broken: Vec<String>,
}

impl Extractor for FakeExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), Error> {
        let name = archive
            .file_name()
            .and_then(|name| name.to_str())
            .expect("archive name")
            .to_string();
        if self.broken.contains(&name) {
            return Err(Error::ExtractionFailed {
                archive: name,
                reason: "corrupt".to_string(),
            });
        }
        fs::copy(archive, target.join(format!("{name}.extracted")))?;
        Ok(())
    }
}

fn patcher() -> GameConfigPatcher {
    GameConfigPatcher::new(
        Mapper::from_toml_str(MAPPING).expect("mapping"),
        Settings::default(),
    )
}

fn files_in(folder: &Path) -> Vec<String> {
    let mut names = fs::read_dir(folder)
        .expect("read folder")
        .map(|entry| {
            entry
                .expect("entry")
                .file_name()
                .into_string()
                .expect("utf-8 name")
        })
        .collect::<Vec<_>>();
    names.sort();
    names
}

#[test]
fn missing_root_fails_before_downloading() {
    let workspace = tempdir().expect("temp dir");
    let root = workspace.path().join("usb");
    let downloader = FakeDownloader::default();

    let result = patcher().install_injector(&root, &downloader, &FakeExtractor::default());

    assert!(matches!(result, Err(Error::MissingRoot(_))));
    assert!(downloader.requested.borrow().is_empty());
    assert!(!root.exists());
}

#[test]
fn install_writes_manifest_and_extracts_every_fix() {
    let workspace = tempdir().expect("temp dir");
    let root = workspace.path();
    let downloader = FakeDownloader::default();

    let report = patcher()
        .install_injector(root, &downloader, &FakeExtractor::default())
        .expect("install");

    assert!(report.is_complete());
    assert_eq!(report.installed, ["PSP0003", "PSP0005"]);
    assert_eq!(
        fs::read_to_string(root.join("mcgames/install.txt")).expect("read manifest"),
        "PSP0000\n"
    );
    assert_eq!(
        files_in(&root.join("mcgames/PSP0000")),
        ["first.tar.gz.extracted", "second.tar.gz.extracted"]
    );
    assert_eq!(*downloader.requested.borrow(), ["first.tar.gz", "second.tar.gz"]);
}

#[test]
fn install_twice_gives_the_same_result() {
    let workspace = tempdir().expect("temp dir");
    let root = workspace.path();

    patcher()
        .install_injector(root, &FakeDownloader::default(), &FakeExtractor::default())
        .expect("first install");
    let manifest = fs::read_to_string(root.join("mcgames/install.txt")).expect("read manifest");
    let files = files_in(&root.join("mcgames/PSP0000"));

    let report = patcher()
        .install_injector(root, &FakeDownloader::default(), &FakeExtractor::default())
        .expect("second install");

    assert!(report.is_complete());
    assert_eq!(
        fs::read_to_string(root.join("mcgames/install.txt")).expect("read manifest"),
        manifest
    );
    assert_eq!(files_in(&root.join("mcgames/PSP0000")), files);
}

#[test]
fn early_failure_is_not_hidden_by_later_success() {
    let workspace = tempdir().expect("temp dir");
    let root = workspace.path();
    let downloader = FakeDownloader {
        unavailable: vec!["first.tar.gz".to_string()],
        ..Default::default()
    };

    let report = patcher()
        .install_injector(root, &downloader, &FakeExtractor::default())
        .expect("install");

    assert!(!report.is_complete());
    assert_eq!(report.installed, ["PSP0005"]);
    assert!(matches!(
        report.failures.as_slice(),
        [Error::DownloadFailed { archive, .. }] if archive == "first.tar.gz"
    ));
    assert_eq!(
        files_in(&root.join("mcgames/PSP0000")),
        ["second.tar.gz.extracted"]
    );
}

#[test]
fn extraction_failure_is_reported_and_install_continues() {
    let workspace = tempdir().expect("temp dir");
    let root = workspace.path();
    let extractor = FakeExtractor {
        broken: vec!["second.tar.gz".to_string()],
    };

    let report = patcher()
        .install_injector(root, &FakeDownloader::default(), &extractor)
        .expect("install");

    assert_eq!(report.installed, ["PSP0003"]);
    assert!(matches!(
        report.failures.as_slice(),
        [Error::ExtractionFailed { .. }]
    ));
}

fn write_tar_gz(path: &Path, files: &[(&str, &str)]) {
    let encoder = GzEncoder::new(File::create(path).expect("create archive"), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

#[test]
fn local_archives_are_unpacked_into_the_injector_folder() {
    let workspace = tempdir().expect("temp dir");
    let archives = workspace.path().join("archives");
    let root = workspace.path().join("usb");
    fs::create_dir(&archives).expect("create archives folder");
    fs::create_dir(&root).expect("create usb root");
    write_tar_gz(
        &archives.join("first.tar.gz"),
        &[("controls8.ini", "p1 controls"), ("notice.ini", "notice")],
    );
    write_tar_gz(
        &archives.join("second.tar.gz"),
        &[("controls9.ini", "p2 controls")],
    );

    let report = patcher()
        .install_injector(&root, &DirectoryDownloader::new(&archives), &TarGzExtractor)
        .expect("install");

    assert!(report.is_complete());
    assert_eq!(
        files_in(&root.join("mcgames/PSP0000")),
        ["controls8.ini", "controls9.ini", "notice.ini"]
    );
    assert_eq!(
        fs::read_to_string(root.join("mcgames/PSP0000/controls9.ini")).expect("read"),
        "p2 controls"
    );
}
