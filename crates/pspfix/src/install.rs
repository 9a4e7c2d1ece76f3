use crate::fs::make_directory;
use crate::{Downloader, Error, Extractor, GameConfigPatcher, Installation, DEFAULTS_ID};
use colored::Colorize;
use std::path::Path;

/// Per-entry result of an injector install.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub installed: Vec<String>,
    pub failures: Vec<Error>,
}

impl InstallReport {
    /// True only when every control fix was downloaded and extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl GameConfigPatcher {
    /// Prepares a USB stick that injects the defaults folder into the console.
    ///
    /// Writes `mcgames/install.txt` and extracts every control-fix archive into
    /// `mcgames/PSP0000`. A failing entry is reported and the remaining entries
    /// are still processed.
    pub fn install_injector(
        &self,
        root: &Path,
        downloader: &dyn Downloader,
        extractor: &dyn Extractor,
    ) -> Result<InstallReport, Error> {
        let installation = Installation::open(root)?;
        println!("Installing PSP injector to {}", root.display());

        let target = installation.staged_defaults_dir();
        make_directory(&installation.staging_dir())?;
        make_directory(&target)?;
        std::fs::write(installation.manifest_path(), format!("{DEFAULTS_ID}\n"))?;

        let staging = tempfile::Builder::new().prefix("pspfix-").tempdir()?;
        let mut report = InstallReport::default();
        for (id, fix) in self.mapper().control_fixes() {
            println!("Downloading {} control files...", fix.name.green());
            let result = downloader
                .download(fix, staging.path())
                .and_then(|archive| extractor.extract(&archive, &target));

            match result {
                Ok(()) => report.installed.push(id.clone()),
                Err(err) => {
                    println!("{} {err}", "Error:".red());
                    report.failures.push(err);
                }
            }
        }

        Ok(report)
    }
}
