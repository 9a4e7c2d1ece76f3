use argh::FromArgs;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use pspfix::{
    load_settings, DirectoryDownloader, Downloader, DownloadSource, Error, GameConfigPatcher,
    HttpDownloader, Mapper, PatchSummary, Settings, TarGzExtractor,
};

#[derive(Debug, FromArgs)]
#[argh(
    description = "Fixes PSP game controls on Pandora Games 3D storage.\n\tstage1 prepares a USB stick that injects the default control files into the console\n\tstage2 patches every PSP game folder on the console's SD card"
)]
struct Args {
    /// settings file (TOML)
    #[argh(option, short = 'c')]
    config: Option<String>,
    /// mapping table to use instead of the built-in one
    #[argh(option, short = 'm')]
    mapping: Option<String>,
    /// limited edition: skip settings profiles and show the countdown
    #[argh(switch)]
    limited: bool,
    /// download control fixes from this URL
    #[argh(option)]
    base_url: Option<String>,
    /// take control fix archives from this folder instead of downloading
    #[argh(option)]
    archives: Option<String>,
    #[argh(subcommand)]
    command: Command,
}

#[derive(Debug, FromArgs)]
#[argh(subcommand)]
enum Command {
    Stage1(Stage1Args),
    Stage2(Stage2Args),
    Stock(StockArgs),
    Other(OtherArgs),
    List(ListArgs),
}

/// Install the PSP injector onto a USB stick.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "stage1")]
struct Stage1Args {
    /// root of the USB stick
    #[argh(positional)]
    target: String,
}

/// Fix stock and other PSP games on an SD card.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "stage2")]
struct Stage2Args {
    /// root of the SD card
    #[argh(positional)]
    target: String,
}

/// Refresh the defaults folder, then fix stock PSP games only.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "stock")]
struct StockArgs {
    /// root of the SD card
    #[argh(positional)]
    target: String,
}

/// Refresh the defaults folder, then fix every other PSP game folder.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "other")]
struct OtherArgs {
    /// root of the SD card
    #[argh(positional)]
    target: String,
}

/// Print the stock game and control fix tables.
#[derive(Debug, FromArgs)]
#[argh(subcommand, name = "list")]
struct ListArgs {}

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            println!("{} {err}", "Error:".red());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<bool, Error> {
    let settings = build_settings(&args)?;
    let mapper = match &args.mapping {
        Some(path) => Mapper::load(Path::new(path))?,
        None => Mapper::builtin()?,
    };
    let patcher = GameConfigPatcher::new(mapper, settings);

    match args.command {
        Command::Stage1(Stage1Args { target }) => {
            let downloader = build_downloader(patcher.settings())?;
            let report =
                patcher.install_injector(Path::new(&target), &*downloader, &TarGzExtractor)?;
            if !report.is_complete() {
                println!(
                    "{} of {} control fixes could not be installed",
                    report.failures.len().to_string().red(),
                    report.failures.len() + report.installed.len()
                );
            }
            Ok(report.is_complete())
        }
        Command::Stage2(Stage2Args { target }) => {
            let summary = patcher.run_stage2(Path::new(&target))?;
            Ok(report_failures(&summary))
        }
        Command::Stock(StockArgs { target }) => {
            let root = Path::new(&target);
            let mut summary = patcher.refresh_defaults(root)?;
            summary.merge(patcher.patch_stock_games(root)?);
            Ok(report_failures(&summary))
        }
        Command::Other(OtherArgs { target }) => {
            let root = Path::new(&target);
            let mut summary = patcher.refresh_defaults(root)?;
            summary.merge(patcher.patch_other_games(root)?);
            Ok(report_failures(&summary))
        }
        Command::List(ListArgs {}) => {
            print_mapping(patcher.mapper());
            Ok(true)
        }
    }
}

fn report_failures(summary: &PatchSummary) -> bool {
    if !summary.is_clean() {
        println!(
            "{} could not be patched: {}",
            summary.failed.len().to_string().red(),
            summary.failed.join(", ")
        );
    }
    summary.is_clean()
}

fn build_settings(args: &Args) -> Result<Settings, Error> {
    let mut settings = match &args.config {
        Some(path) => load_settings(Path::new(path))?,
        None => Settings::default(),
    };

    if args.limited {
        settings.limited = true;
    }
    match (&args.base_url, &args.archives) {
        (Some(_), Some(_)) => {
            return Err(Error::ConfigError(
                "--base-url and --archives cannot be used together".to_string(),
            ))
        }
        (Some(base_url), None) => {
            settings.download = Some(DownloadSource::Http {
                base_url: base_url.clone(),
            })
        }
        (None, Some(archives)) => {
            settings.download = Some(DownloadSource::Directory(PathBuf::from(archives)))
        }
        (None, None) => {}
    }

    Ok(settings)
}

fn build_downloader(settings: &Settings) -> Result<Box<dyn Downloader>, Error> {
    match &settings.download {
        Some(DownloadSource::Http { base_url }) => Ok(Box::new(HttpDownloader::new(base_url)?)),
        Some(DownloadSource::Directory(directory)) => {
            Ok(Box::new(DirectoryDownloader::new(directory)))
        }
        None => Err(Error::ConfigError(
            "no control fix source configured, pass --base-url or --archives".to_string(),
        )),
    }
}

fn print_mapping(mapper: &Mapper) {
    println!("{}", "Stock games:".bold());
    for (id, game) in mapper.stock_games() {
        println!(
            "  {} controls{} ppsspp{} {}p",
            id.green(),
            game.control_type,
            game.settings,
            game.players
        );
    }

    println!("{}", "Control fixes:".bold());
    for (id, fix) in mapper.control_fixes() {
        println!(
            "  {} {} {}",
            id.green(),
            fix.name,
            fix.archive.as_str().dimmed()
        );
    }
}
