use crate::fs::{make_directory, replace_file, CopyOutcome};
use crate::{
    ControlFixEntry, Error, GameConfigEntry, Installation, Mapper, Settings, DEFAULTS_ID,
    PLATFORM_PREFIX,
};
use colored::Colorize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Patch applied to the defaults folder itself before any game is touched.
const DEFAULTS_SELF_PATCH: GameConfigEntry = GameConfigEntry::new(0, 2, 1);
/// Patch applied to PSP folders that are not stock games.
const GENERIC_PATCH: GameConfigEntry = GameConfigEntry::new(0, 1, 1);

// Player 1 / player 2 profile pairs kept in the defaults folder.
const P1_CONTROLS: &str = "controls8.ini";
const P2_CONTROLS: &str = "controls9.ini";
const P1_SETTINGS: &str = "ppsspp10.ini";
const P2_SETTINGS: &str = "ppsspp11.ini";

const NOTICE_SOURCE: &str = "notice.ini";
const NOTICE_TARGET: &str = "notice.txt";
const KEY_RECORD_TARGET: &str = "KeyRecord.ini";
const SECONDARY_STATE_TARGET: &str = "2p.ppst";

const PROMO: &str = "**** Did you know that ultimate-edition users also get optimized PSP performance tweaks and extra two-player game support? ****";

/// What a patch run did, in addition to what it printed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PatchSummary {
    /// Folders that received the default control patch.
    pub patched: Vec<String>,
    /// Folders that received the two-player patch.
    pub two_player: Vec<String>,
    /// Folders left partially patched after an I/O error.
    pub failed: Vec<String>,
    pub copied: usize,
    pub skipped: usize,
}

impl PatchSummary {
    fn record(&mut self, outcome: CopyOutcome) {
        if outcome.is_copied() {
            self.copied += 1;
        } else {
            self.skipped += 1;
        }
    }

    fn fail(&mut self, id: &str, err: &Error) {
        println!("{} {id}: {err}", "Could not patch".red());
        self.failed.push(id.to_string());
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: PatchSummary) {
        self.patched.extend(other.patched);
        self.two_player.extend(other.two_player);
        self.failed.extend(other.failed);
        self.copied += other.copied;
        self.skipped += other.skipped;
    }
}

pub struct GameConfigPatcher {
    mapper: Mapper,
    settings: Settings,
}

impl GameConfigPatcher {
    pub fn new(mapper: Mapper, settings: Settings) -> Self {
        Self { mapper, settings }
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Creates `PSP/SYSTEM` under `target` and overwrites its `controls.ini`
    /// (and `ppsspp.ini` outside the limited edition) with the variants
    /// selected by `config` from `source`.
    pub fn apply_control_patch(
        &self,
        source: &Path,
        target: &Path,
        config: &GameConfigEntry,
        summary: &mut PatchSummary,
    ) -> Result<(), Error> {
        let psp = target.join("PSP");
        let system = psp.join("SYSTEM");
        make_directory(&psp)?;
        make_directory(&system)?;

        copy_checked(
            &source.join(config.controls_file()),
            &system.join("controls.ini"),
            summary,
        )?;
        if !self.settings.limited {
            copy_checked(
                &source.join(config.settings_file()),
                &system.join("ppsspp.ini"),
                summary,
            )?;
        }
        Ok(())
    }

    /// Patches every stock game present on the card.
    pub fn patch_stock_games(&self, root: &Path) -> Result<PatchSummary, Error> {
        let installation = Installation::open(root)?;
        println!("Attempting to fix controls and performance for games:");
        if self.settings.limited {
            self.promo_countdown();
        }
        let defaults = require_defaults(&installation)?;

        let mut summary = PatchSummary::default();
        for (id, config) in self.mapper.stock_games() {
            let game = installation.game_dir(id);
            if !game.exists() {
                continue;
            }

            match self.mapper.control_fix(id) {
                None => {
                    println!("{} {}", "Patching stock game:".green(), id);
                    match self.apply_control_patch(&defaults, &game, config, &mut summary) {
                        Ok(()) => summary.patched.push(id.clone()),
                        Err(err) => summary.fail(id, &err),
                    }
                }
                Some(fix) if config.is_two_player() => {
                    println!("{} {}", "Patching two-player game:".green(), fix.name);
                    match apply_two_player_patch(&defaults, &game, fix, &mut summary) {
                        Ok(()) => summary.two_player.push(id.clone()),
                        Err(err) => summary.fail(id, &err),
                    }
                }
                Some(fix) => println!(
                    "{}",
                    format!("{} ({id}) is not a two-player title, skipping", fix.name).dimmed()
                ),
            }
        }
        Ok(summary)
    }

    /// Applies the generic control patch to every PSP folder except the
    /// defaults folder.
    pub fn patch_other_games(&self, root: &Path) -> Result<PatchSummary, Error> {
        let installation = Installation::open(root)?;
        println!("Attempting to fix non-stock PSP game controls...");
        let defaults = require_defaults(&installation)?;

        let mut folders = Vec::new();
        for entry in std::fs::read_dir(installation.games_dir())? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    println!("{} {err}", "Could not read game folder entry:".red());
                    continue;
                }
            };
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(name) => {
                    println!("Skipping folder {:?} due to invalid UTF-8 name", name);
                    continue;
                }
            };

            if name.starts_with(PLATFORM_PREFIX)
                && name != DEFAULTS_ID
                && entry.path().is_dir()
            {
                folders.push((name, entry.path()));
            }
        }
        folders.sort();

        let mut summary = PatchSummary::default();
        for (name, folder) in folders {
            println!("{}", name.green());
            match self.apply_control_patch(&defaults, &folder, &GENERIC_PATCH, &mut summary) {
                Ok(()) => summary.patched.push(name),
                Err(err) => summary.fail(&name, &err),
            }
        }
        Ok(summary)
    }

    /// Patches the defaults folder onto itself so its own `PSP/SYSTEM`
    /// carries the control 0 / settings 2 variants.
    pub fn refresh_defaults(&self, root: &Path) -> Result<PatchSummary, Error> {
        let installation = Installation::open(root)?;
        let defaults = require_defaults(&installation)?;

        let mut summary = PatchSummary::default();
        self.apply_control_patch(&defaults, &defaults, &DEFAULTS_SELF_PATCH, &mut summary)?;
        Ok(summary)
    }

    /// Full SD card fix: refresh the defaults folder, then stock games, then
    /// everything else.
    pub fn run_stage2(&self, root: &Path) -> Result<PatchSummary, Error> {
        let mut summary = self.refresh_defaults(root)?;
        summary.merge(self.patch_stock_games(root)?);
        summary.merge(self.patch_other_games(root)?);

        println!("{}", "** Done. Have fun!".green().bold());
        Ok(summary)
    }

    fn promo_countdown(&self) {
        let tick = Duration::from_secs(1);
        if self.settings.countdown > 0 {
            std::thread::sleep(tick);
        }
        println!("{}", PROMO.bold());
        if self.settings.countdown == 0 {
            return;
        }

        for i in (1..=self.settings.countdown).rev() {
            print!("{i}...");
            std::io::stdout().flush().ok();
            std::thread::sleep(tick);
        }
        println!();
    }
}

fn require_defaults(installation: &Installation) -> Result<PathBuf, Error> {
    let defaults = installation.defaults_dir();
    if !defaults.is_dir() {
        println!(
            "Please run `pspfix stage1` first to install the PSP injector via USB stick on to your\n\
             Pandora Games 3D console, then insert its SD card and point this tool at {}\n\
             in order to fix stock games.",
            installation.root().display()
        );
        return Err(Error::MissingDefaults(defaults));
    }
    Ok(defaults)
}

fn apply_two_player_patch(
    defaults: &Path,
    game: &Path,
    fix: &ControlFixEntry,
    summary: &mut PatchSummary,
) -> Result<(), Error> {
    let p1_system = game.join("PSP").join("SYSTEM");
    let p1_states = game.join("PSP").join("PPSSPP_STATE");
    let p2 = game.join("2p");
    let p2_system = p2.join("PSP").join("SYSTEM");
    let p2_states = p2.join("PSP").join("PPSSPP_STATE");

    make_directory(&p2)?;
    make_directory(&p2.join("PSP"))?;
    make_directory(&p2_system)?;
    make_directory(&p2_states)?;

    let state_name = fix
        .save_state
        .as_deref()
        .map(|save| format!("{}.ppst", file_stem(save)));

    if let Some(save_2p) = &fix.save_state_2p {
        if let Some(state_name) = &state_name {
            replace_game_file(defaults, save_2p, &p2_states.join(state_name), summary)?;
        }
        if let Some(secondary) = &fix.save_state_secondary {
            replace_game_file(
                defaults,
                secondary,
                &p1_states.join(SECONDARY_STATE_TARGET),
                summary,
            )?;
        }
    }
    if let (Some(save), Some(state_name)) = (&fix.save_state, &state_name) {
        replace_game_file(defaults, save, &p1_states.join(state_name), summary)?;
    }

    replace_game_file(defaults, P1_SETTINGS, &p1_system.join("ppsspp.ini"), summary)?;
    replace_game_file(defaults, P1_CONTROLS, &p1_system.join("controls.ini"), summary)?;
    replace_game_file(defaults, P2_SETTINGS, &p2_system.join("ppsspp.ini"), summary)?;
    replace_game_file(defaults, P2_CONTROLS, &p2_system.join("controls.ini"), summary)?;

    replace_game_file(defaults, NOTICE_SOURCE, &game.join(NOTICE_TARGET), summary)?;
    if let Some(key_record) = &fix.key_record {
        replace_game_file(defaults, key_record, &game.join(KEY_RECORD_TARGET), summary)?;
    }
    Ok(())
}

fn replace_game_file(
    defaults: &Path,
    source_name: &str,
    destination: &Path,
    summary: &mut PatchSummary,
) -> Result<CopyOutcome, Error> {
    println!("{}", format!("  - Copying {source_name}").dimmed());
    copy_checked(&defaults.join(source_name), destination, summary)
}

fn copy_checked(
    source: &Path,
    destination: &Path,
    summary: &mut PatchSummary,
) -> Result<CopyOutcome, Error> {
    let outcome = replace_file(source, destination)?;
    match outcome {
        CopyOutcome::Copied => {}
        CopyOutcome::MissingSource => println!(
            "{} {} is missing, skipping",
            "Warning:".yellow(),
            source.display()
        ),
        CopyOutcome::MissingDestination => println!(
            "{} {} does not exist and will not be created, skipping",
            "Warning:".yellow(),
            destination.display()
        ),
    }
    summary.record(outcome);
    Ok(outcome)
}

fn file_stem(name: &str) -> &str {
    Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name)
}
