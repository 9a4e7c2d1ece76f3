use crate::{Error, DEFAULTS_ID};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

static BUILTIN_MAPPING: &str = include_str!("../resources/mapping.toml");

/// Default configuration of one game folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GameConfigEntry {
    pub control_type: u8,
    pub settings: u8,
    pub players: u8,
}

impl GameConfigEntry {
    pub const fn new(control_type: u8, settings: u8, players: u8) -> Self {
        Self {
            control_type,
            settings,
            players,
        }
    }

    pub fn controls_file(&self) -> String {
        format!("controls{}.ini", self.control_type)
    }

    pub fn settings_file(&self) -> String {
        format!("ppsspp{}.ini", self.settings)
    }

    pub fn is_two_player(&self) -> bool {
        self.players == 2
    }
}

/// Downloadable override for a title that needs more than the default remap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlFixEntry {
    pub name: String,
    pub archive: String,
    pub players: u8,
    #[serde(default)]
    pub save_state: Option<String>,
    #[serde(default)]
    pub save_state_secondary: Option<String>,
    #[serde(default)]
    pub save_state_2p: Option<String>,
    #[serde(default)]
    pub key_record: Option<String>,
}

impl ControlFixEntry {
    fn file_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.archive.as_str()).chain(
            [
                &self.save_state,
                &self.save_state_secondary,
                &self.save_state_2p,
                &self.key_record,
            ]
            .into_iter()
            .flatten()
            .map(String::as_str),
        )
    }
}

#[derive(Debug, Deserialize)]
struct MappingFile {
    #[serde(default)]
    stock: IndexMap<String, GameConfigEntry>,
    #[serde(default)]
    control_fix: IndexMap<String, ControlFixEntry>,
}

/// Static lookup tables: stock games and their control-fix overrides.
///
/// Loaded once and handed to the patcher; nothing mutates them afterwards.
#[derive(Debug, Clone)]
pub struct Mapper {
    stock_games: IndexMap<String, GameConfigEntry>,
    control_fixes: IndexMap<String, ControlFixEntry>,
}

impl Mapper {
    /// Tables shipped with the tool.
    pub fn builtin() -> Result<Self, Error> {
        Self::from_toml_str(BUILTIN_MAPPING)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&str)
    }

    pub fn from_toml_str(str: &str) -> Result<Self, Error> {
        let file =
            toml::from_str::<MappingFile>(str).map_err(|e| Error::ConfigError(e.to_string()))?;
        let mapper = Self {
            stock_games: file.stock,
            control_fixes: file.control_fix,
        };
        mapper.validate()?;
        Ok(mapper)
    }

    pub fn stock_games(&self) -> &IndexMap<String, GameConfigEntry> {
        &self.stock_games
    }

    pub fn control_fixes(&self) -> &IndexMap<String, ControlFixEntry> {
        &self.control_fixes
    }

    pub fn control_fix(&self, id: &str) -> Option<&ControlFixEntry> {
        self.control_fixes.get(id)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.stock_games.contains_key(DEFAULTS_ID) {
            return Err(Error::ConfigError(format!(
                "{DEFAULTS_ID} is the defaults folder and cannot be a stock game"
            )));
        }

        for (id, game) in &self.stock_games {
            check_players(id, game.players)?;
        }

        for (id, fix) in &self.control_fixes {
            check_players(id, fix.players)?;
            if let Some(name) = fix
                .file_names()
                .find(|name| name.is_empty() || name.contains(|c| matches!(c, '\\' | '/')))
            {
                return Err(Error::ConfigError(format!(
                    "control_fix.{id}: '{name}' must be a plain file name"
                )));
            }
        }

        Ok(())
    }
}

fn check_players(id: &str, players: u8) -> Result<(), Error> {
    if !matches!(players, 1 | 2) {
        return Err(Error::ConfigError(format!(
            "{id}: players must be 1 or 2, got {players}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_parse() {
        let mapper = Mapper::builtin().expect("builtin mapping parses");

        assert!(!mapper.stock_games().is_empty());
        assert!(!mapper.control_fixes().is_empty());
        for (id, fix) in mapper.control_fixes() {
            let game = mapper
                .stock_games()
                .get(id)
                .unwrap_or_else(|| panic!("{id} has a control fix but no stock entry"));
            assert_eq!(game.players, fix.players, "player count differs for {id}");
        }
    }

    #[test]
    fn variant_file_names_use_numeric_suffix() {
        let game = GameConfigEntry::new(3, 11, 1);
        assert_eq!(game.controls_file(), "controls3.ini");
        assert_eq!(game.settings_file(), "ppsspp11.ini");
    }

    #[test]
    fn optional_save_states_default_to_none() {
        let mapper = Mapper::from_toml_str(
            "[control_fix.PSP0100]\nname = \"Demo\"\narchive = \"demo.tar.gz\"\nplayers = 2\n",
        )
        .expect("parse mapping");

        let fix = mapper.control_fix("PSP0100").expect("entry present");
        assert_eq!(fix.save_state, None);
        assert_eq!(fix.key_record, None);
        assert!(mapper.stock_games().is_empty());
    }

    #[test]
    fn invalid_player_count_is_rejected() {
        let result = Mapper::from_toml_str(
            "[stock.PSP0100]\ncontrol_type = 0\nsettings = 2\nplayers = 3\n",
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn nested_file_names_are_rejected() {
        let result = Mapper::from_toml_str(
            "[control_fix.PSP0100]\nname = \"Demo\"\narchive = \"demo.tar.gz\"\nplayers = 2\nsave_state = \"../escape.ppst\"\n",
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn defaults_folder_cannot_be_a_stock_game() {
        let result = Mapper::from_toml_str(
            "[stock.PSP0000]\ncontrol_type = 0\nsettings = 2\nplayers = 1\n",
        );
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
