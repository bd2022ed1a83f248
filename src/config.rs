/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// A section whose values fail validation is replaced by its defaults.

use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigError;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub world: WorldConfig,
    pub encounter: EncounterConfig,
    pub battle: BattleConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
    /// Fixed RNG seed; `None` seeds from the OS.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
}

/// Board geometry and player movement, in world pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    pub screen_width: i32,
    pub screen_height: i32,
    pub player_size: i32,
    pub player_speed: i32,
    pub start_x: i32,
    pub start_y: i32,
    /// x after entering a map from its left edge.
    pub left_entry_x: i32,
    /// Distance from the right edge after entering a map from the right.
    pub right_entry_margin: i32,
}

/// Encounter odds are `chance / roll_range` per qualifying tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncounterConfig {
    pub chance: u32,
    pub roll_range: u32,
    pub boss_threshold_x: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BattleConfig {
    pub regular_hp: i32,
    pub boss_hp: i32,
    pub damage_min: i32,
    pub damage_max: i32,
    pub grace_ms: u64,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub attack: Vec<String>,
    pub confirm: Vec<String>,
    pub quit: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    world: TomlWorld,
    #[serde(default)]
    encounter: TomlEncounter,
    #[serde(default)]
    battle: TomlBattle,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    logging: TomlLogging,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlWorld {
    #[serde(default = "default_screen_width")]
    screen_width: i32,
    #[serde(default = "default_screen_height")]
    screen_height: i32,
    #[serde(default = "default_player_size")]
    player_size: i32,
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    #[serde(default = "default_start_x")]
    start_x: i32,
    #[serde(default = "default_start_y")]
    start_y: i32,
    #[serde(default = "default_left_entry")]
    left_entry_x: i32,
    #[serde(default = "default_right_margin")]
    right_entry_margin: i32,
}

#[derive(Deserialize, Debug)]
struct TomlEncounter {
    #[serde(default = "default_chance")]
    chance: u32,
    #[serde(default = "default_roll_range")]
    roll_range: u32,
    #[serde(default = "default_boss_threshold")]
    boss_threshold_x: i32,
}

#[derive(Deserialize, Debug)]
struct TomlBattle {
    #[serde(default = "default_regular_hp")]
    regular_hp: i32,
    #[serde(default = "default_boss_hp")]
    boss_hp: i32,
    #[serde(default = "default_damage_min")]
    damage_min: i32,
    #[serde(default = "default_damage_max")]
    damage_max: i32,
    #[serde(default = "default_grace_ms")]
    grace_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_attack")]
    attack: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_quit")]
    quit: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default)]
    file: Option<String>,
    #[serde(default = "default_log_level")]
    level: String,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    seed: Option<u64>,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }     // ~60 ticks per second
fn default_screen_width() -> i32 { 800 }
fn default_screen_height() -> i32 { 600 }
fn default_player_size() -> i32 { 40 }
fn default_player_speed() -> i32 { 5 }
fn default_start_x() -> i32 { 50 }
fn default_start_y() -> i32 { 300 }
fn default_left_entry() -> i32 { 10 }
fn default_right_margin() -> i32 { 10 }
fn default_chance() -> u32 { 1 }
fn default_roll_range() -> u32 { 100 }
fn default_boss_threshold() -> i32 { 700 }
fn default_regular_hp() -> i32 { 100 }
fn default_boss_hp() -> i32 { 500 }
fn default_damage_min() -> i32 { 30 }
fn default_damage_max() -> i32 { 60 }
fn default_grace_ms() -> u64 { 500 }

fn default_attack() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_quit() -> Vec<String> { vec!["Select".into()] }
fn default_log_level() -> String { "info".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed { tick_rate_ms: default_tick_rate() }
    }
}

impl Default for TomlWorld {
    fn default() -> Self {
        TomlWorld {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            player_size: default_player_size(),
            player_speed: default_player_speed(),
            start_x: default_start_x(),
            start_y: default_start_y(),
            left_entry_x: default_left_entry(),
            right_entry_margin: default_right_margin(),
        }
    }
}

impl Default for TomlEncounter {
    fn default() -> Self {
        TomlEncounter {
            chance: default_chance(),
            roll_range: default_roll_range(),
            boss_threshold_x: default_boss_threshold(),
        }
    }
}

impl Default for TomlBattle {
    fn default() -> Self {
        TomlBattle {
            regular_hp: default_regular_hp(),
            boss_hp: default_boss_hp(),
            damage_min: default_damage_min(),
            damage_max: default_damage_max(),
            grace_ms: default_grace_ms(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            attack: default_attack(),
            confirm: default_confirm(),
            quit: default_quit(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging { file: None, level: default_log_level() }
    }
}

// ── Schema → runtime conversion ──

impl From<TomlWorld> for WorldConfig {
    fn from(t: TomlWorld) -> Self {
        WorldConfig {
            screen_width: t.screen_width,
            screen_height: t.screen_height,
            player_size: t.player_size,
            player_speed: t.player_speed,
            start_x: t.start_x,
            start_y: t.start_y,
            left_entry_x: t.left_entry_x,
            right_entry_margin: t.right_entry_margin,
        }
    }
}

impl From<TomlEncounter> for EncounterConfig {
    fn from(t: TomlEncounter) -> Self {
        EncounterConfig {
            chance: t.chance,
            roll_range: t.roll_range,
            boss_threshold_x: t.boss_threshold_x,
        }
    }
}

impl From<TomlBattle> for BattleConfig {
    fn from(t: TomlBattle) -> Self {
        BattleConfig {
            regular_hp: t.regular_hp,
            boss_hp: t.boss_hp,
            damage_min: t.damage_min,
            damage_max: t.damage_max,
            grace_ms: t.grace_ms,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        TomlWorld::default().into()
    }
}

impl Default for EncounterConfig {
    fn default() -> Self {
        TomlEncounter::default().into()
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        TomlBattle::default().into()
    }
}

// ── Validation ──

impl WorldConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.screen_width <= 0 || self.screen_height <= 0 {
            return Err(ConfigError::Invalid("world.screen_width/screen_height must be positive"));
        }
        if self.player_size <= 0 || self.player_size >= self.screen_width {
            return Err(ConfigError::Invalid("world.player_size must be in 1..screen_width"));
        }
        if self.player_speed < 0 {
            return Err(ConfigError::Invalid("world.player_speed must not be negative"));
        }
        if !(0..=self.screen_width).contains(&self.left_entry_x) {
            return Err(ConfigError::Invalid("world.left_entry_x must be in 0..=screen_width"));
        }
        if !(0..=self.screen_width).contains(&self.right_entry_margin) {
            return Err(ConfigError::Invalid("world.right_entry_margin must be in 0..=screen_width"));
        }
        if !(0..=self.screen_width).contains(&self.start_x) {
            return Err(ConfigError::Invalid("world.start_x must be in 0..=screen_width"));
        }
        Ok(())
    }

    /// x after entering a map from its right edge.
    pub fn right_entry_x(&self) -> i32 {
        self.screen_width - self.right_entry_margin
    }
}

impl EncounterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roll_range == 0 {
            return Err(ConfigError::Invalid("encounter.roll_range must be positive"));
        }
        if self.chance > self.roll_range {
            return Err(ConfigError::Invalid("encounter.chance must not exceed roll_range"));
        }
        Ok(())
    }
}

impl BattleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.damage_min > self.damage_max {
            return Err(ConfigError::Invalid("battle.damage_min must not exceed damage_max"));
        }
        if self.damage_min < 1 {
            return Err(ConfigError::Invalid("battle.damage_min must be at least 1"));
        }
        if self.regular_hp <= 0 || self.boss_hp <= 0 {
            return Err(ConfigError::Invalid("battle hit points must be positive"));
        }
        if self.grace_ms > MAX_GRACE_MS {
            return Err(ConfigError::Invalid("battle.grace_ms must not exceed 60000"));
        }
        Ok(())
    }
}

/// Longest accepted post-victory pause.
const MAX_GRACE_MS: u64 = 60_000;

/// Keep `value` if it validates, otherwise warn and fall back to the default.
fn validated<T: Default>(value: T, check: impl Fn(&T) -> Result<(), ConfigError>) -> T {
    match check(&value) {
        Ok(()) => value,
        Err(e) => {
            eprintln!("Warning: config.toml: {e}");
            eprintln!("Using default settings for this section.");
            T::default()
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        Self::load_from(&candidate_dirs())
    }

    /// Load the first readable `config.toml` in `search_dirs`.
    fn load_from(search_dirs: &[PathBuf]) -> Self {
        let text = match read_config_file(search_dirs) {
            Some(text) => text,
            None => return Self::default(),
        };
        match Self::parse(&text) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: config.toml: {e}");
                eprintln!("Using default settings.");
                Self::default()
            }
        }
    }

    /// Parse a config document directly (no file search).
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::from_toml(cfg))
    }

    fn from_toml(toml_cfg: TomlConfig) -> Self {
        GameConfig {
            speed: SpeedConfig {
                tick_rate_ms: toml_cfg.speed.tick_rate_ms.max(1),
            },
            world: validated(WorldConfig::from(toml_cfg.world), WorldConfig::validate),
            encounter: validated(EncounterConfig::from(toml_cfg.encounter), EncounterConfig::validate),
            battle: validated(BattleConfig::from(toml_cfg.battle), BattleConfig::validate),
            gamepad: GamepadConfig {
                attack: toml_cfg.gamepad.attack,
                confirm: toml_cfg.gamepad.confirm,
                quit: toml_cfg.gamepad.quit,
            },
            logging: LoggingConfig {
                file: toml_cfg.logging.file.map(PathBuf::from),
                level: toml_cfg.logging.level,
            },
            seed: toml_cfg.general.seed,
        }
    }

    /// Post-victory pause expressed in whole ticks (rounded up).
    pub fn grace_ticks(&self) -> u32 {
        let rate = self.speed.tick_rate_ms.max(1);
        u32::try_from(self.battle.grace_ms.div_ceil(rate)).unwrap_or(u32::MAX)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/campus-rpg)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/campus-rpg");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Contents of the first `config.toml` found in the candidate directories.
fn read_config_file(search_dirs: &[PathBuf]) -> Option<String> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return Some(text),
                Err(e) => eprintln!("Warning: could not read {}: {e}", path.display()),
            }
        }
    }
    None
}
