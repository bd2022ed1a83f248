/// GameState: the complete snapshot of a running game.
///
/// ## Phases
///
///   MAP    --(encounter roll hits on Field)--> BATTLE (regular)
///   MAP    --(x > boss threshold on Campus)--> BATTLE (boss)
///   BATTLE --(regular enemy down)-----------> MAP (grace cooldown armed)
///   BATTLE --(boss down)--------------------> ENDING (terminal)
///
/// `battle` is `Some` exactly while `phase == Battle`.
///
/// ## Grace cooldown
///
/// After a regular victory the map ignores movement for `grace_ticks`
/// ticks. It is a plain counter, so the renderer keeps drawing frames
/// while it runs down.

use crate::config::GameConfig;
use crate::domain::entity::{Battle, Player, Position};
use crate::domain::map::MapId;

pub const ENDING_LINES: [&str; 2] = ["Your credits are safe!", "Thank you for playing."];

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Map,
    Battle,
    Ending,
}

pub struct GameState {
    pub config: GameConfig,

    // ── Progression ──
    pub phase: Phase,
    pub player: Player,
    pub battle: Option<Battle>,
    /// Set once the boss falls; selects the ending content.
    pub cleared: bool,

    // ── Timers ──
    /// Ticks left before map movement is accepted again.
    pub grace_ticks: u32,
    pub tick: u64,
}

/// Read-only view of what the renderer needs for the current phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scene<'a> {
    Map {
        map: MapId,
        position: Position,
        size: i32,
        caption: &'static str,
    },
    Battle {
        enemy_hp: i32,
        is_boss: bool,
        message: &'a str,
        sub_message: &'a str,
    },
    Ending {
        lines: [&'static str; 2],
    },
}

// ── Construction ──

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        let player = Player::new(&config.world);
        GameState {
            config,
            phase: Phase::Map,
            player,
            battle: None,
            cleared: false,
            grace_ticks: 0,
            tick: 0,
        }
    }

    /// Is the post-victory cooldown still running?
    pub fn in_grace(&self) -> bool {
        self.grace_ticks > 0
    }

    pub fn scene(&self) -> Scene<'_> {
        match (self.phase, &self.battle) {
            (Phase::Battle, Some(b)) => Scene::Battle {
                enemy_hp: b.enemy_hp,
                is_boss: b.is_boss,
                message: &b.message,
                sub_message: &b.sub_message,
            },
            (Phase::Ending, _) => Scene::Ending { lines: ENDING_LINES },
            _ => Scene::Map {
                map: self.player.map,
                position: self.player.pos,
                size: self.player.size,
                caption: self.player.map.caption(),
            },
        }
    }
}
