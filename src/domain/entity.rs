/// Entities: Player and the enemy being fought, plus per-tick input.
/// Positions are world pixels on an 800x600-style board.

use crate::config::WorldConfig;
use super::map::MapId;

/// Movement direction (continuous while key held)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

/// The set of directions held this tick. Opposite directions may both be
/// held; they cancel out positionally but still count as movement.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveSet {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MoveSet {
    pub fn none() -> Self {
        MoveSet::default()
    }

    #[cfg(test)]
    pub fn of(dirs: &[MoveDir]) -> Self {
        let mut set = MoveSet::default();
        for &d in dirs {
            set.insert(d);
        }
        set
    }

    pub fn insert(&mut self, dir: MoveDir) {
        match dir {
            MoveDir::Left => self.left = true,
            MoveDir::Right => self.right = true,
            MoveDir::Up => self.up = true,
            MoveDir::Down => self.down = true,
        }
    }

    pub fn contains(&self, dir: MoveDir) -> bool {
        match dir {
            MoveDir::Left => self.left,
            MoveDir::Right => self.right,
            MoveDir::Up => self.up,
            MoveDir::Down => self.down,
        }
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        !(self.left || self.right || self.up || self.down)
    }
}

/// Frame input: held movement plus the two edge-triggered actions.
/// Movement = continuous (held key), attack/confirm = fresh press only.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: MoveSet,
    pub attack: bool,
    pub confirm: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug)]
pub struct Player {
    pub pos: Position,
    /// Side length of the square footprint.
    pub size: i32,
    /// Pixels per tick along each held axis.
    pub speed: i32,
    pub map: MapId,
}

impl Player {
    pub fn new(cfg: &WorldConfig) -> Self {
        Player {
            pos: Position { x: cfg.start_x, y: cfg.start_y },
            size: cfg.player_size,
            speed: cfg.player_speed,
            map: MapId::FIRST,
        }
    }
}

/// One battle's state. Created by `battle::start_battle`, dropped when it ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Battle {
    /// Raw hit points; may go negative on the finishing blow.
    pub enemy_hp: i32,
    pub is_boss: bool,
    pub message: String,
    pub sub_message: String,
}
