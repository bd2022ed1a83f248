/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound and logging.

use crate::domain::map::MapId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    MapEntered { map: MapId },
    DeadEnd { map: MapId },
    EncounterStarted,
    BossAppeared,
    EnemyHit { damage: i32, remaining_hp: i32 },
    EnemyDefeated,
    BossDefeated,
    /// Post-victory cooldown finished; movement accepted again.
    GraceOver,
    /// Confirm pressed on the ending screen.
    QuitRequested,
}
