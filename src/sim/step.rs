/// The step function: advances the game by one tick.
///
/// Processing order (Map phase):
///   1. Grace cooldown (movement ignored while it runs)
///   2. Movement
///   3. Map transition
///   4. Random encounter (only if moved, only on Field)
///   5. Boss zone check (every tick, only if no encounter fired)
///
/// Battle phase: one attack per fresh attack press, then end-of-battle routing.
/// Ending phase: only confirm does anything (it asks the driver to quit).
///
/// Intents that don't belong to the current phase are ignored.

use log::{debug, info};

use crate::domain::battle::{self, BattleEnd};
use crate::domain::entity::FrameInput;
use crate::domain::rng::RandomSource;
use crate::domain::rules::{self, EncounterOutcome, Transition};
use super::event::GameEvent;
use super::world::{GameState, Phase};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(state: &mut GameState, input: FrameInput, rng: &mut impl RandomSource) -> Vec<GameEvent> {
    let mut events: Vec<GameEvent> = Vec::new();
    state.tick += 1;

    match state.phase {
        Phase::Map => step_map(state, input, rng, &mut events),
        Phase::Battle => step_battle(state, input, rng, &mut events),
        Phase::Ending => {
            if input.confirm {
                events.push(GameEvent::QuitRequested);
            }
        }
    }

    events
}

// ══════════════════════════════════════════════════════════════
// Map
// ══════════════════════════════════════════════════════════════

fn step_map(
    state: &mut GameState,
    input: FrameInput,
    rng: &mut impl RandomSource,
    events: &mut Vec<GameEvent>,
) {
    if state.grace_ticks > 0 {
        state.grace_ticks -= 1;
        if state.grace_ticks == 0 {
            events.push(GameEvent::GraceOver);
        }
        return;
    }

    let moved = rules::apply_movement(&mut state.player, input.movement);

    match rules::resolve_map_transition(&mut state.player, &state.config.world) {
        Transition::Entered(map) => {
            info!("entered {} (x={})", map.name(), state.player.pos.x);
            events.push(GameEvent::MapEntered { map });
        }
        Transition::DeadEnd => {
            events.push(GameEvent::DeadEnd { map: state.player.map });
        }
        Transition::None => {}
    }

    let encounter = rules::maybe_trigger_encounter(&state.player, moved, &state.config.encounter, rng);
    if encounter == EncounterOutcome::Regular {
        enter_battle(state, false);
        events.push(GameEvent::EncounterStarted);
        return;
    }

    if rules::maybe_trigger_boss(&state.player, &state.config.encounter) {
        enter_battle(state, true);
        events.push(GameEvent::BossAppeared);
    }
}

fn enter_battle(state: &mut GameState, is_boss: bool) {
    let battle = battle::start_battle(is_boss, &state.config.battle);
    info!(
        "battle started on {} at ({}, {}): boss={} hp={}",
        state.player.map.name(), state.player.pos.x, state.player.pos.y,
        is_boss, battle.enemy_hp,
    );
    state.battle = Some(battle);
    state.phase = Phase::Battle;
}

// ══════════════════════════════════════════════════════════════
// Battle
// ══════════════════════════════════════════════════════════════

fn step_battle(
    state: &mut GameState,
    input: FrameInput,
    rng: &mut impl RandomSource,
    events: &mut Vec<GameEvent>,
) {
    if !input.attack { return; }

    let battle = match state.battle.as_mut() {
        Some(b) => b,
        None => {
            // Phase and battle out of sync; recover to the map.
            state.phase = Phase::Map;
            return;
        }
    };

    let (damage, result) = battle::apply_attack(battle, &state.config.battle, rng);
    debug!("attack: {} damage, enemy hp {}", damage, battle.enemy_hp);
    events.push(GameEvent::EnemyHit { damage, remaining_hp: battle.enemy_hp });

    match battle::resolve_battle_end(battle, result) {
        BattleEnd::Ongoing => {}
        BattleEnd::ReturnToMap => {
            state.battle = None;
            state.phase = Phase::Map;
            state.grace_ticks = state.config.grace_ticks();
            info!("enemy defeated; back to {} after {} grace ticks", state.player.map.name(), state.grace_ticks);
            events.push(GameEvent::EnemyDefeated);
        }
        BattleEnd::Ending => {
            state.battle = None;
            state.phase = Phase::Ending;
            state.cleared = true;
            info!("boss defeated after {} ticks; game cleared", state.tick);
            events.push(GameEvent::BossDefeated);
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::entity::{MoveDir, MoveSet, Position};
    use crate::domain::map::MapId;
    use crate::domain::rng::FixedRoll;
    use crate::sim::world::Scene;

    fn walk(dirs: &[MoveDir]) -> FrameInput {
        FrameInput { movement: MoveSet::of(dirs), ..FrameInput::default() }
    }

    fn attack() -> FrameInput {
        FrameInput { attack: true, ..FrameInput::default() }
    }

    fn confirm() -> FrameInput {
        FrameInput { confirm: true, ..FrameInput::default() }
    }

    fn idle() -> FrameInput {
        FrameInput::default()
    }

    fn state_at(map: MapId, x: i32) -> GameState {
        let mut s = GameState::new(GameConfig::default());
        s.player.map = map;
        s.player.pos = Position { x, y: 300 };
        s
    }

    /// Never triggers an encounter (roll 99 >= chance 1) and hits for 60.
    fn no_encounter() -> FixedRoll {
        FixedRoll(99)
    }

    // ── Map phase ──

    #[test]
    fn walking_right_out_of_village_enters_field() {
        let mut s = state_at(MapId::Village, 798);
        let events = step(&mut s, walk(&[MoveDir::Right]), &mut no_encounter());
        assert_eq!(events, vec![GameEvent::MapEntered { map: MapId::Field }]);
        assert_eq!(s.player.map, MapId::Field);
        assert_eq!(s.player.pos.x, 10);
        assert_eq!(s.phase, Phase::Map);
    }

    #[test]
    fn off_board_entry_config_cannot_skip_a_map() {
        let cfg = GameConfig::parse("[world]\nleft_entry_x = 900\n").unwrap();
        let mut s = GameState::new(cfg);
        s.player.pos = Position { x: 798, y: 300 };

        step(&mut s, walk(&[MoveDir::Right]), &mut no_encounter());
        assert_eq!((s.player.map, s.player.pos.x), (MapId::Field, 10));

        assert!(step(&mut s, idle(), &mut no_encounter()).is_empty());
        assert_eq!((s.player.map, s.player.pos.x), (MapId::Field, 10));
    }

    #[test]
    fn walking_left_out_of_village_is_dead_end() {
        let mut s = state_at(MapId::Village, 2);
        let events = step(&mut s, walk(&[MoveDir::Left]), &mut no_encounter());
        assert_eq!(events, vec![GameEvent::DeadEnd { map: MapId::Village }]);
        assert_eq!(s.player.pos.x, 0);
    }

    #[test]
    fn encounter_fires_on_next_qualifying_tick() {
        let mut s = state_at(MapId::Field, 300);
        let mut always = FixedRoll(0);

        // Standing still never rolls.
        assert!(step(&mut s, idle(), &mut always).is_empty());
        assert_eq!(s.phase, Phase::Map);

        let events = step(&mut s, walk(&[MoveDir::Up]), &mut always);
        assert_eq!(events, vec![GameEvent::EncounterStarted]);
        assert_eq!(s.phase, Phase::Battle);
        let b = s.battle.as_ref().unwrap();
        assert!(!b.is_boss);
        assert_eq!(b.enemy_hp, 100);
    }

    #[test]
    fn no_encounters_outside_field() {
        for map in [MapId::Village, MapId::Campus] {
            let mut s = state_at(map, 300);
            for _ in 0..20 {
                step(&mut s, walk(&[MoveDir::Down]), &mut FixedRoll(0));
            }
            assert_eq!(s.phase, Phase::Map, "{map:?}");
        }
    }

    #[test]
    fn crossing_into_field_rolls_on_the_same_tick() {
        let mut s = state_at(MapId::Village, 798);
        let events = step(&mut s, walk(&[MoveDir::Right]), &mut FixedRoll(0));
        assert_eq!(events, vec![GameEvent::MapEntered { map: MapId::Field }, GameEvent::EncounterStarted]);
        assert_eq!(s.phase, Phase::Battle);
    }

    #[test]
    fn boss_zone_triggers_without_movement() {
        let mut s = state_at(MapId::Campus, 701);
        let events = step(&mut s, idle(), &mut no_encounter());
        assert_eq!(events, vec![GameEvent::BossAppeared]);
        assert_eq!(s.phase, Phase::Battle);
        let b = s.battle.as_ref().unwrap();
        assert!(b.is_boss);
        assert_eq!(b.enemy_hp, 500);
    }

    #[test]
    fn boss_zone_reached_by_walking() {
        let mut s = state_at(MapId::Campus, 10);
        let mut ticks = 0;
        while s.phase == Phase::Map {
            step(&mut s, walk(&[MoveDir::Right]), &mut FixedRoll(0));
            ticks += 1;
            assert!(ticks < 200);
        }
        assert!(s.player.pos.x > 700);
        assert!(s.battle.as_ref().unwrap().is_boss);
    }

    #[test]
    fn attack_on_map_is_noop() {
        let mut s = state_at(MapId::Field, 300);
        let events = step(&mut s, attack(), &mut FixedRoll(0));
        assert!(events.is_empty());
        assert_eq!(s.phase, Phase::Map);
        assert_eq!(s.player.pos, Position { x: 300, y: 300 });
    }

    // ── Battle phase ──

    fn in_battle(is_boss: bool) -> GameState {
        let mut s = state_at(if is_boss { MapId::Campus } else { MapId::Field }, 300);
        enter_battle(&mut s, is_boss);
        s
    }

    #[test]
    fn movement_during_battle_is_noop() {
        let mut s = in_battle(false);
        let events = step(&mut s, walk(&[MoveDir::Right, MoveDir::Up]), &mut FixedRoll(0));
        assert!(events.is_empty());
        assert_eq!(s.player.pos, Position { x: 300, y: 300 });
        assert_eq!(s.battle.as_ref().unwrap().enemy_hp, 100);
    }

    #[test]
    fn regular_victory_returns_to_map_with_grace() {
        let mut s = in_battle(false);
        let mut max_hit = FixedRoll(60);

        let events = step(&mut s, attack(), &mut max_hit);
        assert_eq!(events, vec![GameEvent::EnemyHit { damage: 60, remaining_hp: 40 }]);
        assert_eq!(s.phase, Phase::Battle);
        match s.scene() {
            Scene::Battle { enemy_hp, message, .. } => {
                assert_eq!(enemy_hp, 40);
                assert_eq!(message, "Koukaton attacks! 60 damage!");
            }
            other => panic!("unexpected scene {other:?}"),
        }

        let events = step(&mut s, attack(), &mut max_hit);
        assert_eq!(events, vec![
            GameEvent::EnemyHit { damage: 60, remaining_hp: -20 },
            GameEvent::EnemyDefeated,
        ]);
        assert_eq!(s.phase, Phase::Map);
        assert!(s.battle.is_none());
        assert!(!s.cleared);
        assert_eq!(s.grace_ticks, s.config.grace_ticks());

        // Attacks after the battle do nothing.
        assert!(step(&mut s, attack(), &mut max_hit).is_empty());
    }

    #[test]
    fn grace_period_blocks_movement_then_releases() {
        let mut s = in_battle(false);
        let mut rng = FixedRoll(60);
        step(&mut s, attack(), &mut rng);
        step(&mut s, attack(), &mut rng);
        let grace = s.grace_ticks;
        assert!(grace > 0);

        let start = s.player.pos;
        let mut no_enc = no_encounter();
        for i in 0..grace {
            let events = step(&mut s, walk(&[MoveDir::Right]), &mut no_enc);
            assert_eq!(s.player.pos, start, "moved during grace tick {i}");
            if i + 1 == grace {
                assert_eq!(events, vec![GameEvent::GraceOver]);
            }
        }
        assert!(!s.in_grace());

        step(&mut s, walk(&[MoveDir::Right]), &mut no_enc);
        assert_eq!(s.player.pos.x, start.x + 5);
    }

    #[test]
    fn boss_victory_reaches_ending() {
        let mut s = in_battle(true);
        let mut rng = FixedRoll(60);
        let last = (0..9).map(|_| step(&mut s, attack(), &mut rng)).last().unwrap();
        // 500 - 9 * 60 = -40
        assert_eq!(last, vec![
            GameEvent::EnemyHit { damage: 60, remaining_hp: -40 },
            GameEvent::BossDefeated,
        ]);
        assert_eq!(s.phase, Phase::Ending);
        assert!(s.cleared);
        assert!(s.battle.is_none());
    }

    #[test]
    fn ending_is_terminal_except_quit() {
        let mut s = in_battle(true);
        s.battle.as_mut().unwrap().enemy_hp = 1;
        step(&mut s, attack(), &mut FixedRoll(30));
        assert_eq!(s.phase, Phase::Ending);

        let mut rng = FixedRoll(0);
        for input in [walk(&[MoveDir::Left]), attack(), idle()] {
            assert!(step(&mut s, input, &mut rng).is_empty());
            assert_eq!(s.phase, Phase::Ending);
        }
        assert_eq!(step(&mut s, confirm(), &mut rng), vec![GameEvent::QuitRequested]);
        assert_eq!(s.phase, Phase::Ending);
    }

    #[test]
    fn full_run_with_seeded_rng() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(31337);
        let mut s = GameState::new(GameConfig::default());
        let mut battles = 0;

        for _ in 0..100_000 {
            let input = match s.phase {
                Phase::Map => walk(&[MoveDir::Right]),
                Phase::Battle => attack(),
                Phase::Ending => break,
            };
            let events = step(&mut s, input, &mut rng);
            battles += events.iter()
                .filter(|e| matches!(e, GameEvent::EncounterStarted | GameEvent::BossAppeared))
                .count();
        }

        assert_eq!(s.phase, Phase::Ending);
        assert!(s.cleared);
        assert_eq!(s.player.map, MapId::Campus);
        assert!(battles >= 1);
    }
}
