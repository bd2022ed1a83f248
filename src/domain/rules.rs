/// World rules: movement, map transitions, encounter and boss triggers.
///
/// Pure functions over the player — no phase changes happen here.
/// The tick step decides what to do with the outcomes.
///
/// ## Map Transition Truth Table
///
/// Evaluated after movement. At most one row applies per tick.
/// ┌──────────────────────┬────────────────┬──────────────────────────────┐
/// │ Condition             │ Map            │ Result                        │
/// ├──────────────────────┼────────────────┼──────────────────────────────┤
/// │ x > screen_width      │ not last       │ map + 1, x = left_entry_x     │
/// │ x > screen_width      │ last (Campus)  │ x = screen_width - size       │
/// │ x < 0                 │ not first      │ map - 1, x = right entry      │
/// │ x < 0                 │ first (Village)│ x = 0                         │
/// │ 0 <= x <= screen_width│ any            │ unchanged                     │
/// └──────────────────────┴────────────────┴──────────────────────────────┘
///
/// y is never clamped: the player may drift off the top or bottom of the
/// board with no consequence.
///
/// ## Triggers
/// ┌──────────────────────────────────────┬──────────────┐
/// │ Condition                             │ Outcome       │
/// ├──────────────────────────────────────┼──────────────┤
/// │ moved && map = Field && roll < chance │ Regular       │
/// │ map = Campus && x > boss_threshold_x  │ Boss          │
/// └──────────────────────────────────────┴──────────────┘

use crate::config::{EncounterConfig, WorldConfig};
use super::entity::{MoveSet, Player};
use super::map::MapId;
use super::rng::RandomSource;

/// What `resolve_map_transition` did this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Transition {
    None,
    /// Crossed into an adjacent map.
    Entered(MapId),
    /// Hit the outer edge of the first or last map and was pushed back.
    DeadEnd,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EncounterOutcome {
    None,
    Regular,
}

/// Move the player by `speed` along every held axis (diagonals compose).
/// Returns true if any direction was held. Opposite directions cancel
/// positionally but still count as a move, so encounters keep rolling.
pub fn apply_movement(player: &mut Player, movement: MoveSet) -> bool {
    let mut moved = false;
    if movement.left {
        player.pos.x -= player.speed;
        moved = true;
    }
    if movement.right {
        player.pos.x += player.speed;
        moved = true;
    }
    if movement.up {
        player.pos.y -= player.speed;
        moved = true;
    }
    if movement.down {
        player.pos.y += player.speed;
        moved = true;
    }
    moved
}

/// Renormalize x after movement; may switch maps. See truth table above.
pub fn resolve_map_transition(player: &mut Player, cfg: &WorldConfig) -> Transition {
    if player.pos.x > cfg.screen_width {
        match player.map.next() {
            Some(next) => {
                player.map = next;
                player.pos.x = cfg.left_entry_x;
                Transition::Entered(next)
            }
            None => {
                player.pos.x = cfg.screen_width - player.size;
                Transition::DeadEnd
            }
        }
    } else if player.pos.x < 0 {
        match player.map.prev() {
            Some(prev) => {
                player.map = prev;
                player.pos.x = cfg.right_entry_x();
                Transition::Entered(prev)
            }
            None => {
                player.pos.x = 0;
                Transition::DeadEnd
            }
        }
    } else {
        Transition::None
    }
}

/// Independent Bernoulli trial, one fresh draw per qualifying tick.
/// Gated on ticks, not distance: holding a key longer means more rolls.
pub fn maybe_trigger_encounter(
    player: &Player,
    moved: bool,
    cfg: &EncounterConfig,
    rng: &mut impl RandomSource,
) -> EncounterOutcome {
    if !moved || !player.map.has_encounters() {
        return EncounterOutcome::None;
    }
    if rng.roll_below(cfg.roll_range) < cfg.chance {
        EncounterOutcome::Regular
    } else {
        EncounterOutcome::None
    }
}

/// Deterministic boss zone check. Independent of movement.
pub fn maybe_trigger_boss(player: &Player, cfg: &EncounterConfig) -> bool {
    player.map.has_boss() && player.pos.x > cfg.boss_threshold_x
}

// ══════════════════════════════════════════════════════════════
// Tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::{MoveDir, Position};
    use crate::domain::rng::FixedRoll;

    fn player_at(map: MapId, x: i32, y: i32) -> Player {
        let mut p = Player::new(&WorldConfig::default());
        p.map = map;
        p.pos = Position { x, y };
        p
    }

    // ── Movement ──

    #[test]
    fn single_direction_moves_one_axis() {
        let mut p = player_at(MapId::Village, 100, 100);
        assert!(apply_movement(&mut p, MoveSet::of(&[MoveDir::Right])));
        assert_eq!(p.pos, Position { x: 105, y: 100 });
        assert!(apply_movement(&mut p, MoveSet::of(&[MoveDir::Up])));
        assert_eq!(p.pos, Position { x: 105, y: 95 });
    }

    #[test]
    fn diagonal_composes() {
        let mut p = player_at(MapId::Village, 100, 100);
        apply_movement(&mut p, MoveSet::of(&[MoveDir::Left, MoveDir::Down]));
        assert_eq!(p.pos, Position { x: 95, y: 105 });
    }

    #[test]
    fn no_input_no_move() {
        let mut p = player_at(MapId::Field, 100, 100);
        assert!(!apply_movement(&mut p, MoveSet::none()));
        assert_eq!(p.pos, Position { x: 100, y: 100 });
    }

    #[test]
    fn opposite_keys_cancel_but_count_as_moving() {
        let mut p = player_at(MapId::Field, 100, 100);
        assert!(apply_movement(&mut p, MoveSet::of(&[MoveDir::Left, MoveDir::Right])));
        assert_eq!(p.pos, Position { x: 100, y: 100 });
    }

    #[test]
    fn vertical_is_unclamped() {
        let mut p = player_at(MapId::Village, 100, 2);
        for _ in 0..10 {
            apply_movement(&mut p, MoveSet::of(&[MoveDir::Up]));
            resolve_map_transition(&mut p, &WorldConfig::default());
        }
        assert_eq!(p.pos.y, -48);
        assert_eq!(p.map, MapId::Village);
    }

    // ── Map transitions ──

    #[test]
    fn right_edge_advances_map() {
        let cfg = WorldConfig::default();
        for (from, to) in [(MapId::Village, MapId::Field), (MapId::Field, MapId::Campus)] {
            let mut p = player_at(from, cfg.screen_width + 1, 300);
            assert_eq!(resolve_map_transition(&mut p, &cfg), Transition::Entered(to));
            assert_eq!(p.map, to);
            assert_eq!(p.pos.x, cfg.left_entry_x);
            assert_eq!(p.pos.y, 300);
        }
    }

    #[test]
    fn right_edge_of_campus_is_dead_end() {
        let cfg = WorldConfig::default();
        let mut p = player_at(MapId::Campus, cfg.screen_width + 3, 300);
        assert_eq!(resolve_map_transition(&mut p, &cfg), Transition::DeadEnd);
        assert_eq!(p.map, MapId::Campus);
        assert_eq!(p.pos.x, cfg.screen_width - cfg.player_size);
    }

    #[test]
    fn left_edge_goes_back() {
        let cfg = WorldConfig::default();
        for (from, to) in [(MapId::Field, MapId::Village), (MapId::Campus, MapId::Field)] {
            let mut p = player_at(from, -5, 300);
            assert_eq!(resolve_map_transition(&mut p, &cfg), Transition::Entered(to));
            assert_eq!(p.map, to);
            assert_eq!(p.pos.x, 790);
        }
    }

    #[test]
    fn left_edge_of_village_is_dead_end() {
        let cfg = WorldConfig::default();
        let mut p = player_at(MapId::Village, -5, 300);
        assert_eq!(resolve_map_transition(&mut p, &cfg), Transition::DeadEnd);
        assert_eq!(p.map, MapId::Village);
        assert_eq!(p.pos.x, 0);
    }

    #[test]
    fn in_bounds_is_noop() {
        let cfg = WorldConfig::default();
        for x in [0, 1, 400, cfg.screen_width] {
            for map in MapId::ALL {
                let mut p = player_at(map, x, 300);
                assert_eq!(resolve_map_transition(&mut p, &cfg), Transition::None);
                assert_eq!(p.map, map);
                assert_eq!(p.pos.x, x);
            }
        }
    }

    #[test]
    fn walking_the_whole_chain() {
        let cfg = WorldConfig::default();
        let mut p = player_at(MapId::Village, 50, 300);
        let mut entered = vec![];
        for _ in 0..400 {
            apply_movement(&mut p, MoveSet::of(&[MoveDir::Right]));
            if let Transition::Entered(m) = resolve_map_transition(&mut p, &cfg) {
                entered.push(m);
            }
        }
        assert_eq!(entered, vec![MapId::Field, MapId::Campus]);
        assert!(p.pos.x <= cfg.screen_width);
    }

    // ── Encounters ──

    #[test]
    fn encounter_requires_movement_and_field() {
        let cfg = EncounterConfig::default();
        let mut always = FixedRoll(0);
        let field = player_at(MapId::Field, 300, 300);
        assert_eq!(maybe_trigger_encounter(&field, false, &cfg, &mut always), EncounterOutcome::None);
        assert_eq!(maybe_trigger_encounter(&field, true, &cfg, &mut always), EncounterOutcome::Regular);

        for map in [MapId::Village, MapId::Campus] {
            let p = player_at(map, 300, 300);
            assert_eq!(maybe_trigger_encounter(&p, true, &cfg, &mut always), EncounterOutcome::None);
        }
    }

    #[test]
    fn encounter_threshold_is_strict() {
        let cfg = EncounterConfig::default(); // chance 1 of 100
        let field = player_at(MapId::Field, 300, 300);
        assert_eq!(maybe_trigger_encounter(&field, true, &cfg, &mut FixedRoll(1)), EncounterOutcome::None);
        assert_eq!(maybe_trigger_encounter(&field, true, &cfg, &mut FixedRoll(99)), EncounterOutcome::None);
    }

    #[test]
    fn encounter_rate_is_roughly_one_percent() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(2024);
        let cfg = EncounterConfig::default();
        let field = player_at(MapId::Field, 300, 300);
        let hits = (0..20_000)
            .filter(|_| maybe_trigger_encounter(&field, true, &cfg, &mut rng) == EncounterOutcome::Regular)
            .count();
        assert!((100..=300).contains(&hits), "hits = {hits}");
    }

    // ── Boss ──

    #[test]
    fn boss_zone_only_on_campus_past_threshold() {
        let cfg = EncounterConfig::default();
        assert!(maybe_trigger_boss(&player_at(MapId::Campus, 701, 300), &cfg));
        assert!(!maybe_trigger_boss(&player_at(MapId::Campus, 700, 300), &cfg));
        assert!(!maybe_trigger_boss(&player_at(MapId::Field, 760, 300), &cfg));
        assert!(!maybe_trigger_boss(&player_at(MapId::Village, 760, 300), &cfg));
    }
}
