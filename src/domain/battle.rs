/// Battle rules: start, attack, resolve.
///
/// Combat is one-sided: the player attacks, the enemy never strikes back.
/// A battle ends the tick the enemy's hit points first reach zero or below.

use crate::config::BattleConfig;
use super::entity::Battle;
use super::rng::RandomSource;

pub const REGULAR_INTRO: &str = "An unsubmitted assignment appeared!";
pub const BOSS_INTRO: &str = "The credit-stealing syndicate appeared!";
pub const ATTACK_PROMPT: &str = "Press SPACE to attack!";

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AttackResult {
    Continuing,
    EnemyDefeated,
}

/// Where the game goes after an attack.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BattleEnd {
    /// Enemy still standing.
    Ongoing,
    /// Regular enemy down: back to the map after the grace period.
    ReturnToMap,
    /// Boss down: the game is over.
    Ending,
}

pub fn start_battle(is_boss: bool, cfg: &BattleConfig) -> Battle {
    Battle {
        enemy_hp: if is_boss { cfg.boss_hp } else { cfg.regular_hp },
        is_boss,
        message: if is_boss { BOSS_INTRO } else { REGULAR_INTRO }.to_string(),
        sub_message: ATTACK_PROMPT.to_string(),
    }
}

/// Roll damage in `[damage_min, damage_max]` and apply it. Hit points
/// are not clamped, so the display shows the raw (possibly negative) value.
/// Returns the damage dealt alongside the result.
pub fn apply_attack(
    battle: &mut Battle,
    cfg: &BattleConfig,
    rng: &mut impl RandomSource,
) -> (i32, AttackResult) {
    let damage = rng.roll_inclusive(cfg.damage_min, cfg.damage_max);
    battle.enemy_hp -= damage;
    battle.message = format!("Koukaton attacks! {damage} damage!");
    let result = if battle.enemy_hp <= 0 {
        AttackResult::EnemyDefeated
    } else {
        AttackResult::Continuing
    };
    (damage, result)
}

pub fn resolve_battle_end(battle: &Battle, result: AttackResult) -> BattleEnd {
    match result {
        AttackResult::Continuing => BattleEnd::Ongoing,
        AttackResult::EnemyDefeated if battle.is_boss => BattleEnd::Ending,
        AttackResult::EnemyDefeated => BattleEnd::ReturnToMap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rng::FixedRoll;

    #[test]
    fn regular_battle_setup() {
        let b = start_battle(false, &BattleConfig::default());
        assert_eq!(b.enemy_hp, 100);
        assert!(!b.is_boss);
        assert_eq!(b.message, REGULAR_INTRO);
        assert_eq!(b.sub_message, ATTACK_PROMPT);
    }

    #[test]
    fn boss_battle_setup() {
        let b = start_battle(true, &BattleConfig::default());
        assert_eq!(b.enemy_hp, 500);
        assert!(b.is_boss);
        assert_eq!(b.message, BOSS_INTRO);
    }

    #[test]
    fn three_max_hits_overkill_regular() {
        let cfg = BattleConfig::default();
        let mut b = start_battle(false, &cfg);
        let mut rng = FixedRoll(60);

        assert_eq!(apply_attack(&mut b, &cfg, &mut rng), (60, AttackResult::Continuing));
        assert_eq!(b.enemy_hp, 40);
        assert_eq!(b.message, "Koukaton attacks! 60 damage!");

        assert_eq!(apply_attack(&mut b, &cfg, &mut rng), (60, AttackResult::EnemyDefeated));
        assert_eq!(b.enemy_hp, -20);

        // A third blow keeps subtracting; hp is never clamped.
        assert_eq!(apply_attack(&mut b, &cfg, &mut rng), (60, AttackResult::EnemyDefeated));
        assert_eq!(b.enemy_hp, -80);
    }

    #[test]
    fn exactly_zero_is_defeat() {
        let cfg = BattleConfig { regular_hp: 60, ..BattleConfig::default() };
        let mut b = start_battle(false, &cfg);
        let (_, result) = apply_attack(&mut b, &cfg, &mut FixedRoll(60));
        assert_eq!(b.enemy_hp, 0);
        assert_eq!(result, AttackResult::EnemyDefeated);
    }

    #[test]
    fn end_routes_by_enemy_kind() {
        let cfg = BattleConfig::default();
        let regular = start_battle(false, &cfg);
        let boss = start_battle(true, &cfg);
        assert_eq!(resolve_battle_end(&regular, AttackResult::Continuing), BattleEnd::Ongoing);
        assert_eq!(resolve_battle_end(&regular, AttackResult::EnemyDefeated), BattleEnd::ReturnToMap);
        assert_eq!(resolve_battle_end(&boss, AttackResult::Continuing), BattleEnd::Ongoing);
        assert_eq!(resolve_battle_end(&boss, AttackResult::EnemyDefeated), BattleEnd::Ending);
    }

    #[test]
    fn boss_needs_at_least_nine_hits() {
        use rand::SeedableRng;
        let cfg = BattleConfig::default();
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        let mut b = start_battle(true, &cfg);
        let mut hits = 0;
        loop {
            hits += 1;
            let (damage, result) = apply_attack(&mut b, &cfg, &mut rng);
            assert!((30..=60).contains(&damage));
            if result == AttackResult::EnemyDefeated { break; }
        }
        // 500 hp at 30..=60 per hit
        assert!((9..=17).contains(&hits), "hits = {hits}");
    }
}
