//! Turn-based monster duel rig
//!
//! The player picks an action, answers a question to land it, and the
//! monster strikes back after every turn. Player HP is the run's `lives`.

use serde::{Deserialize, Serialize};

use crate::rng::RandomSource;

pub const MAX_MP: u32 = 50;
pub const SKILL_MP_COST: u32 = 20;
pub const MP_REGEN: u32 = 5;
pub const HEAL_AMOUNT: u32 = 40;
pub const STARTING_POTIONS: u32 = 2;
pub const HP_PER_LEVEL: u32 = 10;

/// Player action opening a duel turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuelAction {
    Attack,
    Skill,
    Heal,
}

impl DuelAction {
    /// Score for landing the action, before the multiplier
    pub fn award(&self) -> f32 {
        match self {
            DuelAction::Skill => 20.0,
            _ => 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterKind {
    Slime,
    Goblin,
    Skeleton,
    Orc,
    Dragon,
}

impl MonsterKind {
    pub const ROSTER: [MonsterKind; 5] = [
        MonsterKind::Slime,
        MonsterKind::Goblin,
        MonsterKind::Skeleton,
        MonsterKind::Orc,
        MonsterKind::Dragon,
    ];

    /// Base `(hp, attack)`
    pub fn stats(&self) -> (u32, u32) {
        match self {
            MonsterKind::Slime => (50, 5),
            MonsterKind::Goblin => (80, 8),
            MonsterKind::Skeleton => (120, 12),
            MonsterKind::Orc => (180, 15),
            MonsterKind::Dragon => (300, 25),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub kind: MonsterKind,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
}

impl Monster {
    /// Roster cycles every five levels; each full cycle adds 50% to the stats
    pub fn for_level(level: u32) -> Self {
        let idx = (level.saturating_sub(1) % 5) as usize;
        let kind = MonsterKind::ROSTER[idx];
        let scale = 1.0 + (level.saturating_sub(1) / 5) as f32 * 0.5;
        let (hp, attack) = kind.stats();
        let max_hp = (hp as f32 * scale).round() as u32;
        Self {
            kind,
            hp: max_hp,
            max_hp,
            attack: (attack as f32 * scale).round() as u32,
        }
    }
}

/// What a landed action did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Damage(u32),
    Healed(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duel {
    pub level: u32,
    pub monster: Monster,
    pub mp: u32,
    pub potions: u32,
    /// Action waiting on the current question
    pub pending: Option<DuelAction>,
    pub victories: u32,
}

impl Default for Duel {
    fn default() -> Self {
        Self::new()
    }
}

impl Duel {
    pub fn new() -> Self {
        Self {
            level: 1,
            monster: Monster::for_level(1),
            mp: MAX_MP,
            potions: STARTING_POTIONS,
            pending: None,
            victories: 0,
        }
    }

    /// Whether the action can be opened right now
    pub fn can_use(&self, action: DuelAction) -> bool {
        self.pending.is_none()
            && match action {
                DuelAction::Attack => true,
                DuelAction::Skill => self.mp >= SKILL_MP_COST,
                DuelAction::Heal => self.potions > 0,
            }
    }

    /// Land `action`; healing returns the amount to add to the player's HP
    pub fn land<R: RandomSource>(&mut self, action: DuelAction, rng: &mut R) -> ActionOutcome {
        match action {
            DuelAction::Attack => {
                let dmg = rng.int_in(20, 29) as u32;
                self.monster.hp = self.monster.hp.saturating_sub(dmg);
                ActionOutcome::Damage(dmg)
            }
            DuelAction::Skill => {
                self.mp = self.mp.saturating_sub(SKILL_MP_COST);
                let dmg = rng.int_in(40, 59) as u32;
                self.monster.hp = self.monster.hp.saturating_sub(dmg);
                ActionOutcome::Damage(dmg)
            }
            DuelAction::Heal => {
                self.potions = self.potions.saturating_sub(1);
                ActionOutcome::Healed(HEAL_AMOUNT)
            }
        }
    }

    pub fn monster_defeated(&self) -> bool {
        self.monster.hp == 0
    }

    /// Next level: stronger monster, one more potion, full MP
    pub fn advance_level(&mut self) {
        self.victories += 1;
        self.level += 1;
        self.monster = Monster::for_level(self.level);
        self.mp = MAX_MP;
        self.potions += 1;
    }

    /// Monster strike: attack scaled by a random factor in [0.8, 1.2); MP regenerates
    pub fn enemy_turn<R: RandomSource>(&mut self, rng: &mut R) -> u32 {
        self.mp = (self.mp + MP_REGEN).min(MAX_MP);
        let factor = rng.float_in(0.8, 1.2);
        (self.monster.attack as f32 * factor).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::ScriptedSource;

    #[test]
    fn test_monster_scaling() {
        let slime = Monster::for_level(1);
        assert_eq!((slime.kind, slime.max_hp, slime.attack), (MonsterKind::Slime, 50, 5));
        let dragon = Monster::for_level(5);
        assert_eq!(dragon.kind, MonsterKind::Dragon);
        // Second cycle is 1.5x
        let slime2 = Monster::for_level(6);
        assert_eq!((slime2.kind, slime2.max_hp, slime2.attack), (MonsterKind::Slime, 75, 8));
    }

    #[test]
    fn test_skill_costs_mp() {
        let mut duel = Duel::new();
        let mut rng = ScriptedSource::new(&[45]);
        assert_eq!(duel.land(DuelAction::Skill, &mut rng), ActionOutcome::Damage(45));
        assert_eq!(duel.mp, MAX_MP - SKILL_MP_COST);
        assert_eq!(duel.monster.hp, 5);
        duel.mp = 10;
        assert!(!duel.can_use(DuelAction::Skill));
    }

    #[test]
    fn test_heal_uses_potions() {
        let mut duel = Duel::new();
        let mut rng = ScriptedSource::new(&[]);
        duel.land(DuelAction::Heal, &mut rng);
        duel.land(DuelAction::Heal, &mut rng);
        assert_eq!(duel.potions, 0);
        assert!(!duel.can_use(DuelAction::Heal));
    }

    #[test]
    fn test_level_up_restores() {
        let mut duel = Duel::new();
        duel.mp = 0;
        duel.advance_level();
        assert_eq!(duel.level, 2);
        assert_eq!(duel.monster.kind, MonsterKind::Goblin);
        assert_eq!(duel.mp, MAX_MP);
        assert_eq!(duel.potions, STARTING_POTIONS + 1);
    }

    #[test]
    fn test_enemy_turn_regenerates_mp() {
        let mut duel = Duel::new();
        duel.mp = 48;
        // Unit 0.5 -> factor 1.0
        let mut rng = ScriptedSource::new(&[]);
        assert_eq!(duel.enemy_turn(&mut rng), 5);
        assert_eq!(duel.mp, MAX_MP);
    }
}
