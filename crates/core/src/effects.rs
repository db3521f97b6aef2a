use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EffectType {
    InnerQuiet,
    WasteNot,
    WasteNot2,
    Veneration,
    GreatStrides,
    Innovation,
    MuscleMemory,
    Manipulation,
    HeartAndSoul,
    TrainedPerfection,
    Expedience,
}

impl EffectType {
    pub const COUNT: usize = 11;

    pub const ALL: [EffectType; Self::COUNT] = [
        EffectType::InnerQuiet,
        EffectType::WasteNot,
        EffectType::WasteNot2,
        EffectType::Veneration,
        EffectType::GreatStrides,
        EffectType::Innovation,
        EffectType::MuscleMemory,
        EffectType::Manipulation,
        EffectType::HeartAndSoul,
        EffectType::TrainedPerfection,
        EffectType::Expedience,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Duration marker for effects that stay until something consumes them.
pub const INDEFINITE: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Effect {
    pub kind: EffectType,
    pub duration: u8,
    pub strength: u8,
}

impl Effect {
    pub fn new(kind: EffectType, duration: u8, strength: u8) -> Self {
        Self {
            kind,
            duration,
            strength,
        }
    }

    pub fn is_indefinite(&self) -> bool {
        self.duration == INDEFINITE
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
struct Slot {
    duration: u8,
    strength: u8,
    // Installed during the step currently being resolved; skipped by that step's tick.
    fresh: bool,
}

/// Active timed buffs, at most one entry per [`EffectType`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EffectTable {
    slots: [Option<Slot>; EffectType::COUNT],
}

impl EffectTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `kind`. A zero duration removes it.
    pub fn add(&mut self, kind: EffectType, duration: u8, strength: u8) {
        if duration == 0 {
            self.remove(kind);
            return;
        }
        self.slots[kind.index()] = Some(Slot {
            duration,
            strength,
            fresh: true,
        });
    }

    pub fn remove(&mut self, kind: EffectType) {
        self.slots[kind.index()] = None;
    }

    pub fn has(&self, kind: EffectType) -> bool {
        self.slots[kind.index()].is_some()
    }

    pub fn strength(&self, kind: EffectType) -> u8 {
        self.slots[kind.index()].map_or(0, |slot| slot.strength)
    }

    pub fn duration(&self, kind: EffectType) -> u8 {
        self.slots[kind.index()].map_or(0, |slot| slot.duration)
    }

    pub fn get(&self, kind: EffectType) -> Option<Effect> {
        self.slots[kind.index()].map(|slot| Effect::new(kind, slot.duration, slot.strength))
    }

    /// True when `kind` was installed during the step that has not ticked yet.
    pub fn is_fresh(&self, kind: EffectType) -> bool {
        self.slots[kind.index()].is_some_and(|slot| slot.fresh)
    }

    /// Adds `amount` to the strength of a stacking effect, installing it
    /// indefinitely when absent. Strength never exceeds `cap`.
    pub fn strengthen(&mut self, kind: EffectType, amount: u8, cap: u8) {
        let slot = &mut self.slots[kind.index()];
        match slot {
            Some(active) => {
                active.strength = active.strength.saturating_add(amount).min(cap);
            }
            None => {
                *slot = Some(Slot {
                    duration: INDEFINITE,
                    strength: amount.min(cap),
                    fresh: true,
                });
            }
        }
    }

    /// Advances every finite effect by one completed step.
    pub fn tick(&mut self) {
        for slot in self.slots.iter_mut() {
            let Some(active) = slot.as_mut() else {
                continue;
            };
            if active.fresh {
                active.fresh = false;
                continue;
            }
            if active.duration == INDEFINITE {
                continue;
            }
            active.duration = active.duration.saturating_sub(1);
            if active.duration == 0 {
                *slot = None;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Effect> + '_ {
        EffectType::ALL
            .iter()
            .filter_map(move |kind| self.get(*kind))
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}
