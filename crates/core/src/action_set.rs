use crate::ActionType;
use serde::{Deserialize, Serialize};

/// Fixed-size bitset over the action catalog.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ActionSet {
    bits: u64,
}

impl ActionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(action: ActionType) -> Self {
        let mut set = Self::new();
        set.add(action);
        set
    }

    pub fn add(&mut self, action: ActionType) {
        self.bits |= 1u64 << action.index();
    }

    pub fn remove(&mut self, action: ActionType) {
        self.bits &= !(1u64 << action.index());
    }

    pub fn contains(&self, action: ActionType) -> bool {
        self.bits & (1u64 << action.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn is_subset_of(&self, other: &ActionSet) -> bool {
        self.bits & !other.bits == 0
    }

    /// Members in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = ActionType> + '_ {
        ActionType::ALL
            .iter()
            .copied()
            .filter(move |action| self.contains(*action))
    }

    pub fn to_vec(&self) -> Vec<ActionType> {
        self.iter().collect()
    }

    /// The `n`-th member in catalog order.
    pub fn nth(&self, n: usize) -> Option<ActionType> {
        self.iter().nth(n)
    }
}

impl FromIterator<ActionType> for ActionSet {
    fn from_iter<I: IntoIterator<Item = ActionType>>(iter: I) -> Self {
        let mut set = Self::new();
        for action in iter {
            set.add(action);
        }
        set
    }
}
