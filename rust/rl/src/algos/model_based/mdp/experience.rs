//! Empirical model of an unknown MDP, accumulated from observed transitions.

use super::{MdpShape, Sas, StateAction};
use crate::Result;
use gymnasium::{Continous, Discrete};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct ExperienceModel {
    shape: MdpShape,
    /// Last observed reward per `(s, a, s')`.
    rewards: HashMap<Sas, Continous>,
    /// Visit counts of `s'` per `(s, a)`. Ordered so that sweeps are reproducible.
    transits: HashMap<StateAction, BTreeMap<Discrete, u64>>,
}

impl ExperienceModel {
    pub fn new(shape: MdpShape) -> Self {
        Self {
            shape,
            rewards: HashMap::new(),
            transits: HashMap::new(),
        }
    }

    pub fn shape(&self) -> MdpShape {
        self.shape
    }

    /// Records one observed transition. The reward of a repeated `(s, a, s')`
    /// overwrites the previous one.
    pub fn ingest(
        &mut self,
        s: Discrete,
        a: Discrete,
        s_next: Discrete,
        reward: Continous,
    ) -> Result<()> {
        self.check(s, a)?;
        self.shape.check_state(s_next)?;

        self.rewards.insert(Sas::new(s, a, s_next), reward);
        *self
            .transits
            .entry(StateAction::new(s, a))
            .or_default()
            .entry(s_next)
            .or_default() += 1;

        Ok(())
    }

    /// Last observed reward for `(s, a, s')`, 0 if never observed.
    pub fn reward(&self, s: Discrete, a: Discrete, s_next: Discrete) -> Result<Continous> {
        self.check(s, a)?;
        self.shape.check_state(s_next)?;

        Ok(self.reward_of(Sas::new(s, a, s_next)))
    }

    pub fn count(&self, s: Discrete, a: Discrete, s_next: Discrete) -> Result<u64> {
        self.check(s, a)?;
        self.shape.check_state(s_next)?;

        Ok(self
            .transits
            .get(&StateAction::new(s, a))
            .and_then(|c| c.get(&s_next))
            .copied()
            .unwrap_or_default())
    }

    /// Number of times `a` was taken from `s`.
    pub fn total(&self, s: Discrete, a: Discrete) -> Result<u64> {
        self.check(s, a)?;

        Ok(self
            .transits
            .get(&StateAction::new(s, a))
            .map(|c| c.values().sum())
            .unwrap_or_default())
    }

    /// `(s', P(s'|s, a))` estimated from counts, ordered by `s'`. Empty when
    /// `(s, a)` has never been tried.
    pub fn empirical_transition_distribution(
        &self,
        s: Discrete,
        a: Discrete,
    ) -> Result<Vec<(Discrete, f64)>> {
        self.check(s, a)?;

        Ok(self.distribution(StateAction::new(s, a)))
    }

    pub(super) fn reward_of(&self, key: Sas) -> Continous {
        self.rewards.get(&key).copied().unwrap_or_default()
    }

    pub(super) fn distribution(&self, sa: StateAction) -> Vec<(Discrete, f64)> {
        let Some(counts) = self.transits.get(&sa) else {
            return vec![];
        };

        let total = counts.values().sum::<u64>() as f64;
        counts
            .iter()
            .map(|(&s_next, &c)| (s_next, c as f64 / total))
            .collect()
    }

    fn check(&self, s: Discrete, a: Discrete) -> Result<()> {
        self.shape.check_state(s)?;
        self.shape.check_action(a)
    }
}
