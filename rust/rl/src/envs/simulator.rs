use super::{Env, StepOutcome};
use crate::algos::model_based::mdp::MdpShape;
use crate::{Error, Result};
use gymnasium::{Discrete, Transition, Transitions};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::rc::Rc;

pub trait Weighted {
    fn p(&self) -> f64;
}

impl Weighted for Transition {
    fn p(&self) -> f64 {
        self.probability
    }
}

/// Samples one item in proportion to its weight. `None` if the weights are
/// empty, negative or all zero.
pub fn pick_next<'a, T: Weighted>(rng: &mut StdRng, ts: &'a [T]) -> Option<&'a T> {
    let dist = WeightedIndex::new(ts.iter().map(|item| item.p())).ok()?;
    ts.get(dist.sample(rng))
}

/// Environment that plays out a known transition table.
#[derive(Debug)]
pub struct TransitionsSimulator {
    name: String,
    shape: MdpShape,
    transitions: Rc<Transitions>,
    start: Discrete,
    max_episode_steps: Option<usize>,
    rng: StdRng,
    state: Discrete,
    steps: usize,
}

impl TransitionsSimulator {
    pub fn new(
        name: &str,
        shape: MdpShape,
        transitions: Rc<Transitions>,
        start: Discrete,
        max_episode_steps: Option<usize>,
        seed: u64,
    ) -> Result<Self> {
        shape.check_state(start)?;

        Ok(Self {
            name: name.to_string(),
            shape,
            transitions,
            start,
            max_episode_steps,
            rng: StdRng::seed_from_u64(seed),
            state: start,
            steps: 0,
        })
    }

    pub fn state(&self) -> Discrete {
        self.state
    }
}

impl Env for TransitionsSimulator {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn n_s(&self) -> usize {
        self.shape.n_s
    }

    fn n_a(&self) -> usize {
        self.shape.n_a
    }

    fn reset(&mut self) -> Result<Discrete> {
        self.state = self.start;
        self.steps = 0;
        Ok(self.state)
    }

    fn step(&mut self, a: Discrete) -> Result<StepOutcome> {
        self.shape.check_action(a)?;

        let ts = self
            .transitions
            .get(&(self.state, a))
            .map(Vec::as_slice)
            .unwrap_or_default();
        let next = pick_next(&mut self.rng, ts).ok_or_else(|| {
            Error::Env(format!(
                "{}: no transition out of state {} with action {a}",
                self.name, self.state
            ))
        })?;

        self.state = next.next_state;
        self.steps += 1;

        Ok(StepOutcome {
            next_state: next.next_state,
            reward: next.reward,
            terminated: next.done,
            truncated: self.max_episode_steps.is_some_and(|m| self.steps >= m),
        })
    }

    fn sample_action(&mut self) -> Result<Discrete> {
        if self.shape.n_a == 0 {
            return Err(Error::InvalidConfiguration("action space is empty".into()));
        }
        Ok(self.rng.gen_range(0..self.shape.n_a) as Discrete)
    }
}
