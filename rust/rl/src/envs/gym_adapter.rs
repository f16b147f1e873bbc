use super::{Env, StepOutcome};
use crate::{Error, Result};
use gymnasium::*;
use std::rc::Rc;

/// Drives a discrete gymnasium environment served over HTTP.
pub struct GymAdapter {
    name: String,
    env: Rc<Environment>,
    n_s: usize,
    n_a: usize,
    seed: Option<usize>,
}

impl GymAdapter {
    pub fn new(env: Rc<Environment>, seed: Option<usize>) -> Result<Self> {
        let name = env.name()?;
        let n_s = discrete_n(&name, "observation", env.observation_space())?;
        let n_a = discrete_n(&name, "action", env.action_space())?;

        Ok(Self {
            name,
            env,
            n_s,
            n_a,
            seed,
        })
    }
}

fn discrete_n(name: &str, what: &str, space: &ObsActSpace) -> Result<usize> {
    space
        .discrete_n()
        .map(|n| n as usize)
        .ok_or_else(|| Error::Env(format!("'{name}' is not an MDP: {what} space {space:?}")))
}

fn single_discrete(name: &str, what: &str, items: &[ObsActSpaceItem]) -> Result<Discrete> {
    match items {
        [ObsActSpaceItem::Discrete(x)] => Ok(*x),
        _ => Err(Error::Env(format!(
            "'{name}' returned a non discrete {what} {items:?}"
        ))),
    }
}

impl Env for GymAdapter {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn n_s(&self) -> usize {
        self.n_s
    }

    fn n_a(&self) -> usize {
        self.n_a
    }

    fn reset(&mut self) -> Result<Discrete> {
        // Only the first episode is seeded; later resets continue the server's stream.
        let obs = self.env.reset(self.seed.take())?;
        single_discrete(&self.name, "observation", &obs)
    }

    fn step(&mut self, a: Discrete) -> Result<StepOutcome> {
        let si = self.env.step(&[ObsActSpaceItem::Discrete(a)])?;

        Ok(StepOutcome {
            next_state: single_discrete(&self.name, "observation", &si.observation)?,
            reward: si.reward,
            terminated: si.terminated,
            truncated: si.truncated,
        })
    }

    fn sample_action(&mut self) -> Result<Discrete> {
        let a = self.env.action_space_sample()?;
        single_discrete(&self.name, "action", &a)
    }
}
