pub mod frozen_lake;
pub mod gym_adapter;
#[cfg(test)]
pub mod simple_golf;
pub mod simulator;

use crate::Result;
use gymnasium::Discrete;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub next_state: Discrete,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
}

impl StepOutcome {
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// Episodic environment with discrete observation and action spaces.
pub trait Env {
    fn name(&self) -> String;

    fn n_s(&self) -> usize;

    fn n_a(&self) -> usize;

    fn reset(&mut self) -> Result<Discrete>;

    fn step(&mut self, a: Discrete) -> Result<StepOutcome>;

    fn sample_action(&mut self) -> Result<Discrete>;
}
