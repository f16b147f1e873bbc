use crate::{Error, Result};
use gymnasium::Discrete;
use std::ops::Range;

/// Sizes of the state and action spaces. Both are `0..n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdpShape {
    pub n_s: usize,
    pub n_a: usize,
}

impl MdpShape {
    pub fn new(n_s: usize, n_a: usize) -> Self {
        Self { n_s, n_a }
    }

    pub fn check_state(&self, s: Discrete) -> Result<()> {
        check("state", s, self.n_s)
    }

    pub fn check_action(&self, a: Discrete) -> Result<()> {
        check("action", a, self.n_a)
    }

    pub fn states(&self) -> Range<Discrete> {
        0..self.n_s as Discrete
    }

    pub fn actions(&self) -> Range<Discrete> {
        0..self.n_a as Discrete
    }
}

fn check(what: &'static str, index: Discrete, len: usize) -> Result<()> {
    if index < 0 || index as usize >= len {
        return Err(Error::OutOfRange { what, index, len });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateAction {
    pub s: Discrete,
    pub a: Discrete,
}

impl StateAction {
    pub fn new(s: Discrete, a: Discrete) -> Self {
        Self { s, a }
    }
}

/// `(state, action, next_state)` key of the reward table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sas {
    pub s: Discrete,
    pub a: Discrete,
    pub s_next: Discrete,
}

impl Sas {
    pub fn new(s: Discrete, a: Discrete, s_next: Discrete) -> Self {
        Self { s, a, s_next }
    }
}
