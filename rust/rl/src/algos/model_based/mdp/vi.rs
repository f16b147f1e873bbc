//! Value iteration over the empirical model.
//!
//! Every sweep recomputes `Q(s, a)` for all pairs from scratch:
//!
//! `Q(s, a) = sum_{s'} P(s'|s, a) [ R(s, a, s') + gamma * Q(s', pi(s')) ]`
//!
//! where `P` and `R` come from the [`ExperienceModel`] and `pi` is the greedy
//! policy. A pair that was never tried gets 0.

use super::{
    experience::ExperienceModel, values::ValueTable, MdpShape, MdpSolver, Sas, StateAction,
};
use crate::{Error, Result};
use gymnasium::{Continous, Discrete};
use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// Which table the Bellman step reads during a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupOrder {
    /// Gauss-Seidel: reads see values already written earlier in the same sweep.
    #[default]
    InPlace,
    /// Jacobi: reads see the table as it was when the sweep started.
    DoubleBuffered,
}

#[derive(Debug, Clone)]
pub struct ValueIteration {
    gamma: f64,
    order: BackupOrder,
    model: ExperienceModel,
    values: ValueTable,
}

impl ValueIteration {
    pub fn new(shape: MdpShape, gamma: f64, order: BackupOrder) -> Result<Self> {
        if !(gamma > 0. && gamma < 1.) {
            return Err(Error::InvalidConfiguration(format!(
                "discount factor must be in (0, 1), got {gamma}"
            )));
        }

        Ok(Self {
            gamma,
            order,
            model: ExperienceModel::new(shape),
            values: ValueTable::new(shape),
        })
    }

    pub fn shape(&self) -> MdpShape {
        self.model.shape()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn order(&self) -> BackupOrder {
        self.order
    }

    pub fn model(&self) -> &ExperienceModel {
        &self.model
    }

    pub fn values(&self) -> &ValueTable {
        &self.values
    }

    pub fn ingest(
        &mut self,
        s: Discrete,
        a: Discrete,
        s_next: Discrete,
        reward: Continous,
    ) -> Result<()> {
        self.model.ingest(s, a, s_next, reward)
    }

    /// Greedy action for `s`. Ties go to the lowest action index.
    pub fn select_action(&self, s: Discrete) -> Result<Discrete> {
        self.best(s).map(|(a, _)| a)
    }

    /// `max_a Q(s, a)`.
    pub fn state_value(&self, s: Discrete) -> Result<f64> {
        self.best(s).map(|(_, v)| v)
    }

    /// Greedy action of every state, indexed by state.
    pub fn policy(&self) -> Result<Vec<Discrete>> {
        self.shape()
            .states()
            .map(|s| self.select_action(s))
            .collect()
    }

    pub fn run_backup_sweep(&mut self) {
        let shape = self.shape();
        let snapshot = match self.order {
            BackupOrder::InPlace => None,
            BackupOrder::DoubleBuffered => Some(self.values.clone()),
        };

        for (s, a) in iproduct!(shape.states(), shape.actions()) {
            let sa = StateAction::new(s, a);
            let source = snapshot.as_ref().unwrap_or(&self.values);
            let q = self
                .model
                .distribution(sa)
                .into_iter()
                .map(|(s_next, p)| {
                    let v_next = greedy(source, shape, s_next).map_or(0., |(_, v)| v);
                    p * (self.model.reward_of(Sas::new(s, a, s_next)) + self.gamma * v_next)
                })
                .sum::<f64>();
            self.values.put(sa, q);
        }
    }

    /// Sweeps until no action-value moves by more than `theta`, or until
    /// `max_sweeps`. Returns whether it settled and the number of sweeps run.
    pub fn sweep_until_stable(
        &mut self,
        theta: f64,
        max_sweeps: Option<usize>,
    ) -> Result<(bool, usize)> {
        if !(theta >= 0. && theta.is_finite()) {
            return Err(Error::InvalidConfiguration(format!(
                "theta must be finite and non-negative, got {theta}"
            )));
        }

        let mut n = 0;
        loop {
            if max_sweeps.is_some_and(|m| n >= m) {
                return Ok((false, n));
            }

            let before = self.values.clone();
            self.run_backup_sweep();
            n += 1;

            if self.values.max_abs_diff(&before) <= theta {
                return Ok((true, n));
            }
        }
    }

    fn best(&self, s: Discrete) -> Result<(Discrete, f64)> {
        let shape = self.shape();
        shape.check_state(s)?;

        greedy(&self.values, shape, s)
            .ok_or_else(|| Error::InvalidConfiguration("action space is empty".into()))
    }
}

fn greedy(values: &ValueTable, shape: MdpShape, s: Discrete) -> Option<(Discrete, f64)> {
    let mut best: Option<(Discrete, f64)> = None;
    for a in shape.actions() {
        let q = values.get_or_default(StateAction::new(s, a));
        if best.map_or(true, |(_, v)| v < q) {
            best = Some((a, q));
        }
    }

    best
}

impl MdpSolver<bool> for ValueIteration {
    fn v_star(&self, s: Discrete) -> Result<f64> {
        self.state_value(s)
    }

    fn q_star(&self, s: Discrete, a: Discrete) -> Result<f64> {
        self.values.get(s, a)
    }

    fn pi_star(&self, s: Discrete) -> Result<Discrete> {
        self.select_action(s)
    }

    fn exec(&mut self, theta: f64, num_iterations: Option<usize>) -> Result<(bool, usize)> {
        self.sweep_until_stable(theta, num_iterations)
    }
}
