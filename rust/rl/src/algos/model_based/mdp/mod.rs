pub mod common;
pub mod experience;
pub mod values;
pub mod vi;

pub use common::*;

use gymnasium::Discrete;

/// Solver over a finite Markov Decision Process - Sutton & Barto 2018.
pub trait MdpSolver<T> {
    fn v_star(&self, s: Discrete) -> crate::Result<f64>;

    fn q_star(&self, s: Discrete, a: Discrete) -> crate::Result<f64>;

    fn pi_star(&self, s: Discrete) -> crate::Result<Discrete>;

    fn exec(&mut self, theta: f64, num_iterations: Option<usize>) -> crate::Result<(T, usize)>;
}
