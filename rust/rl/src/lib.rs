//! Tabular value iteration over an MDP whose dynamics are learned from
//! random exploration.

pub mod agent;
pub mod algos;
pub mod config;
pub mod envs;
mod error;

pub use algos::model_based::mdp::{
    experience::ExperienceModel,
    values::ValueTable,
    vi::{BackupOrder, ValueIteration},
    MdpShape, MdpSolver,
};
pub use error::{Error, Result};
