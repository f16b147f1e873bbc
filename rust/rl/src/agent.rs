//! Exploration and evaluation loop around [`ValueIteration`].

use crate::config::TrainConfig;
use crate::envs::Env;
use crate::{BackupOrder, MdpShape, Result, ValueIteration};
use gymnasium::Discrete;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainReport {
    pub iterations: usize,
    pub best_reward: f64,
    pub last_reward: f64,
    pub solved: bool,
}

/// Learns a model of `env` by acting at random and plans on it.
pub struct Agent<E: Env> {
    env: E,
    engine: ValueIteration,
    state: Discrete,
}

impl<E: Env> Agent<E> {
    pub fn new(mut env: E, gamma: f64, order: BackupOrder) -> Result<Self> {
        let engine = ValueIteration::new(MdpShape::new(env.n_s(), env.n_a()), gamma, order)?;
        let state = env.reset()?;

        Ok(Self { env, engine, state })
    }

    pub fn engine(&self) -> &ValueIteration {
        &self.engine
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn select_action(&self, s: Discrete) -> Result<Discrete> {
        self.engine.select_action(s)
    }

    /// Takes `count` random actions, feeding every transition to the model.
    pub fn play_random_steps(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let a = self.env.sample_action()?;
            let o = self.env.step(a)?;
            self.engine.ingest(self.state, a, o.next_state, o.reward)?;

            self.state = if o.done() {
                self.env.reset()?
            } else {
                o.next_state
            };
        }

        Ok(())
    }

    /// Plays one greedy episode on `env` and returns its total reward. The
    /// transitions seen on the way are learned from too.
    pub fn play_episode<T: Env>(&mut self, env: &mut T) -> Result<f64> {
        let mut total = 0.;
        let mut s = env.reset()?;
        loop {
            let a = self.engine.select_action(s)?;
            let o = env.step(a)?;
            self.engine.ingest(s, a, o.next_state, o.reward)?;
            total += o.reward;

            if o.done() {
                return Ok(total);
            }
            s = o.next_state;
        }
    }

    /// Explores, backs up and evaluates until the average test reward beats
    /// `cfg.solve_threshold` or `cfg.max_iterations` runs out.
    pub fn train<T: Env>(&mut self, test_env: &mut T, cfg: &TrainConfig) -> Result<TrainReport> {
        cfg.validate()?;

        let mut report = TrainReport {
            iterations: 0,
            best_reward: 0.,
            last_reward: 0.,
            solved: false,
        };

        while cfg.max_iterations.map_or(true, |m| report.iterations < m) {
            report.iterations += 1;
            self.play_random_steps(cfg.random_steps)?;
            self.engine.run_backup_sweep();

            let mut reward = 0.;
            for _ in 0..cfg.test_episodes {
                reward += self.play_episode(test_env)?;
            }
            reward /= cfg.test_episodes as f64;
            report.last_reward = reward;
            debug!(iteration = report.iterations, reward, "evaluated");

            if reward > report.best_reward {
                info!(
                    "Best reward updated {:.3} -> {:.3}",
                    report.best_reward, reward
                );
                report.best_reward = reward;
            }
            if reward > cfg.solve_threshold {
                info!("Solved in {} iterations", report.iterations);
                report.solved = true;
                break;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::{frozen_lake::FrozenLake, simulator::TransitionsSimulator, StepOutcome};
    use crate::Error;
    use float_eq::*;

    fn lake(seed: u64) -> TransitionsSimulator {
        FrozenLake::from_map_name("4x4", false)
            .unwrap()
            .simulator(Some(100), seed)
            .unwrap()
    }

    #[test]
    fn random_steps_are_all_counted() {
        let agent = &mut Agent::new(lake(1), 0.9, BackupOrder::InPlace).unwrap();
        agent.play_random_steps(250).unwrap();

        let m = agent.engine().model();
        let total = itertools::iproduct!(0..16, 0..4)
            .map(|(s, a)| m.total(s, a).unwrap())
            .sum::<u64>();
        assert_eq!(total, 250);
    }

    #[test]
    fn greedy_episode_is_ingested() {
        let agent = &mut Agent::new(lake(1), 0.9, BackupOrder::InPlace).unwrap();

        // All values are 0 so the agent keeps walking left into the wall
        // until the step limit.
        let reward = agent.play_episode(&mut lake(2)).unwrap();

        assert_float_eq!(reward, 0., abs <= 1e-12);
        assert_eq!(agent.engine().model().count(0, 0, 0).unwrap(), 100);
    }

    #[test]
    fn solves_deterministic_lake() {
        let agent = &mut Agent::new(lake(3), 0.9, BackupOrder::InPlace).unwrap();
        let cfg = TrainConfig {
            max_iterations: Some(500),
            ..Default::default()
        };

        let report = agent.train(&mut lake(4), &cfg).unwrap();

        assert!(report.solved);
        assert_float_eq!(report.last_reward, 1., abs <= 1e-12);
        assert_float_eq!(report.best_reward, 1., abs <= 1e-12);
        assert!(report.iterations <= 500);
        assert_float_eq!(agent.play_episode(&mut lake(5)).unwrap(), 1., abs <= 1e-12);
    }

    #[test]
    fn train_honours_iteration_budget() {
        let agent = &mut Agent::new(lake(3), 0.9, BackupOrder::InPlace).unwrap();
        let cfg = TrainConfig {
            random_steps: 1,
            test_episodes: 1,
            solve_threshold: 2.,
            max_iterations: Some(3),
        };

        let report = agent.train(&mut lake(4), &cfg).unwrap();

        assert!(!report.solved);
        assert_eq!(report.iterations, 3);
    }

    struct Broken;

    impl Env for Broken {
        fn name(&self) -> String {
            "broken".into()
        }

        fn n_s(&self) -> usize {
            2
        }

        fn n_a(&self) -> usize {
            1
        }

        fn reset(&mut self) -> Result<Discrete> {
            Ok(0)
        }

        fn step(&mut self, _a: Discrete) -> Result<StepOutcome> {
            Ok(StepOutcome {
                next_state: 7,
                reward: 0.,
                terminated: false,
                truncated: false,
            })
        }

        fn sample_action(&mut self) -> Result<Discrete> {
            Ok(0)
        }
    }

    #[test]
    fn out_of_range_observation_is_propagated() {
        let agent = &mut Agent::new(Broken, 0.9, BackupOrder::InPlace).unwrap();

        assert!(matches!(
            agent.play_random_steps(1),
            Err(Error::OutOfRange { what: "state", index: 7, .. })
        ));
    }
}
