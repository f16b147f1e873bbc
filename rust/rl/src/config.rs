use crate::{envs::frozen_lake::FrozenLake, BackupOrder, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gamma: f64,
    pub backup_order: BackupOrder,
    pub seed: u64,
    pub train: TrainConfig,
    pub env: EnvConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gamma: 0.9,
            backup_order: BackupOrder::default(),
            seed: 2718,
            train: TrainConfig::default(),
            env: EnvConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gamma > 0. && self.gamma < 1.) {
            return Err(Error::InvalidConfiguration(format!(
                "gamma must be in (0, 1), got {}",
                self.gamma
            )));
        }
        self.train.validate()?;
        if let EnvConfig::Local { map, .. } = &self.env {
            FrozenLake::from_map_name(map, true)?;
        }
        Ok(())
    }
}

/// Outer loop of exploration, backup and evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Random exploration steps per iteration.
    pub random_steps: usize,
    /// Greedy episodes averaged to score an iteration.
    pub test_episodes: usize,
    /// Average reward above which the task counts as solved.
    pub solve_threshold: f64,
    /// `None` trains until solved.
    pub max_iterations: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            random_steps: 100,
            test_episodes: 20,
            solve_threshold: 0.8,
            max_iterations: None,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        if self.random_steps == 0 || self.test_episodes == 0 {
            return Err(Error::InvalidConfiguration(
                "random_steps and test_episodes must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EnvConfig {
    /// In-process FrozenLake.
    Local {
        #[serde(default = "default_map")]
        map: String,
        #[serde(default = "default_slippery")]
        slippery: bool,
        #[serde(default)]
        max_episode_steps: Option<usize>,
    },
    /// Environment hosted by a gymnasium-http-api server.
    Gym {
        api_url: String,
        env_id: String,
        #[serde(default)]
        kwargs: Map<String, Value>,
    },
}

impl Default for EnvConfig {
    fn default() -> Self {
        EnvConfig::Local {
            map: default_map(),
            slippery: default_slippery(),
            max_episode_steps: None,
        }
    }
}

fn default_map() -> String {
    "8x8".into()
}

fn default_slippery() -> bool {
    true
}
