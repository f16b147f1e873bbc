use anyhow::Context;
use clap::Parser;
use gymnasium::Environment;
use itertools::Itertools;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vi_agent::agent::Agent;
use vi_agent::config::{Config, EnvConfig};
use vi_agent::envs::{frozen_lake::FrozenLake, gym_adapter::GymAdapter, Env};

/// Learns FrozenLake by random exploration and value iteration.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file. Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    gamma: Option<f64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Built-in local map, `4x4` or `8x8`. Passed as `map_name` to a
    /// FrozenLake gym env.
    #[arg(long)]
    map: Option<String>,

    /// Passed as `is_slippery` to a FrozenLake gym env.
    #[arg(long)]
    slippery: Option<bool>,

    /// Train against a gymnasium-http-api server instead of the local lake.
    #[arg(long)]
    gym_url: Option<String>,

    #[arg(long, default_value = "FrozenLake-v1", requires = "gym_url")]
    gym_env: String,

    #[arg(long)]
    max_iterations: Option<usize>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(gamma) = self.gamma {
            cfg.gamma = gamma;
        }
        if let Some(seed) = self.seed {
            cfg.seed = seed;
        }
        if let Some(max_iterations) = self.max_iterations {
            cfg.train.max_iterations = Some(max_iterations);
        }
        let from_flag = self.gym_url.is_some();
        if let Some(api_url) = self.gym_url {
            cfg.env = EnvConfig::Gym {
                api_url,
                env_id: self.gym_env,
                kwargs: Map::new(),
            };
        }

        match &mut cfg.env {
            EnvConfig::Local { map, slippery, .. } => {
                if let Some(m) = self.map {
                    *map = m;
                }
                if let Some(s) = self.slippery {
                    *slippery = s;
                }
            }
            EnvConfig::Gym { env_id, kwargs, .. } if env_id.starts_with("FrozenLake") => {
                if let Some(m) = self.map {
                    kwargs.insert("map_name".into(), Value::from(m));
                }
                if let Some(s) = self.slippery {
                    kwargs.insert("is_slippery".into(), Value::from(s));
                }
                if from_flag {
                    kwargs
                        .entry("map_name")
                        .or_insert_with(|| Value::from("8x8"));
                }
            }
            EnvConfig::Gym { env_id, .. } => {
                if self.map.is_some() || self.slippery.is_some() {
                    anyhow::bail!("--map and --slippery only apply to FrozenLake, not {env_id}");
                }
            }
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

fn run<E: Env, T: Env>(explore: E, mut test: T, cfg: &Config) -> anyhow::Result<()> {
    info!(env = %explore.name(), n_s = explore.n_s(), n_a = explore.n_a(), "training");

    let mut agent = Agent::new(explore, cfg.gamma, cfg.backup_order)?;
    let report = agent.train(&mut test, &cfg.train)?;
    info!(
        iterations = report.iterations,
        best_reward = report.best_reward,
        solved = report.solved,
        "done"
    );

    let policy = agent.engine().policy()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("policy: [{}]", policy.iter().join(", "));

    Ok(())
}

fn gym_env(
    api_url: &str,
    env_id: &str,
    kwargs: &[(&str, Value)],
    seed: u64,
) -> anyhow::Result<GymAdapter> {
    let env = Environment::new(api_url, env_id, None, None, None, kwargs)
        .with_context(|| format!("creating {env_id} on {api_url}"))?;
    Ok(GymAdapter::new(Rc::new(env), Some(seed as usize))?)
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = Args::parse().into_config()?;

    match &cfg.env {
        EnvConfig::Local {
            map,
            slippery,
            max_episode_steps,
        } => {
            let lake = FrozenLake::from_map_name(map, *slippery)?;
            let max_steps = max_episode_steps.unwrap_or(lake.default_max_episode_steps());
            let explore = lake.simulator(Some(max_steps), cfg.seed)?;
            let test = lake.simulator(Some(max_steps), cfg.seed.wrapping_add(1))?;
            run(explore, test, &cfg)
        }
        EnvConfig::Gym {
            api_url,
            env_id,
            kwargs,
        } => {
            let kwargs = kwargs
                .iter()
                .map(|(k, v)| (k.as_str(), v.clone()))
                .collect::<Vec<_>>();
            let explore = gym_env(api_url, env_id, &kwargs, cfg.seed)?;
            let test = gym_env(api_url, env_id, &kwargs, cfg.seed.wrapping_add(1))?;
            run(explore, test, &cfg)
        }
    }
}
