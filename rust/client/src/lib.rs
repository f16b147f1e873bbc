pub mod common;
mod error;

pub use common::defs::*;
pub use error::{Error, Result};

use itertools::iproduct;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::ser::Serialize;
use serde_json::{to_value, Map, Value};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;
use value_extensions::*;

#[derive(Debug, Clone, PartialEq)]
pub enum ObsActSpaceItem {
    Discrete(Discrete),
    Continous(Continous),
}

impl ObsActSpaceItem {
    pub fn discrete_value(&self) -> Option<Discrete> {
        if let Self::Discrete(n) = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn box_value(&self) -> Option<Continous> {
        if let Self::Continous(n) = self {
            Some(*n)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObsActSpace {
    /// Refer: https://www.gymlibrary.dev/api/spaces/#discrete
    Discrete { n: Discrete },

    /// Refer: https://www.gymlibrary.dev/api/spaces/#box
    Box {
        shape: Vec<Discrete>,
        high: Vec<Continous>,
        low: Vec<Continous>,
    },
}

impl ObsActSpace {
    pub fn from_json(info: &Map<String, Value>) -> Result<Self> {
        let name = info
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Malformed("name".into()))?;

        match name {
            "Discrete" => Ok(ObsActSpace::Discrete {
                n: as_discrete(field(info, "n"), "n")?,
            }),
            "Box" => Ok(ObsActSpace::Box {
                shape: as_discrete_item_vec(field(info, "shape"), "shape")?,
                high: as_continous_item_vec(field(info, "high"), "high")?,
                low: as_continous_item_vec(field(info, "low"), "low")?,
            }),
            e => Err(Error::UnsupportedSpace(e.to_string())),
        }
    }

    /// Number of elements of a discrete space, `None` for any other space.
    pub fn discrete_n(&self) -> Option<Discrete> {
        if let ObsActSpace::Discrete { n } = self {
            Some(*n)
        } else {
            None
        }
    }

    pub fn action_from_json(&self, val: &Value) -> Result<Vec<ObsActSpaceItem>> {
        match self {
            ObsActSpace::Discrete { .. } => Ok(vec![ObsActSpaceItem::Discrete(as_discrete(
                val, "action",
            )?)]),
            ObsActSpace::Box { .. } => Ok(as_continous_item_vec(val, "action")?
                .into_iter()
                .map(ObsActSpaceItem::Continous)
                .collect()),
        }
    }

    pub fn items_from_json(&self, vals: &[Value]) -> Result<Vec<ObsActSpaceItem>> {
        vals.iter()
            .map(|v| match self {
                ObsActSpace::Discrete { .. } => {
                    as_discrete(v, "observation").map(ObsActSpaceItem::Discrete)
                }
                ObsActSpace::Box { .. } => {
                    as_continous(v, "observation").map(ObsActSpaceItem::Continous)
                }
            })
            .collect()
    }

    fn action_to_json(&self, action: &[ObsActSpaceItem]) -> Result<Value> {
        match self {
            ObsActSpace::Discrete { .. } => match action {
                [ObsActSpaceItem::Discrete(a)] => Ok(to_value(a)?),
                _ => Err(Error::InvalidAction(
                    "discrete space expects exactly one discrete action".into(),
                )),
            },

            ObsActSpace::Box { shape, .. } => {
                if action.len() != shape.first().copied().unwrap_or_default() as usize {
                    return Err(Error::InvalidAction(
                        "box space expects as many actions as its shape".into(),
                    ));
                }
                let action = action
                    .iter()
                    .map(|a| {
                        a.box_value().ok_or_else(|| {
                            Error::InvalidAction("box space actions should all be f64".into())
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(to_value(action)?)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next_state: Discrete,
    pub probability: Continous,
    pub reward: f64,
    pub done: bool,
}

/// Known dynamics of a discrete environment, keyed by `(state, action)`.
pub type Transitions = HashMap<(Discrete, Discrete), Vec<Transition>>;

#[derive(Debug)]
pub struct StepInfo {
    pub observation: Vec<ObsActSpaceItem>,
    pub reward: f64,
    pub truncated: bool,
    pub terminated: bool,
    pub info: Value,
}

/// Create a gymnasium environment or get reference to an existing one.
/// NOTE: All APIs are sync for now as the server is expected to be local.
#[derive(Debug)]
pub struct Environment {
    client: Client,
    api_url: String,
    instance_id: String,
    obs_space: ObsActSpace,
    act_space: ObsActSpace,
}

impl Environment {
    pub fn new(
        api_url: &str,
        env_name: &str,
        max_episode_steps: Option<Discrete>,
        auto_reset: Option<bool>,
        disable_env_checker: Option<bool>,
        kwargs: &[(&str, Value)],
    ) -> Result<Self> {
        let mut body = HashMap::from([("env_id", to_value(env_name)?)]);

        if let Some(max_episode_steps) = max_episode_steps {
            body.insert("max_episode_steps", to_value(max_episode_steps)?);
        }

        if let Some(auto_reset) = auto_reset {
            body.insert("auto_reset", to_value(auto_reset)?);
        }

        if let Some(disable_env_checker) = disable_env_checker {
            body.insert("disable_env_checker", to_value(disable_env_checker)?);
        }

        let kwargs = kwargs.iter().cloned().collect::<HashMap<&str, Value>>();
        body.insert("kwargs", to_value(kwargs)?);

        let c = Client::new(api_url)?;
        let base_url = c.make_api_url("");
        let obj = c.http_post(&base_url, &body)?;
        let inst_id = as_str(&obj["instance_id"], "instance_id")?;

        Self::reference(api_url, inst_id)
    }

    pub fn reference(api_url: &str, instance_id: &str) -> Result<Self> {
        let client = Client::new(api_url)?;

        let url = client.make_api_url(&format!("{instance_id}/observation_space/"));
        let obj = client.http_get(&url)?;
        let obs_space = ObsActSpace::from_json(as_object(&obj["info"], "info")?)?;

        let url = client.make_api_url(&format!("{instance_id}/action_space/"));
        let obj = client.http_get(&url)?;
        let act_space = ObsActSpace::from_json(as_object(&obj["info"], "info")?)?;

        let env_api_url = client.make_api_url(&format!("{instance_id}/"));
        Ok(Self {
            client,
            api_url: env_api_url,
            instance_id: instance_id.to_string(),
            obs_space,
            act_space,
        })
    }

    pub fn client_base_url(&self) -> &str {
        self.client.base_url()
    }

    pub fn name(&self) -> Result<String> {
        let obj = self.client.http_get(&self.api_url)?;

        as_str(&obj["id"], "id").map(str::to_string)
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// The Space object corresponding to valid actions, all valid actions should be contained with the space.
    /// For example, if the action space is of type Discrete and gives the value Discrete(2), this means there
    /// are two valid discrete actions: 0 & 1.
    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.action_space
    pub fn action_space(&self) -> &ObsActSpace {
        &self.act_space
    }

    /// The Space object corresponding to valid observations.
    /// Refer: https://gymnasium.farama.org/api/env/#gymnasium.Env.observation_space
    pub fn observation_space(&self) -> &ObsActSpace {
        &self.obs_space
    }

    pub fn action_space_sample(&self) -> Result<Vec<ObsActSpaceItem>> {
        let url = self.make_api_url("action_space/sample/");
        let obj = self.client.http_get(&url)?;
        self.act_space.action_from_json(&obj["action"])
    }

    pub fn reset(&self, seed: Option<usize>) -> Result<Vec<ObsActSpaceItem>> {
        let mut body = HashMap::new();
        if let Some(seed) = seed {
            let _ = body.insert("seed", seed.to_string());
        }

        let url = self.make_api_url("reset/");
        let obj = self.client.http_post(&url, &body)?;
        let obs = as_array(&obj["observation"], "observation")?;
        self.obs_space.items_from_json(obs)
    }

    pub fn step(&self, action: &[ObsActSpaceItem]) -> Result<StepInfo> {
        let req = HashMap::from([("action", self.act_space.action_to_json(action)?)]);

        let url = self.make_api_url("step/");
        let obj = self.client.http_post(&url, &req)?;
        let observation = as_array(&obj["observation"], "observation")?;
        let observation = self.obs_space.items_from_json(observation)?;

        Ok(StepInfo {
            observation,
            reward: as_continous(&obj["reward"], "reward")?,
            truncated: as_bool(&obj["truncated"], "truncated")?,
            terminated: as_bool(&obj["terminated"], "terminated")?,
            info: obj["info"].clone(),
        })
    }

    pub fn transitions(&self) -> Result<Rc<Transitions>> {
        let url = self.make_api_url("transitions/");
        let obj = self.client.http_get(&url)?;

        match (self.observation_space(), self.action_space()) {
            (ObsActSpace::Discrete { n: n_s }, ObsActSpace::Discrete { n: n_a }) => {
                transitions_from_json(as_object(&obj["transitions"], "transitions")?, *n_s, *n_a)
                    .map(Rc::new)
            }
            _ => Err(Error::UnsupportedSpace(
                "transitions need discrete observation and action spaces".into(),
            )),
        }
    }

    fn make_api_url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }
}

/// Parses `{"<s>": {"<a>": [[p, s', r, done], ...]}}` into a transition table.
pub fn transitions_from_json(
    obj: &Map<String, Value>,
    n_s: Discrete,
    n_a: Discrete,
) -> Result<Transitions> {
    let mut transitions: Transitions = HashMap::new();
    for (s, a) in iproduct!(0..n_s, 0..n_a) {
        let s_trans = obj
            .get(&s.to_string())
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Malformed(format!("transitions[{s}]")))?;
        let a_trans = s_trans
            .get(&a.to_string())
            .and_then(Value::as_array)
            .ok_or_else(|| Error::Malformed(format!("transitions[{s}][{a}]")))?;

        let ts = a_trans
            .iter()
            .map(|t| {
                let t = as_array(t, "transition")?;
                if t.len() < 4 {
                    return Err(Error::Malformed("transition".into()));
                }
                Ok(Transition {
                    probability: as_continous(&t[0], "probability")?,
                    next_state: as_discrete(&t[1], "next_state")?,
                    reward: as_continous(&t[2], "reward")?,
                    done: as_bool(&t[3], "done")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        transitions.insert((s, a), ts);
    }

    Ok(transitions)
}

#[derive(Debug)]
pub struct Client {
    base_url: String,
    api_url: String,
    client: reqwest::blocking::Client,
}

impl Client {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base_url = base_url.replace("//localhost:", "//127.0.0.1:");
        if base_url.ends_with('/') {
            _ = base_url.remove(base_url.len() - 1);
        }

        let api_url = format!("{base_url}/v1/envs/");
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|source| Error::Http {
                url: base_url.clone(),
                source,
            })?;

        Ok(Self {
            base_url,
            api_url,
            client,
        })
    }

    pub fn make_api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn http_get(&self, url: &str) -> Result<Value> {
        debug!(url, "GET");
        self.client
            .get(url)
            .headers(Self::construct_common_headers())
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.json::<Value>())
            .map_err(|source| Error::Http {
                url: url.to_string(),
                source,
            })
    }

    fn http_post<T: Serialize>(&self, url: &str, body: &HashMap<&str, T>) -> Result<Value> {
        debug!(url, "POST");
        self.client
            .post(url)
            .headers(Self::construct_common_headers())
            .json(body)
            .send()
            .and_then(|res| res.error_for_status())
            .and_then(|res| res.json::<Value>())
            .map_err(|source| Error::Http {
                url: url.to_string(),
                source,
            })
    }

    fn construct_common_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }
}

mod value_extensions {
    use super::*;

    static NULL: Value = Value::Null;

    pub fn field<'a>(obj: &'a Map<String, Value>, key: &str) -> &'a Value {
        obj.get(key).unwrap_or(&NULL)
    }

    pub fn as_discrete(val: &Value, what: &str) -> Result<Discrete> {
        val.as_i64()
            .and_then(|x| Discrete::try_from(x).ok())
            .ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_continous(val: &Value, what: &str) -> Result<Continous> {
        val.as_f64().ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_bool(val: &Value, what: &str) -> Result<bool> {
        val.as_bool().ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_str<'a>(val: &'a Value, what: &str) -> Result<&'a str> {
        val.as_str().ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_array<'a>(val: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
        val.as_array()
            .ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_object<'a>(val: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
        val.as_object()
            .ok_or_else(|| Error::Malformed(what.to_string()))
    }

    pub fn as_discrete_item_vec(val: &Value, what: &str) -> Result<Vec<Discrete>> {
        as_array(val, what)?
            .iter()
            .map(|x| as_discrete(x, what))
            .collect()
    }

    pub fn as_continous_item_vec(val: &Value, what: &str) -> Result<Vec<Continous>> {
        as_array(val, what)?
            .iter()
            .map(|x| as_continous(x, what))
            .collect()
    }
}
