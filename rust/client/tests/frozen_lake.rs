mod common;

use common::*;
use float_eq::*;
use gymnasium::*;
use serde_json::to_value;

#[test]
#[ignore = "needs a gymnasium-http-api server on 127.0.0.1:40004"]
fn fl_advanced_make_env_e2e() {
    let env = Environment::new(
        API_URL,
        "FrozenLake-v1",
        Some(1),
        Some(false),
        Some(true),
        &[
            ("is_slippery", to_value(false).unwrap()),
            ("desc", to_value(["GGGH", "GSGH", "GGGF", "FFFG"]).unwrap()),
        ],
    )
    .unwrap();
    assert_eq!(env.name().unwrap(), "FrozenLake-v1");
    assert_eq!(discrete_value(env.observation_space()), 16);
    assert_eq!(discrete_value(env.action_space()), 4);
    assert_eq!(env.transitions().unwrap().len(), 64);

    let s = env.reset(Some(2718)).unwrap();
    assert_eq!(discrete_item_value(&s[0]), 5);

    let si = env.step(&[ObsActSpaceItem::Discrete(1)]).unwrap();
    assert_eq!(discrete_item_value(&si.observation[0]), 9);
    assert!(si.terminated);
    assert!(si.truncated);
    assert_float_eq!(si.reward, 1., rmax <= 1e-16);
}

#[test]
#[ignore = "needs a gymnasium-http-api server on 127.0.0.1:40004"]
fn fl_sampled_actions_are_in_space() {
    let env = Environment::new(API_URL, "FrozenLake-v1", None, None, None, &[]).unwrap();

    for _ in 0..20 {
        let a = env.action_space_sample().unwrap();
        let a = discrete_item_value(&a[0]);
        assert!((0..4).contains(&a));
    }
}

#[test]
fn unreachable_server_is_an_http_error() {
    let ret = Environment::reference("http://127.0.0.1:9", "missing");

    assert!(matches!(ret, Err(Error::Http { .. })));
}
