//! FrozenLake grid world, built as a transition table.
//!
//! Tiles: `S` start, `F` frozen, `H` hole, `G` goal. Entering `G` pays 1.
//! `H` and `G` end the episode and are absorbing. Actions: 0 left, 1 down,
//! 2 right, 3 up. On slippery ice the agent moves in the intended direction
//! or in either perpendicular one, each with probability 1/3.
//!
//! Refer: https://gymnasium.farama.org/environments/toy_text/frozen_lake/

use super::simulator::TransitionsSimulator;
use crate::algos::model_based::mdp::MdpShape;
use crate::{Error, Result};
use gymnasium::{Discrete, Transition, Transitions};
use itertools::iproduct;
use std::collections::HashMap;
use std::rc::Rc;

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

const N_ACTIONS: usize = 4;

#[derive(Debug, Clone)]
pub struct FrozenLake {
    desc: Vec<Vec<char>>,
    slippery: bool,
}

impl FrozenLake {
    pub fn new(desc: &[&str], slippery: bool) -> Result<Self> {
        let desc = desc
            .iter()
            .map(|row| row.chars().collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let ncol = desc.first().map_or(0, Vec::len);
        if ncol == 0 || desc.iter().any(|row| row.len() != ncol) {
            return Err(Error::InvalidConfiguration(
                "frozen lake map must be a non-empty rectangle".into(),
            ));
        }
        if let Some(c) = desc.iter().flatten().find(|c| !"SFHG".contains(**c)) {
            return Err(Error::InvalidConfiguration(format!(
                "unknown frozen lake tile '{c}'"
            )));
        }
        if desc.iter().flatten().filter(|&&c| c == 'S').count() != 1 {
            return Err(Error::InvalidConfiguration(
                "frozen lake map needs exactly one start tile".into(),
            ));
        }

        Ok(Self { desc, slippery })
    }

    /// One of the built-in maps, `4x4` or `8x8`.
    pub fn from_map_name(name: &str, slippery: bool) -> Result<Self> {
        match name {
            "4x4" => Self::new(&MAP_4X4, slippery),
            "8x8" => Self::new(&MAP_8X8, slippery),
            _ => Err(Error::InvalidConfiguration(format!(
                "unknown frozen lake map '{name}'"
            ))),
        }
    }

    pub fn nrow(&self) -> usize {
        self.desc.len()
    }

    pub fn ncol(&self) -> usize {
        self.desc[0].len()
    }

    pub fn shape(&self) -> MdpShape {
        MdpShape::new(self.nrow() * self.ncol(), N_ACTIONS)
    }

    pub fn start(&self) -> Discrete {
        iproduct!(0..self.nrow(), 0..self.ncol())
            .find(|&(r, c)| self.desc[r][c] == 'S')
            .map_or(0, |(r, c)| self.to_s(r, c))
    }

    /// Step limit gymnasium registers for maps of this size.
    pub fn default_max_episode_steps(&self) -> usize {
        if self.shape().n_s <= 16 {
            100
        } else {
            200
        }
    }

    pub fn transitions(&self) -> Transitions {
        let mut transitions: Transitions = HashMap::new();
        for (r, c, a) in iproduct!(0..self.nrow(), 0..self.ncol(), 0..N_ACTIONS) {
            let s = self.to_s(r, c);
            let ts = if "GH".contains(self.desc[r][c]) {
                vec![Transition {
                    next_state: s,
                    probability: 1.,
                    reward: 0.,
                    done: true,
                }]
            } else if self.slippery {
                [(a + 3) % 4, a, (a + 1) % 4]
                    .into_iter()
                    .map(|b| self.moved(r, c, b, 1. / 3.))
                    .collect()
            } else {
                vec![self.moved(r, c, a, 1.)]
            };
            transitions.insert((s, a as Discrete), ts);
        }

        transitions
    }

    pub fn simulator(
        &self,
        max_episode_steps: Option<usize>,
        seed: u64,
    ) -> Result<TransitionsSimulator> {
        let name = if self.slippery {
            "FrozenLake (slippery)"
        } else {
            "FrozenLake"
        };

        TransitionsSimulator::new(
            name,
            self.shape(),
            Rc::new(self.transitions()),
            self.start(),
            max_episode_steps,
            seed,
        )
    }

    fn moved(&self, r: usize, c: usize, a: usize, probability: f64) -> Transition {
        let (r, c) = match a {
            0 => (r, c.saturating_sub(1)),
            1 => ((r + 1).min(self.nrow() - 1), c),
            2 => (r, (c + 1).min(self.ncol() - 1)),
            _ => (r.saturating_sub(1), c),
        };
        let tile = self.desc[r][c];

        Transition {
            next_state: self.to_s(r, c),
            probability,
            reward: if tile == 'G' { 1. } else { 0. },
            done: "GH".contains(tile),
        }
    }

    fn to_s(&self, r: usize, c: usize) -> Discrete {
        (r * self.ncol() + c) as Discrete
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envs::Env;
    use float_eq::*;
    use rstest::rstest;

    #[rstest]
    #[case("4x4", 16, 100)]
    #[case("8x8", 64, 200)]
    fn builtin_maps(#[case] name: &str, #[case] n_s: usize, #[case] steps: usize) {
        let fl = FrozenLake::from_map_name(name, true).unwrap();

        assert_eq!(fl.shape(), MdpShape::new(n_s, 4));
        assert_eq!(fl.transitions().len(), n_s * 4);
        assert_eq!(fl.start(), 0);
        assert_eq!(fl.default_max_episode_steps(), steps);
    }

    #[test]
    fn custom_map_start_and_goal() {
        let fl = FrozenLake::new(&["GGGH", "GSGH", "GGGF", "FFFG"], false).unwrap();
        let ts = fl.transitions();

        assert_eq!(fl.start(), 5);
        assert_eq!(
            ts[&(5, 1)],
            vec![Transition {
                next_state: 9,
                probability: 1.,
                reward: 1.,
                done: true
            }]
        );
    }

    #[test]
    fn slippery_moves_split_three_ways() {
        let fl = FrozenLake::from_map_name("4x4", true).unwrap();
        let ts = fl.transitions();

        // From the start corner, going down: left bumps the wall, down, right.
        let next = ts[&(0, 1)].iter().map(|t| t.next_state).collect::<Vec<_>>();
        assert_eq!(next, vec![0, 4, 1]);

        for t in ts.values() {
            let mass = t.iter().map(|t| t.probability).sum::<f64>();
            assert_float_eq!(mass, 1., abs <= 1e-12);
        }
    }

    #[test]
    fn holes_and_goal_are_absorbing() {
        let fl = FrozenLake::from_map_name("4x4", false).unwrap();
        let ts = fl.transitions();

        for (s, a) in iproduct!([5, 7, 11, 12, 15], 0..4) {
            assert_eq!(
                ts[&(s, a)],
                vec![Transition {
                    next_state: s,
                    probability: 1.,
                    reward: 0.,
                    done: true
                }]
            );
        }
    }

    #[test]
    fn entering_goal_pays_one() {
        let fl = FrozenLake::from_map_name("4x4", false).unwrap();
        let ts = fl.transitions();

        let t = &ts[&(14, 2)][0];
        assert_eq!(t.next_state, 15);
        assert!(t.done);
        assert_float_eq!(t.reward, 1., abs <= 1e-12);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["SFF", "FG"])]
    #[case(&["SFX", "FFG"])]
    #[case(&["SFS", "FFG"])]
    #[case(&["FFF", "FFG"])]
    fn rejects_bad_maps(#[case] desc: &[&str]) {
        assert!(matches!(
            FrozenLake::new(desc, true),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn rejects_unknown_map_name() {
        assert!(FrozenLake::from_map_name("5x5", true).is_err());
    }

    #[test]
    fn simulator_walks_the_shortest_path() {
        let fl = FrozenLake::from_map_name("4x4", false).unwrap();
        let env = &mut fl.simulator(Some(100), 0).unwrap();
        env.reset().unwrap();

        let path = [1, 1, 2, 1, 2, 2];
        let outcomes = path
            .iter()
            .map(|&a| env.step(a).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(
            outcomes.iter().map(|o| o.next_state).collect::<Vec<_>>(),
            vec![4, 8, 9, 13, 14, 15]
        );
        assert!(outcomes[5].terminated);
        assert_float_eq!(outcomes[5].reward, 1., abs <= 1e-12);
    }
}
