use crate::algos::model_based::mdp::{vi::ValueIteration, MdpShape};
use gymnasium::*;
use std::rc::Rc;

/// Three-state golf course: tee (0), green (1), hole (2).
/// https://towardsdatascience.com/reinforcement-learning-an-easy-introduction-to-value-iteration-e4cfe0731fd5
pub struct SimpleGolf {
    transitions: Rc<Transitions>,
}

impl SimpleGolf {
    pub fn new() -> Self {
        let t = |next_state, probability, reward, done| Transition {
            next_state,
            probability,
            reward,
            done,
        };

        let transitions = Transitions::from([
            ((0, 0), vec![t(1, 0.9, 0., false), t(0, 0.1, 0., false)]),
            ((1, 1), vec![t(0, 0.9, 0., false), t(1, 0.1, 0., false)]),
            ((1, 2), vec![t(2, 0.9, 10., true), t(1, 0.1, 0., false)]),
        ]);

        Self {
            transitions: Rc::new(transitions),
        }
    }

    pub fn shape(&self) -> MdpShape {
        MdpShape::new(3, 3)
    }

    pub fn transitions(&self) -> Rc<Transitions> {
        Rc::clone(&self.transitions)
    }

    /// Feeds `round(p * scale)` copies of every transition, so the empirical
    /// model reproduces the course exactly.
    pub fn ingest_exact(&self, vi: &mut ValueIteration, scale: usize) {
        for (&(s, a), ts) in self.transitions.iter() {
            for t in ts {
                let n = (t.probability * scale as f64).round() as usize;
                for _ in 0..n {
                    vi.ingest(s, a, t.next_state, t.reward).unwrap();
                }
            }
        }
    }
}
