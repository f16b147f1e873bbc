use super::{MdpShape, StateAction};
use crate::Result;
use gymnasium::Discrete;
use std::collections::HashMap;

/// Action-value estimates `Q(s, a)`. Unwritten entries read as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable {
    shape: MdpShape,
    values: HashMap<StateAction, f64>,
}

impl ValueTable {
    pub fn new(shape: MdpShape) -> Self {
        Self {
            shape,
            values: HashMap::new(),
        }
    }

    pub fn get(&self, s: Discrete, a: Discrete) -> Result<f64> {
        self.shape.check_state(s)?;
        self.shape.check_action(a)?;

        Ok(self.get_or_default(StateAction::new(s, a)))
    }

    pub fn set(&mut self, s: Discrete, a: Discrete, value: f64) -> Result<()> {
        self.shape.check_state(s)?;
        self.shape.check_action(a)?;

        self.values.insert(StateAction::new(s, a), value);
        Ok(())
    }

    pub(super) fn get_or_default(&self, sa: StateAction) -> f64 {
        self.values.get(&sa).copied().unwrap_or_default()
    }

    pub(super) fn put(&mut self, sa: StateAction, value: f64) {
        self.values.insert(sa, value);
    }

    /// Largest `|Q(s, a) - Q'(s, a)|` over both tables' entries.
    pub fn max_abs_diff(&self, other: &ValueTable) -> f64 {
        self.values
            .keys()
            .chain(other.values.keys())
            .map(|&sa| (self.get_or_default(sa) - other.get_or_default(sa)).abs())
            .fold(0., f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::*;

    #[test]
    fn absent_reads_as_zero() {
        let v = ValueTable::new(MdpShape::new(2, 2));

        assert_float_eq!(v.get(1, 1).unwrap(), 0., abs <= 1e-12);
    }

    #[test]
    fn set_overwrites() {
        let v = &mut ValueTable::new(MdpShape::new(2, 2));
        v.set(0, 1, 3.5).unwrap();
        v.set(0, 1, -7.25).unwrap();

        assert_float_eq!(v.get(0, 1).unwrap(), -7.25, abs <= 1e-12);
        assert_float_eq!(v.get(0, 0).unwrap(), 0., abs <= 1e-12);
    }

    #[test]
    fn rejects_out_of_range() {
        let v = &mut ValueTable::new(MdpShape::new(2, 2));

        assert!(v.get(2, 0).is_err());
        assert!(v.set(0, 2, 1.).is_err());
    }

    #[test]
    fn diff_covers_entries_missing_on_either_side() {
        let a = &mut ValueTable::new(MdpShape::new(2, 2));
        let b = &mut ValueTable::new(MdpShape::new(2, 2));
        a.set(0, 0, 1.).unwrap();
        b.set(1, 1, -3.).unwrap();

        assert_float_eq!(a.max_abs_diff(b), 3., abs <= 1e-12);
        assert_float_eq!(b.max_abs_diff(a), 3., abs <= 1e-12);
    }
}
