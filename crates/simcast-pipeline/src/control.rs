use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Inclusive bounds for actuator commands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlRange {
    pub min: f64,
    pub max: f64,
}

impl ControlRange {
    /// Create a range, or `None` if the bounds are not finite or not ordered.
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if min.is_finite() && max.is_finite() && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    /// Clamp `value` into the range. NaN maps to `min`.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.max(self.min).min(self.max)
        }
    }
}

impl Default for ControlRange {
    fn default() -> Self {
        Self { min: 0.0, max: 5.0 }
    }
}

/// One command per actuator for a single simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlInput(Vec<f64>);

impl ControlInput {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn zeros(actuators: usize) -> Self {
        Self(vec![0.0; actuators])
    }

    /// Clamp every value into `range`.
    pub fn clamped(mut self, range: &ControlRange) -> Self {
        for value in &mut self.0 {
            *value = range.clamp(*value);
        }
        self
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

/// Produces the control input for each iteration.
///
/// `iteration` is 1-based. Any `FnMut(u64, usize) -> ControlInput` is a policy.
pub trait ControlPolicy {
    fn next(&mut self, iteration: u64, actuators: usize) -> ControlInput;
}

impl<F> ControlPolicy for F
where
    F: FnMut(u64, usize) -> ControlInput,
{
    fn next(&mut self, iteration: u64, actuators: usize) -> ControlInput {
        self(iteration, actuators)
    }
}

/// Drives every actuator with the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantControl(pub f64);

impl ControlPolicy for ConstantControl {
    fn next(&mut self, _iteration: u64, actuators: usize) -> ControlInput {
        ControlInput(vec![self.0; actuators])
    }
}

/// Drives the first `count` actuators with `value` and leaves the rest at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrefixControl {
    pub count: usize,
    pub value: f64,
}

impl Default for PrefixControl {
    /// Four rotors at a hover-ish 4.5.
    fn default() -> Self {
        Self {
            count: 4,
            value: 4.5,
        }
    }
}

impl ControlPolicy for PrefixControl {
    fn next(&mut self, _iteration: u64, actuators: usize) -> ControlInput {
        let mut values = vec![0.0; actuators];
        let count = self.count.min(actuators);
        values[..count].fill(self.value);
        ControlInput(values)
    }
}

/// Uniform random commands drawn from a seeded generator.
///
/// The same seed yields the same command sequence on every run.
#[derive(Debug, Clone)]
pub struct UniformControl {
    range: ControlRange,
    rng: ChaCha8Rng,
}

impl UniformControl {
    pub fn new(range: ControlRange, seed: u64) -> Self {
        Self {
            range,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl ControlPolicy for UniformControl {
    fn next(&mut self, _iteration: u64, actuators: usize) -> ControlInput {
        let ControlRange { min, max } = self.range;
        let values = (0..actuators)
            .map(|_| {
                if min < max {
                    self.rng.gen_range(min..max)
                } else {
                    min
                }
            })
            .collect();
        ControlInput(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_and_nan() {
        let range = ControlRange::new(0.0, 5.0).unwrap();
        let input = ControlInput::new(vec![-1.0, 2.5, 9.0, f64::NAN]).clamped(&range);
        assert_eq!(input.as_slice(), &[0.0, 2.5, 5.0, 0.0]);
    }

    #[test]
    fn range_rejects_inverted_or_infinite_bounds() {
        assert!(ControlRange::new(5.0, 0.0).is_none());
        assert!(ControlRange::new(0.0, f64::INFINITY).is_none());
        assert!(ControlRange::new(1.0, 1.0).is_some());
    }

    #[test]
    fn range_deserializes_from_settings() {
        let range: ControlRange = serde_json::from_str(r#"{"min": -1.0, "max": 1.0}"#).unwrap();
        assert_eq!(range, ControlRange::new(-1.0, 1.0).unwrap());
    }

    #[test]
    fn prefix_fills_leading_actuators() {
        let mut policy = PrefixControl::default();
        assert_eq!(
            policy.next(1, 6).as_slice(),
            &[4.5, 4.5, 4.5, 4.5, 0.0, 0.0]
        );
        assert_eq!(policy.next(2, 2).as_slice(), &[4.5, 4.5]);
    }

    #[test]
    fn constant_covers_every_actuator() {
        let mut policy = ConstantControl(1.25);
        assert_eq!(policy.next(1, 3).as_slice(), &[1.25, 1.25, 1.25]);
        assert!(policy.next(1, 0).is_empty());
    }

    #[test]
    fn uniform_is_seeded_and_in_range() {
        let range = ControlRange::default();
        let mut a = UniformControl::new(range, 7);
        let mut b = UniformControl::new(range, 7);
        for iteration in 1..=20 {
            let left = a.next(iteration, 4);
            assert_eq!(left, b.next(iteration, 4));
            assert!(left.as_slice().iter().all(|v| (0.0..5.0).contains(v)));
        }
    }

    #[test]
    fn uniform_with_degenerate_range_returns_min() {
        let mut policy = UniformControl::new(ControlRange::new(2.0, 2.0).unwrap(), 1);
        assert_eq!(policy.next(1, 2).as_slice(), &[2.0, 2.0]);
    }

    #[test]
    fn closures_are_policies() {
        let mut policy = |iteration: u64, actuators: usize| {
            ControlInput::new(vec![iteration as f64; actuators])
        };
        assert_eq!(ControlPolicy::next(&mut policy, 3, 2).as_slice(), &[3.0, 3.0]);
    }
}
