use rayon::prelude::*;

use crate::common::config::DEFAULT_THRESHOLD;

/// Per-sample comparison: `(value, maximum, threshold) -> output sample`.
pub type ThresholdRule = fn(i32, i32, i32) -> i32;

/// `1` above the threshold, `0` otherwise. `maximum` is not consulted.
pub fn threshold_rule(value: i32, _maximum: i32, threshold: i32) -> i32 {
    i32::from(value > threshold)
}

/// Host-side thresholding used to validate the accelerator.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceEngine {
    threshold: i32,
    rule: ThresholdRule,
}

impl Default for ReferenceEngine {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ReferenceEngine {
    pub fn new(threshold: i32) -> Self {
        Self {
            threshold,
            rule: threshold_rule,
        }
    }

    /// Builder method to replace the comparison function.
    pub fn rule(mut self, rule: ThresholdRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn compute(&self, samples: &[i32], max_value: i32) -> Vec<i32> {
        let rule = self.rule;
        let threshold = self.threshold;
        samples
            .par_iter()
            .map(|&value| rule(value, max_value, threshold))
            .collect()
    }
}

/// Thresholds `samples` with the default rule.
pub fn compute(samples: &[i32], max_value: i32, threshold: i32) -> Vec<i32> {
    ReferenceEngine::new(threshold).compute(samples, max_value)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn random_samples(seed: u64, len: usize, max_value: i32) -> Vec<i32> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..len).map(|_| rng.random_range(0..=max_value)).collect()
    }

    #[test]
    fn thresholds_small_image() {
        assert_eq!(compute(&[50, 100, 150, 200], 255, 90), vec![0, 1, 1, 1]);
    }

    #[test]
    fn threshold_is_exclusive() {
        assert_eq!(compute(&[89, 90, 91], 255, 90), vec![0, 0, 1]);
    }

    #[test]
    fn output_is_binary_and_same_length() {
        for (seed, max_value) in [(1, 1), (7, 255), (42, 65535)] {
            let samples = random_samples(seed, 1000 + seed as usize, max_value);
            let out = compute(&samples, max_value, 90);

            assert_eq!(out.len(), samples.len());
            assert!(out.iter().all(|&v| v == 0 || v == 1));
        }
    }

    #[test]
    fn compute_is_idempotent() {
        let samples = random_samples(3, 4096, 255);
        let engine = ReferenceEngine::default();

        assert_eq!(engine.compute(&samples, 255), engine.compute(&samples, 255));
    }

    #[test]
    fn threshold_ignores_max_value() {
        let samples = [10, 95, 200];
        assert_eq!(compute(&samples, 255, 90), compute(&samples, 1000, 90));
    }

    #[test]
    fn custom_rule_is_used() {
        fn half_of_max(value: i32, maximum: i32, _threshold: i32) -> i32 {
            i32::from(value * 2 >= maximum)
        }

        let engine = ReferenceEngine::new(0).rule(half_of_max);
        assert_eq!(engine.compute(&[0, 127, 128, 255], 255), vec![0, 0, 1, 1]);
    }
}
