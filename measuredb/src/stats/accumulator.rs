// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

/// Single-pass accumulator for count, mean, variance and extrema, using Welford's algorithm.
///
/// The running mean and the sum of squared differences from it (`m2`) are updated for every value, which
/// avoids the cancellation error of computing the variance from a sum of squares.
#[derive(Debug, Clone)]
pub struct Accumulator {
  count: u64,
  mean: f64,
  m2: f64,
  min: f64,
  max: f64,
}

impl Default for Accumulator {
  fn default() -> Self {
    Accumulator {
      count: 0,
      mean: 0.0,
      m2: 0.0,
      min: f64::INFINITY,
      max: f64::NEG_INFINITY,
    }
  }
}

impl Accumulator {
  pub fn new() -> Self {
    Accumulator::default()
  }

  pub fn add(&mut self, value: f64) {
    self.count += 1;

    let delta = value - self.mean;
    self.mean += delta / self.count as f64;
    self.m2 += delta * (value - self.mean);

    self.min = self.min.min(value);
    self.max = self.max.max(value);
  }

  pub fn get_count(&self) -> u64 {
    self.count
  }

  /// Mean of the values seen so far, or `None` if there were none.
  pub fn mean(&self) -> Option<f64> {
    (self.count > 0).then_some(self.mean)
  }

  pub fn min(&self) -> Option<f64> {
    (self.count > 0).then_some(self.min)
  }

  pub fn max(&self) -> Option<f64> {
    (self.count > 0).then_some(self.max)
  }

  /// Population variance (divisor N) of the values seen so far.
  pub fn population_variance(&self) -> Option<f64> {
    (self.count > 0).then(|| self.m2 / self.count as f64)
  }

  /// Population standard deviation (divisor N) of the values seen so far.
  pub fn population_std_dev(&self) -> Option<f64> {
    self.population_variance().map(f64::sqrt)
  }
}

impl Extend<f64> for Accumulator {
  fn extend<I: IntoIterator<Item = f64>>(&mut self, values: I) {
    for value in values {
      self.add(value);
    }
  }
}

impl FromIterator<f64> for Accumulator {
  fn from_iter<I: IntoIterator<Item = f64>>(values: I) -> Self {
    let mut accumulator = Accumulator::new();
    accumulator.extend(values);
    accumulator
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  use approx::assert_abs_diff_eq;

  #[test]
  fn test_empty() {
    let accumulator = Accumulator::new();
    assert_eq!(accumulator.get_count(), 0);
    assert_eq!(accumulator.mean(), None);
    assert_eq!(accumulator.min(), None);
    assert_eq!(accumulator.max(), None);
    assert_eq!(accumulator.population_std_dev(), None);
  }

  #[test]
  fn test_small_sample() {
    let accumulator: Accumulator = vec![10.0, 20.0, 30.0].into_iter().collect();
    assert_eq!(accumulator.get_count(), 3);
    assert_abs_diff_eq!(accumulator.mean().unwrap(), 20.0);
    assert_eq!(accumulator.min(), Some(10.0));
    assert_eq!(accumulator.max(), Some(30.0));
    assert_abs_diff_eq!(
      accumulator.population_variance().unwrap(),
      200.0 / 3.0,
      epsilon = 1e-12
    );
  }

  #[test]
  fn test_identical_values_have_zero_std_dev() {
    let accumulator: Accumulator = std::iter::repeat(21.37).take(1000).collect();
    assert_eq!(accumulator.population_std_dev(), Some(0.0));
  }

  #[test]
  fn test_large_offset_is_stable() {
    // A naive sum of squares loses most of its precision here.
    let offset = 1e6;
    let accumulator: Accumulator = (0..10_000)
      .map(|i| offset + (i % 2) as f64)
      .collect();
    assert_abs_diff_eq!(accumulator.population_std_dev().unwrap(), 0.5, epsilon = 1e-4);
    assert_abs_diff_eq!(accumulator.mean().unwrap(), offset + 0.5, epsilon = 1e-4);
  }

  #[test]
  fn test_matches_two_pass_computation() {
    let values: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 * 0.73 - 12.0).collect();
    let accumulator: Accumulator = values.iter().copied().collect();

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
      values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64;

    assert_abs_diff_eq!(accumulator.mean().unwrap(), mean, epsilon = 1e-9);
    assert_abs_diff_eq!(
      accumulator.population_variance().unwrap(),
      variance,
      epsilon = 1e-9
    );
  }
}
