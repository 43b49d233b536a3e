use rand::Rng;

/// 连续空间：每一维独立的闭区间 [low, high]
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSpace {
    pub low: Vec<f32>,
    pub high: Vec<f32>,
}

impl BoxSpace {
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Self {
        assert_eq!(low.len(), high.len(), "bounds must have the same length");
        Self { low, high }
    }

    /// Every dimension shares the same bounds.
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self::new(vec![low; dim], vec![high; dim])
    }

    pub fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.dim()
            && values
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| v.is_finite() && *v >= *lo && *v <= *hi)
    }

    /// Bounds are finite and ordered.
    pub fn is_well_formed(&self) -> bool {
        self.dim() > 0
            && self
                .low
                .iter()
                .zip(&self.high)
                .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo <= hi)
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Vec<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&lo, &hi)| if lo < hi { rng.random_range(lo..=hi) } else { lo })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn samples_stay_in_bounds() {
        let space = BoxSpace::new(vec![-10.0, 0.4], vec![10.0, 1.0]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }

    #[test]
    fn rejects_wrong_length_and_nan() {
        let space = BoxSpace::uniform(2, -1.0, 1.0);
        assert!(!space.contains(&[0.0]));
        assert!(!space.contains(&[0.0, f32::NAN]));
        assert!(!space.contains(&[0.0, 1.5]));
        assert!(space.contains(&[-1.0, 1.0]));
    }

    #[test]
    fn degenerate_bounds_are_well_formed() {
        assert!(BoxSpace::uniform(1, 0.5, 0.5).is_well_formed());
        assert!(!BoxSpace::new(vec![1.0], vec![0.0]).is_well_formed());
        assert!(!BoxSpace::new(vec![], vec![]).is_well_formed());
    }
}
