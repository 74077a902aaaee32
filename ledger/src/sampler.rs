// Copyright (c) James Kassemi, SC, US. All rights reserved.
use core_types::{config::IntensityWeights, Intensity};
use rand::{distributions::Distribution, Rng};

use crate::error::DistributionError;

/// low, medium, high, extreme.
pub const DEFAULT_WEIGHTS: [f64; Intensity::COUNT] = [0.4, 0.3, 0.2, 0.1];
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Fixed discrete distribution over [`Intensity`], walked in declaration order.
///
/// Holds no mutable state; share it freely and supply the randomness per call.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityDistribution {
    weights: [f64; Intensity::COUNT],
}

impl IntensityDistribution {
    pub fn new(weights: [f64; Intensity::COUNT]) -> Result<Self, DistributionError> {
        for (intensity, weight) in Intensity::ALL.into_iter().zip(weights) {
            if !weight.is_finite() || weight < 0.0 {
                return Err(DistributionError::InvalidWeight { intensity, weight });
            }
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(DistributionError::WeightSum { sum });
        }
        Ok(Self { weights })
    }

    pub fn from_config(weights: &IntensityWeights) -> Result<Self, DistributionError> {
        Self::new(weights.as_array())
    }

    pub fn weight(&self, intensity: Intensity) -> f64 {
        self.weights[intensity.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intensity, f64)> + '_ {
        Intensity::ALL.into_iter().zip(self.weights.iter().copied())
    }

    /// Maps a draw `r` in `[0, 1)` to the first intensity whose cumulative
    /// weight reaches `r`.
    ///
    /// When rounding leaves the cumulative sum below `r`, the last intensity
    /// is returned.
    pub fn sample_at(&self, r: f64) -> Intensity {
        let mut cumulative = 0.0;
        for (intensity, weight) in self.iter() {
            cumulative += weight;
            if cumulative >= r {
                return intensity;
            }
        }
        Intensity::ALL[Intensity::COUNT - 1]
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Intensity {
        self.sample_at(rng.gen::<f64>())
    }
}

impl Default for IntensityDistribution {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
        }
    }
}

impl Distribution<Intensity> for IntensityDistribution {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Intensity {
        self.sample_at(rng.gen::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    #[test]
    fn cumulative_boundaries_are_inclusive() {
        let dist = IntensityDistribution::default();
        assert_eq!(dist.sample_at(0.0), Intensity::Low);
        assert_eq!(dist.sample_at(0.4), Intensity::Low);
        assert_eq!(dist.sample_at(0.400_000_1), Intensity::Medium);
        assert_eq!(dist.sample_at(0.65), Intensity::Medium);
        assert_eq!(dist.sample_at(0.85), Intensity::High);
        assert_eq!(dist.sample_at(0.95), Intensity::Extreme);
        assert_eq!(dist.sample_at(0.999_999_9), Intensity::Extreme);
    }

    #[test]
    fn falls_back_to_last_when_weights_fall_short() {
        // Sum is 0.9999995: inside tolerance but below the draw.
        let dist = IntensityDistribution::new([0.4, 0.3, 0.2, 0.099_999_5]).unwrap();
        assert_eq!(dist.sample_at(0.999_999_9), Intensity::Extreme);

        let skewed = IntensityDistribution::new([0.5, 0.499_999_5, 0.0, 0.0]).unwrap();
        assert_eq!(skewed.sample_at(0.999_999_9), Intensity::Extreme);
    }

    #[test]
    fn rejects_invalid_weights() {
        assert_eq!(
            IntensityDistribution::new([0.5, 0.5, -0.1, 0.1]),
            Err(DistributionError::InvalidWeight {
                intensity: Intensity::High,
                weight: -0.1,
            })
        );
        assert!(matches!(
            IntensityDistribution::new([0.4, 0.3, 0.2, 0.2]),
            Err(DistributionError::WeightSum { .. })
        ));
        assert!(matches!(
            IntensityDistribution::new([f64::NAN, 0.3, 0.2, 0.1]),
            Err(DistributionError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn config_weights_build_the_default_distribution() {
        let dist = IntensityDistribution::from_config(&IntensityWeights::default()).unwrap();
        assert_eq!(dist, IntensityDistribution::default());
        assert_eq!(dist.weight(Intensity::High), 0.2);
    }

    #[test]
    fn observed_frequencies_track_weights() {
        const DRAWS: usize = 100_000;
        let dist = IntensityDistribution::default();
        let mut rng = Pcg64::seed_from_u64(0x5eed);
        let mut counts = [0usize; Intensity::COUNT];
        for _ in 0..DRAWS {
            counts[dist.sample(&mut rng).index()] += 1;
        }
        for (intensity, weight) in dist.iter() {
            let observed = counts[intensity.index()] as f64 / DRAWS as f64;
            assert!(
                (observed - weight).abs() <= 0.02,
                "{intensity}: observed {observed}, expected {weight}"
            );
        }
    }

    #[test]
    fn composes_with_rand_sample_iter() {
        let dist = IntensityDistribution::new([0.0, 0.0, 0.0, 1.0]).unwrap();
        let rng = Pcg64::seed_from_u64(7);
        // Zero-weight entries only win on an exact 0.0 draw.
        let draws: Vec<Intensity> = rng.sample_iter(&dist).take(32).collect();
        assert!(draws.iter().all(|intensity| *intensity == Intensity::Extreme));
    }
}
