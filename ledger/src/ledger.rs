// Copyright (c) James Kassemi, SC, US. All rights reserved.
use parking_lot::Mutex;
use rand::Rng;

use crate::{
    error::{LedgerError, Result},
    sampler::IntensityDistribution,
    Intensity, ScoreSnapshot,
};

type Counts = [u64; Intensity::COUNT];

/// In-memory blast counters, one per intensity.
///
/// A single mutex guards all four counters so an increment and the snapshot
/// returned with it are taken under the same acquisition. State lives only as
/// long as the ledger; nothing is persisted.
pub struct ScoreLedger {
    counts: Mutex<Counts>,
    distribution: IntensityDistribution,
}

impl ScoreLedger {
    pub fn new(distribution: IntensityDistribution) -> Self {
        Self::with_snapshot(distribution, ScoreSnapshot::default())
    }

    /// Starts from previously observed counts instead of zero.
    pub fn with_snapshot(distribution: IntensityDistribution, initial: ScoreSnapshot) -> Self {
        let mut counts = [0; Intensity::COUNT];
        for (intensity, count) in initial.iter() {
            counts[intensity.index()] = count;
        }
        Self {
            counts: Mutex::new(counts),
            distribution,
        }
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot::from_counts(*self.counts.lock())
    }

    pub fn total(&self) -> u64 {
        self.snapshot().total()
    }

    /// Increments a caller-chosen intensity.
    pub fn record(&self, intensity: Intensity) -> Result<ScoreSnapshot> {
        let mut guard = self.counts.lock();
        let slot = &mut guard[intensity.index()];
        *slot = slot
            .checked_add(1)
            .ok_or(LedgerError::CounterOverflow { intensity })?;
        Ok(ScoreSnapshot::from_counts(*guard))
    }

    /// Samples an intensity from the ledger's distribution and records it.
    pub fn record_one<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(Intensity, ScoreSnapshot)> {
        let intensity = self.distribution.sample(rng);
        let snapshot = self.record(intensity)?;
        Ok((intensity, snapshot))
    }

    /// Records an intensity given by name, as received from an untrusted caller.
    pub fn record_named(&self, name: &str) -> Result<(Intensity, ScoreSnapshot)> {
        let intensity: Intensity = name.parse()?;
        let snapshot = self.record(intensity)?;
        Ok((intensity, snapshot))
    }
}

impl Default for ScoreLedger {
    fn default() -> Self {
        Self::new(IntensityDistribution::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;
    use std::{sync::Arc, thread};

    #[test]
    fn fresh_ledger_is_all_zero() {
        let ledger = ScoreLedger::default();
        assert_eq!(ledger.snapshot(), ScoreSnapshot::default());
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn record_touches_only_the_given_intensity() {
        for target in Intensity::ALL {
            let ledger = ScoreLedger::default();
            for _ in 0..7 {
                ledger.record(target).unwrap();
            }
            let snapshot = ledger.snapshot();
            for (intensity, count) in snapshot.iter() {
                let expected = if intensity == target { 7 } else { 0 };
                assert_eq!(count, expected, "{intensity} after recording {target}");
            }
        }
    }

    #[test]
    fn record_returns_post_increment_snapshot() {
        let ledger = ScoreLedger::default();
        let (intensity, snapshot) = ledger.record_named("medium").unwrap();
        assert_eq!(intensity, Intensity::Medium);
        assert_eq!(snapshot, ScoreSnapshot::from_counts([0, 1, 0, 0]));
        assert_eq!(ledger.snapshot(), snapshot);
    }

    #[test]
    fn unknown_name_is_rejected_without_mutation() {
        let ledger = ScoreLedger::default();
        ledger.record(Intensity::High).unwrap();
        let before = ledger.snapshot();

        let err = ledger.record_named("nuclear").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidCategory(_)));
        assert!(err.is_client_error());
        assert!(ledger.record_named("LOW").is_err());
        assert_eq!(ledger.snapshot(), before);
    }

    #[test]
    fn overflow_is_an_internal_fault_without_mutation() {
        let ledger = ScoreLedger::with_snapshot(
            IntensityDistribution::default(),
            ScoreSnapshot::from_counts([u64::MAX, 3, 0, 0]),
        );
        let err = ledger.record(Intensity::Low).unwrap_err();
        assert_eq!(
            err,
            LedgerError::CounterOverflow {
                intensity: Intensity::Low
            }
        );
        assert!(!err.is_client_error());
        assert_eq!(ledger.snapshot().low, u64::MAX);
        assert_eq!(ledger.record(Intensity::Medium).unwrap().medium, 4);
    }

    #[test]
    fn record_one_follows_the_distribution() {
        let only_high = IntensityDistribution::new([0.0, 0.0, 1.0, 0.0]).unwrap();
        let ledger = ScoreLedger::new(only_high);
        let mut rng = Pcg64::seed_from_u64(42);
        for expected_total in 1..=10 {
            let (intensity, snapshot) = ledger.record_one(&mut rng).unwrap();
            assert_eq!(intensity, Intensity::High);
            assert_eq!(snapshot.high, expected_total);
        }
        assert_eq!(ledger.total(), 10);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let ledger = Arc::new(ScoreLedger::default());
        let handles: Vec<_> = (0..100)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    let intensity = Intensity::ALL[i % Intensity::COUNT];
                    ledger.record(intensity).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = ledger.snapshot();
        assert_eq!(snapshot.total(), 100);
        assert_eq!(snapshot, ScoreSnapshot::from_counts([25, 25, 25, 25]));
    }
}
