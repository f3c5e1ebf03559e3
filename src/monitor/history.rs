use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::sample::PoolSample;

/// Default number of samples retained.
pub const DEFAULT_MAX_HISTORY: usize = 1000;

/// Bounded, thread-safe rolling buffer of pool samples.
///
/// The sampler appends, everyone else reads copies. One mutex covers both
/// the push and the eviction so a reader never sees the buffer over capacity.
pub struct History {
    max_len: usize,
    samples: Mutex<VecDeque<PoolSample>>,
}

impl History {
    /// `max_len` is clamped to at least one slot.
    pub fn new(max_len: usize) -> Self {
        let max_len = max_len.max(1);
        Self {
            max_len,
            samples: Mutex::new(VecDeque::with_capacity(max_len + 1)),
        }
    }

    /// Append at the tail, evicting the oldest samples past capacity.
    pub fn append(&self, sample: PoolSample) {
        let mut samples = self.samples.lock();
        samples.push_back(sample);
        while samples.len() > self.max_len {
            samples.pop_front();
        }
    }

    /// Every retained sample captured strictly after `cutoff`, oldest first.
    pub fn snapshot_since(&self, cutoff: DateTime<Utc>) -> Vec<PoolSample> {
        self.samples
            .lock()
            .iter()
            .filter(|s| s.timestamp() > cutoff)
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<PoolSample> {
        self.samples.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_len
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::pool::PoolReading;

    fn sample_at(active: u32, ts: DateTime<Utc>) -> PoolSample {
        PoolSample::new(
            PoolReading {
                checked_out: active,
                checked_in: 0,
                size: 10,
                overflow: -10,
                max_overflow: 5,
            },
            ts,
        )
    }

    fn actives(samples: &[PoolSample]) -> Vec<u32> {
        samples.iter().map(|s| s.active_connections()).collect()
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let history = History::new(3);
        let t0 = Utc::now();
        for (i, active) in [1, 2, 3, 4].into_iter().enumerate() {
            history.append(sample_at(active, t0 + Duration::seconds(i as i64)));
        }

        let all = history.snapshot_since(t0 - Duration::seconds(1));
        assert_eq!(actives(&all), vec![2, 3, 4]);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn keeps_most_recent_for_any_append_count() {
        let t0 = Utc::now();
        for cap in [1usize, 2, 5, 17] {
            let history = History::new(cap);
            for n in 0..50u32 {
                history.append(sample_at(n, t0 + Duration::milliseconds(n as i64)));
                assert!(history.len() <= cap);

                let expected: Vec<u32> =
                    (0..=n).skip((n as usize + 1).saturating_sub(cap)).collect();
                let got = history.snapshot_since(t0 - Duration::seconds(1));
                assert_eq!(actives(&got), expected);
            }
        }
    }

    #[test]
    fn snapshot_since_is_strictly_after_cutoff() {
        let history = History::new(10);
        let t0 = Utc::now();
        for i in 0..5 {
            history.append(sample_at(i, t0 + Duration::seconds(i as i64)));
        }

        let cutoff = t0 + Duration::seconds(2);
        let first = history.snapshot_since(cutoff);
        assert_eq!(actives(&first), vec![3, 4]);

        // Same cutoff, no appends in between: same answer
        assert_eq!(history.snapshot_since(cutoff), first);

        assert!(history
            .snapshot_since(t0 + Duration::seconds(10))
            .is_empty());
    }

    #[test]
    fn latest_tracks_tail() {
        let history = History::new(2);
        assert!(history.latest().is_none());
        assert!(history.is_empty());

        let t0 = Utc::now();
        history.append(sample_at(7, t0));
        history.append(sample_at(8, t0));
        history.append(sample_at(9, t0));
        assert_eq!(history.latest().map(|s| s.active_connections()), Some(9));
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let history = History::new(0);
        assert_eq!(history.capacity(), 1);
        history.append(sample_at(1, Utc::now()));
        history.append(sample_at(2, Utc::now()));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn concurrent_readers_never_see_overflow_or_torn_samples() {
        const CAP: usize = 16;
        let history = Arc::new(History::new(CAP));
        let t0 = Utc::now();

        let writers: Vec<_> = (0..4u32)
            .map(|w| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for i in 0..500u32 {
                        let n = w * 1000 + i;
                        // idle mirrors active so a torn copy would be detectable
                        history.append(PoolSample::new(
                            PoolReading {
                                checked_out: n,
                                checked_in: n,
                                size: n,
                                overflow: i64::from(n),
                                max_overflow: n,
                            },
                            t0,
                        ));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let history = Arc::clone(&history);
                std::thread::spawn(move || {
                    for _ in 0..500 {
                        let snap = history.snapshot_since(t0 - Duration::seconds(1));
                        assert!(snap.len() <= CAP);
                        for s in snap.iter().chain(history.latest().iter()) {
                            let n = s.active_connections();
                            assert_eq!(s.idle_connections(), n);
                            assert_eq!(s.pool_size(), n);
                            assert_eq!(s.overflow(), i64::from(n));
                        }
                    }
                })
            })
            .collect();

        for h in writers.into_iter().chain(readers) {
            h.join().unwrap();
        }
        assert_eq!(history.len(), CAP);
    }
}
