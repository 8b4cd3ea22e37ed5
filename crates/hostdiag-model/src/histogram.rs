//! Power-of-two histograms with percentile derivation (I5).
//!
//! The shape is named directly in the data model: name, unit, an
//! ascending-`low` bucket sequence, total count, mean, and the
//! p50/p90/p99/p999/max quintet. Grounded on the flat,
//! no-I/O metric structs in `probe-metrics` (e.g. `CPUPressure`,
//! `IOStats`) — plain data plus small derived-value methods, no
//! behavior beyond computing from already-parsed fields.

/// One `(low, high, count)` bucket of a histogram. `low` is strictly
/// increasing across a histogram's bucket list (I5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Bucket {
    /// Inclusive lower bound of the bucket.
    pub low: u64,
    /// Exclusive (or inclusive, per source convention) upper bound.
    pub high: u64,
    /// Number of samples that fell in this bucket.
    pub count: u64,
}

impl Bucket {
    /// Midpoint used for mean/percentile computation.
    pub fn midpoint(&self) -> f64 {
        (self.low as f64 + self.high as f64) / 2.0
    }
}

/// A parsed and derived histogram, e.g. from `biolatency` or `runqlat`
/// BCC-style output.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Histogram {
    /// Metric name, e.g. `"disk-io-latency"`.
    pub name: String,
    /// Unit of the bucket boundaries, e.g. `"us"`.
    pub unit: String,
    /// Buckets in ascending `low` order.
    pub buckets: Vec<Bucket>,
    /// Total sample count across all buckets.
    pub total: u64,
    /// Mean of bucket midpoints weighted by count.
    pub mean: f64,
    /// 50th percentile.
    pub p50: f64,
    /// 90th percentile.
    pub p90: f64,
    /// 99th percentile.
    pub p99: f64,
    /// 99.9th percentile.
    pub p999: f64,
    /// Maximum observed value, the `high` of the last bucket.
    pub max: f64,
}

impl Histogram {
    /// Derive total/mean/percentiles/max from an ordered bucket list.
    ///
    /// Buckets must already be in ascending `low` order; this function
    /// does not sort them, matching the source data's natural order
    /// (see the histogram parser, which preserves encounter order).
    pub fn from_buckets(name: impl Into<String>, unit: impl Into<String>, buckets: Vec<Bucket>) -> Self {
        let total: u64 = buckets.iter().map(|b| b.count).sum();
        let mean = if total == 0 {
            0.0
        } else {
            buckets.iter().map(|b| b.midpoint() * b.count as f64).sum::<f64>() / total as f64
        };
        let max = buckets.last().map(|b| b.high as f64).unwrap_or(0.0);

        let percentile = |p: f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            let target = (total as f64 * p).ceil() as u64;
            let mut cumulative = 0u64;
            for b in &buckets {
                cumulative += b.count;
                if cumulative >= target {
                    return b.midpoint();
                }
            }
            buckets.last().map(|b| b.midpoint()).unwrap_or(0.0)
        };

        Self {
            name: name.into(),
            unit: unit.into(),
            p50: percentile(0.50),
            p90: percentile(0.90),
            p99: percentile(0.99),
            p999: percentile(0.999),
            max,
            mean,
            total,
            buckets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Histogram {
        Histogram::from_buckets(
            "biolatency",
            "us",
            vec![
                Bucket { low: 0, high: 1, count: 1 },
                Bucket { low: 2, high: 4, count: 2 },
                Bucket { low: 4, high: 8, count: 4 },
                Bucket { low: 8, high: 16, count: 93 },
            ],
        )
    }

    #[test]
    fn total_sums_all_bucket_counts() {
        assert_eq!(sample().total, 100);
    }

    #[test]
    fn max_is_high_of_last_bucket() {
        assert_eq!(sample().max, 16.0);
    }

    #[test]
    fn p50_uses_smallest_bucket_whose_cumulative_meets_target() {
        // cumulative: 1, 3, 7, 100; target = ceil(100*0.5) = 50 -> last bucket
        let h = sample();
        assert_eq!(h.p50, Bucket { low: 8, high: 16, count: 93 }.midpoint());
    }

    #[test]
    fn empty_histogram_has_zeroed_derived_fields() {
        let h = Histogram::from_buckets("empty", "us", vec![]);
        assert_eq!(h.total, 0);
        assert_eq!(h.mean, 0.0);
        assert_eq!(h.p99, 0.0);
        assert_eq!(h.max, 0.0);
    }

    #[test]
    fn repeated_derivation_is_byte_identical() {
        let a = sample();
        let b = sample();
        assert_eq!(a.p50, b.p50);
        assert_eq!(a.p99, b.p99);
        assert_eq!(a.mean, b.mean);
    }
}
