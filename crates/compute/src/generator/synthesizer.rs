use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use metricbench_core::{AnomalousInterval, MetricSeries};

use super::archetype::{choose_archetype, fill_interval, sample_bases, sample_normal_series};
use super::profile::DomainProfile;
use super::GenerationError;

/// Upper bound on start-position draws for a single interval.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1000;

/// Result of trying to place one interval start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed(usize),
    Failed { attempts: usize },
}

/// Draw a start in `[head_margin, length - tail_margin)` that is at least
/// `min_distance` from every start in `accepted`.
///
/// The distance check is symmetric, so the order of `accepted` does not
/// matter. Caller guarantees the draw range is non-empty.
pub fn place_start<R: Rng>(
    profile: &DomainProfile,
    length: usize,
    accepted: &[usize],
    rng: &mut R,
) -> Placement {
    let lo = profile.head_margin;
    let hi = length - profile.tail_margin;

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = rng.gen_range(lo..hi);
        if accepted
            .iter()
            .all(|&s| candidate.abs_diff(s) >= profile.min_distance)
        {
            return Placement::Placed(candidate);
        }
    }

    Placement::Failed {
        attempts: MAX_PLACEMENT_ATTEMPTS,
    }
}

/// Synthesize one labeled series. With `Some(seed)` the output is fully
/// determined by `(profile, length, seed)`.
pub fn synthesize(
    profile: &DomainProfile,
    length: usize,
    seed: Option<u64>,
) -> Result<MetricSeries, GenerationError> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    synthesize_with_rng(profile, length, &mut rng)
}

/// Synthesize with a caller-owned generator; the interval count is drawn
/// from the profile's range.
pub fn synthesize_with_rng<R: Rng>(
    profile: &DomainProfile,
    length: usize,
    rng: &mut R,
) -> Result<MetricSeries, GenerationError> {
    let (lo, hi) = profile.interval_count;
    let count = rng.gen_range(lo..=hi);
    synthesize_with_count(profile, length, count, rng)
}

/// Synthesize with a fixed number of anomalous intervals.
pub fn synthesize_with_count<R: Rng>(
    profile: &DomainProfile,
    length: usize,
    count: usize,
    rng: &mut R,
) -> Result<MetricSeries, GenerationError> {
    if length <= profile.head_margin + profile.tail_margin {
        return Err(GenerationError::SeriesTooShort {
            length,
            head: profile.head_margin,
            tail: profile.tail_margin,
        });
    }

    let mut values = sample_normal_series(profile, length, rng)?;
    let bases = sample_bases(profile, count, rng);

    let mut starts: Vec<usize> = Vec::with_capacity(count);
    let mut intervals: Vec<AnomalousInterval> = Vec::with_capacity(count);

    for (index, &base) in bases.iter().enumerate() {
        let start = match place_start(profile, length, &starts, rng) {
            Placement::Placed(start) => start,
            Placement::Failed { attempts } => {
                return Err(GenerationError::PlacementExhausted {
                    index,
                    requested: count,
                    min_distance: profile.min_distance,
                    attempts,
                    length,
                });
            }
        };

        let (d_lo, d_hi) = profile.duration;
        let duration = rng.gen_range(d_lo..=d_hi).min(length - start);

        let interval = AnomalousInterval {
            start,
            duration,
            archetype: choose_archetype(profile, rng),
        };
        fill_interval(profile, &mut values, &interval, base, rng);

        starts.push(start);
        intervals.push(interval);
    }

    for v in values.iter_mut() {
        *v = profile.rounding.apply(*v);
    }
    intervals.sort_by_key(|iv| iv.start);

    debug!(
        domain = %profile.domain,
        length,
        intervals = intervals.len(),
        "series synthesized"
    );

    Ok(MetricSeries::from_intervals(values, intervals))
}
