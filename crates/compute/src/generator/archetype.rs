//! Sampling of normal signal and anomalous interval values.

use rand::Rng;
use rand_distr::Normal;

use metricbench_core::{AnomalousInterval, Archetype};

use super::profile::{AlternateArchetype, DomainProfile, ValueRange};
use super::GenerationError;

fn uniform<R: Rng>(rng: &mut R, range: ValueRange) -> f64 {
    if range.hi <= range.lo {
        return range.lo;
    }
    rng.gen_range(range.lo..range.hi)
}

/// Normal signal: uniform draw per step plus Gaussian noise, floored and clamped.
pub fn sample_normal_series<R: Rng>(
    profile: &DomainProfile,
    length: usize,
    rng: &mut R,
) -> Result<Vec<f64>, GenerationError> {
    let noise = Normal::new(0.0, profile.noise_std).map_err(|e| {
        GenerationError::InvalidProfile(format!(
            "{}: noise std {}: {e}",
            profile.domain, profile.noise_std
        ))
    })?;

    let mut values: Vec<f64> = (0..length).map(|_| uniform(rng, profile.normal)).collect();
    for v in values.iter_mut() {
        *v += rng.sample(noise);
        *v = profile.valid.clamp(v.max(profile.normal_floor));
    }
    Ok(values)
}

/// One plateau base per planned interval, drawn independently so anomalies
/// in the same series differ from each other.
pub fn sample_bases<R: Rng>(profile: &DomainProfile, count: usize, rng: &mut R) -> Vec<f64> {
    (0..count).map(|_| uniform(rng, profile.elevated.base)).collect()
}

pub fn choose_archetype<R: Rng>(profile: &DomainProfile, rng: &mut R) -> Archetype {
    let alternate = match profile.alternate {
        Some(alt) => alt,
        None => return Archetype::Elevated,
    };
    if rng.gen::<f64>() < profile.dominant_probability {
        return Archetype::Elevated;
    }
    match alternate {
        AlternateArchetype::Suppressed { .. } => Archetype::Suppressed,
        AlternateArchetype::Drift { .. } => Archetype::Drift,
    }
}

/// Overwrite `values[interval]` with archetype-specific values, clamped into
/// the domain's valid bounds.
pub fn fill_interval<R: Rng>(
    profile: &DomainProfile,
    values: &mut [f64],
    interval: &AnomalousInterval,
    base: f64,
    rng: &mut R,
) {
    let end = interval.end().min(values.len());
    let start = interval.start.min(end);

    match (interval.archetype, profile.alternate) {
        (Archetype::Suppressed, Some(AlternateArchetype::Suppressed { range })) => {
            for v in &mut values[start..end] {
                *v = uniform(rng, range);
            }
        }
        (Archetype::Drift, Some(AlternateArchetype::Drift { rate })) => {
            let origin = match start.checked_sub(1) {
                Some(prev) => values[prev],
                None => profile.normal.lo,
            };
            let step = uniform(rng, rate);
            for (j, v) in values[start..end].iter_mut().enumerate() {
                *v = (origin + step * (j + 1) as f64).min(profile.valid.max);
            }
        }
        _ => {
            let jitter = profile.elevated.jitter;
            for v in &mut values[start..end] {
                *v = base + uniform(rng, ValueRange::new(-jitter, jitter));
            }
        }
    }

    for v in &mut values[start..end] {
        *v = profile.valid.clamp(*v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::{MEMORY_USAGE, PAGE_LOAD, REQUEST_COUNT, RESPONSE_TIME};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn interval(start: usize, duration: usize, archetype: Archetype) -> AnomalousInterval {
        AnomalousInterval {
            start,
            duration,
            archetype,
        }
    }

    #[test]
    fn normal_series_respects_floor_and_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let values = sample_normal_series(&PAGE_LOAD, 2000, &mut rng).unwrap();
        assert_eq!(values.len(), 2000);
        assert!(values.iter().all(|&v| v >= 0.1));
    }

    #[test]
    fn bases_fall_in_elevated_range() {
        let mut rng = StdRng::seed_from_u64(11);
        let bases = sample_bases(&RESPONSE_TIME, 4, &mut rng);
        assert_eq!(bases.len(), 4);
        assert!(bases.iter().all(|&b| (600.0..800.0).contains(&b)));
    }

    #[test]
    fn domain_without_alternate_is_always_elevated() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            assert_eq!(choose_archetype(&RESPONSE_TIME, &mut rng), Archetype::Elevated);
        }
    }

    #[test]
    fn alternate_archetype_is_drawn_sometimes() {
        let mut rng = StdRng::seed_from_u64(5);
        let suppressed = (0..2000)
            .filter(|_| choose_archetype(&REQUEST_COUNT, &mut rng) == Archetype::Suppressed)
            .count();
        // 15% expected
        assert!(suppressed > 150 && suppressed < 450, "suppressed draws: {suppressed}");
    }

    #[test]
    fn elevated_plateau_stays_near_base() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut values = vec![250.0; 20];
        fill_interval(&RESPONSE_TIME, &mut values, &interval(5, 4, Archetype::Elevated), 700.0, &mut rng);

        for &v in &values[5..9] {
            assert!((660.0..740.0).contains(&v), "value {v}");
        }
        assert_eq!(values[4], 250.0);
        assert_eq!(values[9], 250.0);
    }

    #[test]
    fn suppressed_plateau_drops_below_normal() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut values = vec![2.0; 20];
        fill_interval(&PAGE_LOAD, &mut values, &interval(10, 5, Archetype::Suppressed), 15.0, &mut rng);
        assert!(values[10..15].iter().all(|&v| (0.1..0.3).contains(&v)));
    }

    #[test]
    fn drift_grows_monotonically_from_previous_value() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut values = vec![25.0; 20];
        fill_interval(&MEMORY_USAGE, &mut values, &interval(8, 5, Archetype::Drift), 60.0, &mut rng);

        let drift = &values[8..13];
        assert!(drift[0] > 25.0);
        assert!(drift.windows(2).all(|w| w[1] >= w[0]));
        assert!(drift.iter().all(|&v| v <= 100.0));
    }

    #[test]
    fn drift_is_capped_at_ceiling() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut values = vec![98.0; 10];
        fill_interval(&MEMORY_USAGE, &mut values, &interval(2, 5, Archetype::Drift), 60.0, &mut rng);
        assert!(values[2..7].iter().all(|&v| v == 100.0));
    }
}
