//! Per-domain value distributions and anomaly archetypes.
//!
//! Every supported [`Domain`] has exactly one immutable [`DomainProfile`].
//! Ranges follow the operational meaning of each metric: response times in
//! milliseconds, page loads in seconds, error rates and memory usage in
//! percent, request counts and throughput as raw counts.

use std::fmt;

use serde::Serialize;

use metricbench_core::Domain;

/// Half-open uniform sampling range `[lo, hi)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub lo: f64,
    pub hi: f64,
}

impl ValueRange {
    pub const fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }
}

/// Inclusive clamp bounds for emitted values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn at_least(min: f64) -> Self {
        Self {
            min,
            max: f64::INFINITY,
        }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Dominant archetype: a plateau around a per-interval base value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlateauSpec {
    /// Range the per-interval base is drawn from.
    pub base: ValueRange,
    /// Each point is `base + U(-jitter, jitter)`.
    pub jitter: f64,
}

/// Archetype used when the dominant one is not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlternateArchetype {
    /// Values drawn independently from a range far below normal.
    Suppressed { range: ValueRange },
    /// Linear growth from the value preceding the interval, capped at the
    /// domain's upper bound.
    Drift { rate: ValueRange },
}

/// Output precision applied to the finished series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    Raw,
    Decimals(u32),
    Integer,
}

impl Rounding {
    pub fn apply(&self, value: f64) -> f64 {
        match *self {
            Rounding::Raw => value,
            Rounding::Decimals(places) => {
                let factor = 10f64.powi(places as i32);
                (value * factor).round() / factor
            }
            Rounding::Integer => value.round(),
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rounding::Raw => write!(f, "raw"),
            Rounding::Decimals(n) => write!(f, "{n} decimal(s)"),
            Rounding::Integer => write!(f, "integer"),
        }
    }
}

/// Immutable generation parameters for one metric domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainProfile {
    pub domain: Domain,
    pub normal: ValueRange,
    pub noise_std: f64,
    /// Lower floor applied to the normal signal after noise.
    pub normal_floor: f64,
    /// Clamp applied to every emitted value.
    pub valid: Bounds,
    pub elevated: PlateauSpec,
    /// Probability that an interval uses the elevated plateau.
    pub dominant_probability: f64,
    pub alternate: Option<AlternateArchetype>,
    pub rounding: Rounding,
    /// Inclusive range for the number of anomalous intervals.
    pub interval_count: (usize, usize),
    /// Inclusive range for interval duration.
    pub duration: (usize, usize),
    /// Minimum separation between interval starts.
    pub min_distance: usize,
    /// Interval starts are drawn from `[head_margin, length - tail_margin)`.
    pub head_margin: usize,
    pub tail_margin: usize,
}

const INTERVAL_COUNT: (usize, usize) = (2, 4);
const DURATION: (usize, usize) = (3, 5);
pub const DEFAULT_MIN_DISTANCE: usize = 100;
const HEAD_MARGIN: usize = 50;
const TAIL_MARGIN: usize = 20;

pub static ERROR_RATE: DomainProfile = DomainProfile {
    domain: Domain::ErrorRate,
    normal: ValueRange::new(1.0, 3.0),
    noise_std: 0.2,
    normal_floor: 0.0,
    valid: Bounds::between(0.0, 100.0),
    elevated: PlateauSpec {
        base: ValueRange::new(10.0, 20.0),
        jitter: 2.0,
    },
    dominant_probability: 1.0,
    alternate: None,
    rounding: Rounding::Raw,
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

pub static MEMORY_USAGE: DomainProfile = DomainProfile {
    domain: Domain::MemoryUsage,
    normal: ValueRange::new(20.0, 30.0),
    noise_std: 2.0,
    normal_floor: 0.0,
    valid: Bounds::between(0.0, 100.0),
    elevated: PlateauSpec {
        base: ValueRange::new(50.0, 70.0),
        jitter: 3.0,
    },
    dominant_probability: 0.95,
    alternate: Some(AlternateArchetype::Drift {
        rate: ValueRange::new(5.0, 10.0),
    }),
    rounding: Rounding::Decimals(1),
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

pub static PAGE_LOAD: DomainProfile = DomainProfile {
    domain: Domain::PageLoad,
    normal: ValueRange::new(1.0, 3.0),
    noise_std: 0.2,
    normal_floor: 0.1,
    valid: Bounds::at_least(0.1),
    elevated: PlateauSpec {
        base: ValueRange::new(10.0, 20.0),
        jitter: 2.0,
    },
    dominant_probability: 0.8,
    alternate: Some(AlternateArchetype::Suppressed {
        range: ValueRange::new(0.1, 0.3),
    }),
    rounding: Rounding::Raw,
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

pub static REQUEST_COUNT: DomainProfile = DomainProfile {
    domain: Domain::RequestCount,
    normal: ValueRange::new(20.0, 50.0),
    noise_std: 5.0,
    normal_floor: 1.0,
    valid: Bounds::at_least(0.0),
    elevated: PlateauSpec {
        base: ValueRange::new(200.0, 300.0),
        jitter: 20.0,
    },
    dominant_probability: 0.85,
    alternate: Some(AlternateArchetype::Suppressed {
        range: ValueRange::new(0.0, 5.0),
    }),
    rounding: Rounding::Integer,
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

pub static RESPONSE_TIME: DomainProfile = DomainProfile {
    domain: Domain::ResponseTime,
    normal: ValueRange::new(200.0, 300.0),
    noise_std: 15.0,
    normal_floor: 0.0,
    valid: Bounds::at_least(0.0),
    elevated: PlateauSpec {
        base: ValueRange::new(600.0, 800.0),
        jitter: 40.0,
    },
    dominant_probability: 1.0,
    alternate: None,
    rounding: Rounding::Decimals(1),
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

pub static THROUGHPUT: DomainProfile = DomainProfile {
    domain: Domain::Throughput,
    normal: ValueRange::new(950.0, 1050.0),
    noise_std: 20.0,
    normal_floor: 0.0,
    valid: Bounds::at_least(0.0),
    elevated: PlateauSpec {
        base: ValueRange::new(1600.0, 2300.0),
        jitter: 100.0,
    },
    dominant_probability: 0.75,
    alternate: Some(AlternateArchetype::Suppressed {
        range: ValueRange::new(20.0, 50.0),
    }),
    rounding: Rounding::Raw,
    interval_count: INTERVAL_COUNT,
    duration: DURATION,
    min_distance: DEFAULT_MIN_DISTANCE,
    head_margin: HEAD_MARGIN,
    tail_margin: TAIL_MARGIN,
};

/// The read-only profile for a domain.
pub fn profile_for(domain: Domain) -> &'static DomainProfile {
    match domain {
        Domain::ErrorRate => &ERROR_RATE,
        Domain::MemoryUsage => &MEMORY_USAGE,
        Domain::PageLoad => &PAGE_LOAD,
        Domain::RequestCount => &REQUEST_COUNT,
        Domain::ResponseTime => &RESPONSE_TIME,
        Domain::Throughput => &THROUGHPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_domain_has_matching_profile() {
        for domain in Domain::ALL {
            assert_eq!(profile_for(domain).domain, domain);
        }
    }

    #[test]
    fn anomaly_ranges_sit_outside_normal_range() {
        for domain in Domain::ALL {
            let profile = profile_for(domain);
            assert!(
                profile.elevated.base.lo - profile.elevated.jitter > profile.normal.hi,
                "{domain}: elevated plateau overlaps normal range"
            );
            if let Some(AlternateArchetype::Suppressed { range }) = profile.alternate {
                assert!(range.hi <= profile.normal.lo, "{domain}: suppressed overlaps normal");
            }
        }
    }

    #[test]
    fn placement_margins_leave_room_for_durations() {
        for domain in Domain::ALL {
            let profile = profile_for(domain);
            assert!(profile.tail_margin >= profile.duration.1);
            assert!(profile.interval_count.0 <= profile.interval_count.1);
            assert!(profile.duration.0 >= 1);
        }
    }

    #[test]
    fn rounding_rules() {
        assert_eq!(Rounding::Decimals(1).apply(12.345), 12.3);
        assert_eq!(Rounding::Integer.apply(4.5), 5.0);
        assert_eq!(Rounding::Raw.apply(0.123456), 0.123456);
    }

    #[test]
    fn bounds_clamp_open_ceiling() {
        let b = Bounds::at_least(0.1);
        assert_eq!(b.clamp(-3.0), 0.1);
        assert_eq!(b.clamp(1e9), 1e9);
        assert!(b.contains(0.1));
    }
}
