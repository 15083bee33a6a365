use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Operational metric domains the benchmark generator knows how to synthesize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    ErrorRate,
    MemoryUsage,
    PageLoad,
    RequestCount,
    ResponseTime,
    Throughput,
}

impl Domain {
    pub const ALL: [Domain; 6] = [
        Domain::ErrorRate,
        Domain::MemoryUsage,
        Domain::PageLoad,
        Domain::RequestCount,
        Domain::ResponseTime,
        Domain::Throughput,
    ];

    /// Snake-case name used in file names, params keys and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::ErrorRate => "error_rate",
            Domain::MemoryUsage => "memory_usage",
            Domain::PageLoad => "page_load",
            Domain::RequestCount => "request_count",
            Domain::ResponseTime => "response_time",
            Domain::Throughput => "throughput",
        }
    }

    /// Default corpus directory name under the data dir.
    pub fn corpus_dir_name(&self) -> String {
        format!("{}_benchmark", self.as_str())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Domain::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnknownDomain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_domain() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
    }

    #[test]
    fn parse_accepts_dashes_and_case() {
        assert_eq!("Response-Time".parse::<Domain>().unwrap(), Domain::ResponseTime);
    }

    #[test]
    fn parse_rejects_unknown() {
        assert!(matches!(
            "latency".parse::<Domain>(),
            Err(ConfigError::UnknownDomain(_))
        ));
    }

    #[test]
    fn corpus_dir_name_uses_benchmark_suffix() {
        assert_eq!(Domain::MemoryUsage.corpus_dir_name(), "memory_usage_benchmark");
    }
}
