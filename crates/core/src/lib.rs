pub mod config;
pub mod domain;
pub mod error;
pub mod params;
pub mod record;
pub mod series;

pub use config::Config;
pub use domain::Domain;
pub use error::*;
pub use params::{DatasetParams, DetectionParams, ParamEntry, ParamTable, ScoreOverride};
pub use record::{AggregateResult, EvaluationRecord, Outcome};
pub use series::{AnomalousInterval, Archetype, MetricSeries, SeriesPoint};
