pub mod corpus;
pub mod detector;
pub mod eval;
pub mod generator;

pub use corpus::{load_corpus, CorpusError, LoadedCorpus, LoadedSeries};
pub use detector::{
    run_with_timeout, BaselineDetector, CommandDetector, DetectionRequest, DetectionScores,
    Detector, DetectorError,
};
pub use eval::{aggregate, EvalError, EvaluationPlan, Harness, MetricNaming};
pub use generator::{build_corpus, profile_for, synthesize, CorpusManifest, CorpusSpec, GenerationError};
