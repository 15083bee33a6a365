use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use metricbench_compute::detector::baseline::DEFAULT_THRESHOLD;

/// Synthetic metric benchmarks and offline anomaly-detector evaluation.
///
/// Settings come from the environment (and `.env`), optionally under a
/// profile prefix; flags given here take precedence.
#[derive(Parser, Debug)]
#[command(name = "metricbench", about = "Synthetic metric benchmarks and offline detector evaluation")]
pub struct CliArgs {
    /// Config profile; keys are read as {PROFILE}_{KEY} before {KEY}
    #[arg(long, global = true, env = "METRICBENCH_PROFILE")]
    pub profile: Option<String>,

    /// Worker threads for per-series work (0 = one per core)
    #[arg(long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate labeled synthetic corpora
    Generate(GenerateArgs),

    /// Evaluate a detector over a corpus
    Evaluate(EvaluateArgs),

    /// Print the generation profile of every domain
    Domains,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Domains to generate (default: all)
    #[arg(value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Series per domain
    #[arg(long)]
    pub num_files: Option<usize>,

    /// Shortest series length (inclusive)
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Longest series length (inclusive)
    #[arg(long)]
    pub max_length: Option<usize>,

    /// File i is generated from seed base_seed + i
    #[arg(long)]
    pub base_seed: Option<u64>,

    /// Root directory; each domain goes to {data_dir}/{domain}_benchmark
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetectorKind {
    /// Robust z-score on the training median/MAD
    Baseline,
    /// External program speaking JSON over stdin/stdout
    Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NamingKind {
    /// {prefix}_{n} by sorted position
    Positional,
    /// The series file name without extension
    FileStem,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Dataset name, used for params lookup and report names
    pub dataset: String,

    /// Corpus directory (default: {data_dir}/{dataset}_benchmark)
    #[arg(long)]
    pub corpus_dir: Option<PathBuf>,

    /// Report and figure directory (default: {results_dir}/{dataset})
    #[arg(long)]
    pub res_dir: Option<PathBuf>,

    /// Learned pattern directory (default: {pattern_dir}/{dataset})
    #[arg(long)]
    pub pattern_dir: Option<PathBuf>,

    /// Per-metric params file
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Training prefix length; the rest of each series is tested
    #[arg(long)]
    pub train_length: Option<usize>,

    /// Leading points excluded from training (Yahoo A1 uses 5)
    #[arg(long, default_value_t = 0)]
    pub train_skip: usize,

    /// Per-series detector timeout in seconds (0 = none)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// How series are named in the params file, artifacts and reports
    #[arg(long, value_enum, default_value_t = NamingKind::Positional)]
    pub naming: NamingKind,

    /// Positional name prefix (default: the dataset, or "real" for yahoo)
    #[arg(long)]
    pub metric_prefix: Option<String>,

    /// Number given to the first series (default: 1, or 0 for yahoo)
    #[arg(long)]
    pub first_index: Option<usize>,

    #[arg(long, value_enum, default_value_t = DetectorKind::Baseline)]
    pub detector: DetectorKind,

    /// Robust z-score threshold for the baseline detector
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Score the baseline point-wise instead of point-adjusted
    #[arg(long)]
    pub no_point_adjust: bool,

    /// Program run by the command detector
    #[arg(long, required_if_eq("detector", "command"))]
    pub program: Option<String>,

    /// Arguments passed to the program (after --)
    #[arg(last = true)]
    pub program_args: Vec<String>,
}
