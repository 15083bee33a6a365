use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use metricbench_compute::detector::{BaselineDetector, CommandDetector, Detector};
use metricbench_compute::eval::report::{format_summary, write_report};
use metricbench_compute::generator::profile::AlternateArchetype;
use metricbench_compute::{
    build_corpus, load_corpus, profile_for, CorpusSpec, EvaluationPlan, Harness, MetricNaming,
};
use metricbench_core::params::default_params_for;
use metricbench_core::{Config, Domain, ParamTable};

use crate::cli::{DetectorKind, EvaluateArgs, GenerateArgs, NamingKind};

// ── generate ─────────────────────────────────────────────────────

pub fn generate(config: &Config, args: GenerateArgs) -> Result<()> {
    let domains: Vec<Domain> = if args.domains.is_empty() {
        Domain::ALL.to_vec()
    } else {
        args.domains
            .iter()
            .map(|d| Domain::from_str(d))
            .collect::<Result<_, _>>()?
    };

    let mut generator = config.generator.clone();
    if let Some(n) = args.num_files {
        generator.num_files = n;
    }
    if let Some(min) = args.min_length {
        generator.min_length = min;
    }
    if let Some(max) = args.max_length {
        generator.max_length = max;
    }
    if let Some(seed) = args.base_seed {
        generator.base_seed = seed;
    }
    let spec = CorpusSpec {
        num_files: generator.num_files,
        length_range: generator.length_range()?,
        base_seed: generator.base_seed,
    };
    let data_dir = args.data_dir.unwrap_or_else(|| config.storage.data_dir.clone());

    for domain in domains {
        let dir = data_dir.join(domain.corpus_dir_name());
        let manifest = build_corpus(profile_for(domain), &spec, &dir)
            .with_context(|| format!("failed to build {domain} corpus in {}", dir.display()))?;

        println!(
            "Generated {} {} series in {}",
            manifest.files.len(),
            domain,
            dir.display()
        );
        if !manifest.failures.is_empty() {
            warn!(domain = %domain, failed = manifest.failures.len(), "some series could not be generated");
        }
    }
    Ok(())
}

// ── evaluate ─────────────────────────────────────────────────────

fn build_detector(args: &EvaluateArgs) -> Result<Arc<dyn Detector>> {
    let detector: Arc<dyn Detector> = match args.detector {
        DetectorKind::Baseline => Arc::new(BaselineDetector::new(args.threshold, !args.no_point_adjust)),
        DetectorKind::Command => {
            let program = args
                .program
                .clone()
                .context("--program is required with --detector command")?;
            Arc::new(CommandDetector::new(program).with_args(args.program_args.iter().cloned()))
        }
    };
    Ok(detector)
}

/// Dataset default naming, with prefix and first index overridable by flags.
fn metric_naming(args: &EvaluateArgs) -> MetricNaming {
    match args.naming {
        NamingKind::FileStem => MetricNaming::FileStem,
        NamingKind::Positional => match MetricNaming::for_dataset(&args.dataset) {
            MetricNaming::Positional {
                prefix,
                first_index,
            } => MetricNaming::positional(
                args.metric_prefix.clone().unwrap_or(prefix),
                args.first_index.unwrap_or(first_index),
            ),
            other => other,
        },
    }
}

pub fn evaluate(config: &Config, args: EvaluateArgs) -> Result<()> {
    let dataset = args.dataset.as_str();
    let storage = &config.storage;

    let corpus_dir = args
        .corpus_dir
        .clone()
        .unwrap_or_else(|| storage.data_dir.join(format!("{dataset}_benchmark")));
    let res_dir: PathBuf = args
        .res_dir
        .clone()
        .unwrap_or_else(|| storage.results_dir.join(dataset));
    let pattern_dir = args
        .pattern_dir
        .clone()
        .unwrap_or_else(|| storage.pattern_dir.join(dataset));
    let params_path = args.params.clone().unwrap_or_else(|| storage.params_path.clone());

    let corpus = load_corpus(&corpus_dir)
        .with_context(|| format!("failed to load corpus {}", corpus_dir.display()))?;
    let table = ParamTable::load(&params_path)
        .with_context(|| format!("failed to load params {}", params_path.display()))?;
    let params = table.dataset(dataset, default_params_for(dataset));

    let timeout = match args.timeout_secs {
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
        None => config.evaluation.detector_timeout(),
    };

    let detector = build_detector(&args)?;
    let plan = EvaluationPlan::new(dataset, params)
        .with_train_length(args.train_length.unwrap_or(config.evaluation.train_length))
        .with_train_skip(args.train_skip)
        .with_naming(metric_naming(&args))
        .with_pattern_dir(pattern_dir)
        .with_figure_dir(res_dir.clone())
        .with_timeout(timeout);

    let records = Harness::new(Arc::clone(&detector), plan).evaluate(&corpus)?;

    match write_report(&res_dir, dataset, detector.name(), &records)? {
        Some(report) => {
            println!("\n{}", format_summary(dataset, &report.aggregate));
            if report.aggregate.failed_count > 0 {
                println!(
                    "{} of {} series failed and were scored as zero",
                    report.aggregate.failed_count, report.aggregate.series_count
                );
            }
            println!("\nDetailed results saved to: {}", report.results_path.display());
        }
        None => warn!(dataset, "no series evaluated, nothing to report"),
    }
    Ok(())
}

// ── domains ──────────────────────────────────────────────────────

pub fn domains() -> Result<()> {
    for domain in Domain::ALL {
        let p = profile_for(domain);
        let alternate = match p.alternate {
            None => "none".to_string(),
            Some(AlternateArchetype::Suppressed { range }) => {
                format!("suppressed {}-{} ({:.0}%)", range.lo, range.hi, (1.0 - p.dominant_probability) * 100.0)
            }
            Some(AlternateArchetype::Drift { rate }) => {
                format!("drift +{}-{}/step ({:.0}%)", rate.lo, rate.hi, (1.0 - p.dominant_probability) * 100.0)
            }
        };
        println!("{domain}");
        println!("  normal:     {}-{} (noise sd {}, floor {})", p.normal.lo, p.normal.hi, p.noise_std, p.normal_floor);
        println!("  valid:      {} to {}", p.valid.min, p.valid.max);
        println!("  elevated:   base {}-{} +/- {}", p.elevated.base.lo, p.elevated.base.hi, p.elevated.jitter);
        println!("  alternate:  {alternate}");
        println!("  rounding:   {}", p.rounding);
        println!(
            "  intervals:  {}-{} x {}-{} points, starts >= {} apart",
            p.interval_count.0, p.interval_count.1, p.duration.0, p.duration.1, p.min_distance
        );
    }
    info!(count = Domain::ALL.len(), "listed domain profiles");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CliArgs, Command};
    use clap::Parser;

    fn evaluate_args(argv: &[&str]) -> EvaluateArgs {
        let mut full = vec!["metricbench", "evaluate"];
        full.extend_from_slice(argv);
        match CliArgs::try_parse_from(full).unwrap().command {
            Command::Evaluate(args) => args,
            other => panic!("expected evaluate, got {other:?}"),
        }
    }

    #[test]
    fn naming_follows_dataset_conventions() {
        assert_eq!(
            metric_naming(&evaluate_args(&["response_time"])),
            MetricNaming::positional("response_time", 1)
        );
        assert_eq!(metric_naming(&evaluate_args(&["yahoo"])), MetricNaming::positional("real", 0));
    }

    #[test]
    fn naming_flags_override_defaults() {
        assert_eq!(
            metric_naming(&evaluate_args(&["a1", "--metric-prefix", "real", "--first-index", "0"])),
            MetricNaming::positional("real", 0)
        );
        assert_eq!(
            metric_naming(&evaluate_args(&["a1", "--naming", "file-stem"])),
            MetricNaming::FileStem
        );
    }
}
