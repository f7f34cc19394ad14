use std::{env, path::PathBuf, process::ExitCode, time::Instant};

use group_similarity::{ConfigFile, Pipeline, PipelineConfig, SimilarityError};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    dataset: Option<String>,
    snapshot: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    counts: Option<PathBuf>,
    group_column: Option<String>,
    term_column: Option<String>,
    min_rows: Option<usize>,
    workers: Option<usize>,
    serial: bool,
    parallel_similarity: bool,
    keep_empty: bool,
}

enum Command {
    Run(Args),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut parsed = Args::default();
    while let Some(a) = args.next() {
        let mut value = |flag: &str| args.next().ok_or_else(|| format!("{flag} requires a value"));
        match a.as_str() {
            "--config" => parsed.config = Some(value("--config")?.into()),
            "--dataset" => parsed.dataset = Some(value("--dataset")?),
            "--from-snapshot" => parsed.snapshot = Some(value("--from-snapshot")?.into()),
            "--input" => parsed.input = Some(value("--input")?.into()),
            "--output" => parsed.output = Some(value("--output")?.into()),
            "--counts" => parsed.counts = Some(value("--counts")?.into()),
            "--group-column" => parsed.group_column = Some(value("--group-column")?),
            "--term-column" => parsed.term_column = Some(value("--term-column")?),
            "--min-rows" => parsed.min_rows = Some(parse_positive("--min-rows", &value("--min-rows")?)?),
            "--workers" => parsed.workers = Some(parse_positive("--workers", &value("--workers")?)?),
            "--serial" => parsed.serial = true,
            "--parallel-similarity" => parsed.parallel_similarity = true,
            "--keep-empty" => parsed.keep_empty = true,
            "-h" | "--help" => return Ok(Command::Help),
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(Command::Run(parsed))
}

fn parse_positive(flag: &str, v: &str) -> Result<usize, String> {
    match v.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("{flag} needs a positive integer, got `{v}`")),
    }
}

fn print_usage() {
    eprintln!("Usage: group-similarity [--config FILE [--dataset NAME]] [--input CSV] [--output CSV] [--counts FILE]");
    eprintln!("                        [--group-column COL] [--term-column COL] [--min-rows N]");
    eprintln!("                        [--workers N] [--serial] [--parallel-similarity] [--keep-empty]");
    eprintln!("                        [--from-snapshot FILE]");
    eprintln!("Writes the group x group cosine similarity matrix as CSV to --output.");
    eprintln!("--counts saves per-group term counts (.json for JSON, otherwise CBOR).");
    eprintln!("--from-snapshot recomputes the matrix from saved term counts instead of --input.");
}

/// Config file (if any), then dataset preset, then command line flags.
fn resolve_config(args: &Args) -> Result<PipelineConfig, SimilarityError> {
    let mut config = match &args.config {
        Some(path) => ConfigFile::load(path)?.select(args.dataset.as_deref())?,
        None if args.dataset.is_some() => {
            return Err(SimilarityError::InvalidConfig { reason: "--dataset needs --config".to_string() });
        }
        None => PipelineConfig::default(),
    };
    if args.input.is_some() {
        config.input = args.input.clone();
    }
    if args.output.is_some() {
        config.matrix_output = args.output.clone();
    }
    if args.counts.is_some() {
        config.counts_output = args.counts.clone();
    }
    if let Some(c) = &args.group_column {
        config.group_column = c.clone();
    }
    if let Some(c) = &args.term_column {
        config.term_column = c.clone();
    }
    if let Some(n) = args.min_rows {
        config.min_rows = n;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if args.serial {
        config.parallel = false;
    }
    if args.parallel_similarity {
        config.parallel_similarity = true;
    }
    if args.keep_empty {
        config.terms.keep_empty = true;
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), SimilarityError> {
    let config = resolve_config(&args)?;
    if config.runs_parallel() {
        info!(workers = config.worker_count(), "starting on worker pool");
    } else {
        info!("starting serially");
    }
    let pipeline = Pipeline::new(config)?;
    let output = match &args.snapshot {
        Some(snapshot) => pipeline.execute_from_snapshot(snapshot)?,
        None => pipeline.execute()?,
    };
    debug!("similarity matrix\n{}", output.matrix);
    info!(
        groups = output.matrix.len(),
        vocabulary = output.vocabulary.len(),
        excluded = output.counts.excluded().count(),
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let program_start = Instant::now();
    let args = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            error!("{msg}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => {
            info!(elapsed_ms = program_start.elapsed().as_millis() as u64, "program total");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, String> {
        parse_args(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn flags_override_defaults() {
        let Ok(Command::Run(args)) = parse(&["--input", "in.csv", "--output", "out.csv", "--min-rows", "3", "--serial"]) else {
            panic!("expected run");
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.input, Some(PathBuf::from("in.csv")));
        assert_eq!(config.matrix_output, Some(PathBuf::from("out.csv")));
        assert_eq!(config.min_rows, 3);
        assert!(!config.parallel);
    }

    #[test]
    fn rejects_bad_numbers_and_unknown_flags() {
        assert!(parse(&["--min-rows", "0"]).is_err());
        assert!(parse(&["--workers", "many"]).is_err());
        assert!(parse(&["--input"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(matches!(parse(&["--help"]), Ok(Command::Help)));
    }

    #[test]
    fn dataset_without_config_is_an_error() {
        let Ok(Command::Run(args)) = parse(&["--dataset", "flickr-sunset"]) else {
            panic!("expected run");
        };
        assert!(resolve_config(&args).is_err());
    }
}
