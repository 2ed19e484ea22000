use anyhow::Context;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use factbook_languages::output::{keep_in_compact, write_grouped, write_jsonl};
use factbook_languages::parallel::{process_batch_parallel, ParallelConfig};
use factbook_languages::sources::{load_code_table, load_raw_entries, LANGUAGES_FIELD};
use factbook_languages::{Heuristics, Pipeline, Stats, TableKind};

/// Processing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    /// One entry after another on the main thread
    Sequential,
    /// Batches of entries spread over worker threads
    BatchParallel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Object keyed by country code
    Json,
    /// One flat record per line
    Jsonl,
}

#[derive(Parser)]
#[command(name = "factbook-languages")]
#[command(about = "Turn Factbook language prose into per-country language records")]
struct Args {
    /// Factbook country data (.json or .json.bz2)
    countries_data: PathBuf,

    /// Output file
    output: PathBuf,

    /// Language code dataset: {"<code>": "<name>"}
    #[arg(long, default_value = "data/language_code.json")]
    language_codes: PathBuf,

    /// Country code dataset: {"<code>": "<name>"}
    #[arg(long, default_value = "data/country_code.json")]
    country_codes: PathBuf,

    /// Field holding the language description
    #[arg(long, default_value = LANGUAGES_FIELD)]
    field: String,

    /// Path to heuristics YAML (default: schema/heuristics.yaml, else built-in)
    #[arg(long)]
    heuristics: Option<PathBuf>,

    /// Processing strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::BatchParallel)]
    strategy: Strategy,

    /// Number of threads (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    threads: usize,

    /// Batch size for batch-parallel strategy
    #[arg(long, default_value_t = 64)]
    batch_size: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Leave out unresolved languages with no share past position 5
    #[arg(long)]
    compact: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn print_stats(stats: &Stats, strategy: Strategy) {
    println!();
    println!("============================================================");
    println!("Strategy: {:?}", strategy);
    println!("Entries processed: {}", stats.entries_processed);
    println!("Empty entries: {}", stats.empty_entries);
    println!("Unresolved countries: {}", stats.countries_unresolved);
    println!("Clauses parsed: {}", stats.clauses_parsed);
    println!("Records written: {}", stats.records_written);
    println!("------------------------------------------------------------");
    println!("Language resolution:");
    println!("  exact: {}", stats.exact);
    println!("  fuzzy: {}", stats.fuzzy);
    println!("  unresolved: {}", stats.unresolved);
    println!("  flagged for review: {}", stats.flagged_for_review);
    println!("------------------------------------------------------------");
    println!("Time: {:.2}s", stats.elapsed.as_secs_f64());
    println!("============================================================");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let heuristics = Heuristics::discover(args.heuristics.as_deref()).context("loading heuristics")?;

    let languages = load_code_table(&args.language_codes, TableKind::Language, heuristics.languages.clone())
        .with_context(|| format!("loading language codes from {}", args.language_codes.display()))?;
    let countries = load_code_table(&args.country_codes, TableKind::Country, heuristics.countries.clone())
        .with_context(|| format!("loading country codes from {}", args.country_codes.display()))?;
    let entries = load_raw_entries(&args.countries_data, &args.field)
        .with_context(|| format!("loading country data from {}", args.countries_data.display()))?;

    let mut config = ParallelConfig::default();
    if args.threads > 0 {
        config.num_threads = args.threads;
    }
    config.batch_size = args.batch_size;

    if !args.quiet {
        println!("Parsing: {}", args.countries_data.display());
        println!("Output: {}", args.output.display());
        println!("Strategy: {:?}", args.strategy);
        if args.strategy != Strategy::Sequential {
            println!("Threads: {}", config.num_threads);
        }
        println!("Countries: {}", entries.len());
        println!();
    }

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
        pb
    };
    let total = entries.len();
    let report_progress = |done: usize| pb.set_message(format!("Processed {}/{} countries", done, total));

    let start_time = Instant::now();
    let pipeline = Pipeline::new(&heuristics, &languages, &countries);
    let processed = match args.strategy {
        Strategy::Sequential => pipeline.process_sequential(&entries, report_progress),
        Strategy::BatchParallel => process_batch_parallel(&pipeline, &entries, &config, report_progress),
    };
    let mut report = pipeline.finish(processed, start_time.elapsed());
    pb.finish_and_clear();
    if args.compact {
        report.records.retain(keep_in_compact);
        report.stats.records_written = report.records.len();
    }

    let output = File::create(&args.output).with_context(|| format!("creating {}", args.output.display()))?;
    let mut writer = BufWriter::with_capacity(256 * 1024, output);
    match args.format {
        Format::Json => write_grouped(&report.records, &mut writer),
        Format::Jsonl => write_jsonl(&report.records, &mut writer),
    }
    .with_context(|| format!("writing {}", args.output.display()))?;

    if !args.quiet {
        print_stats(&report.stats, args.strategy);
    }

    Ok(())
}
