use std::io::Write;

use clap::Parser;
use reportscope::{
    AppConfig,
    CorpusAnalyzer,
    ReportingExtractor,
    config_path,
    error,
    extractor,
};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Cli, Command, ExtractArgs, RelevanceArgs};

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("REPORTSCOPE_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Command::Completions(args) = &cli.command {
        args.generate();
        return Ok(());
    }

    let source = config_path::resolve(cli.config.as_deref());
    tracing::debug!(?source, "resolved configuration");
    let mut config = config_path::load(&source)?;

    match cli.command {
        Command::Relevance(args) => cmd_relevance(&mut config, &args)?,
        Command::Extract(args) => cmd_extract(&mut config, &args)?,
        Command::Completions(_) => {}
    }

    Ok(())
}

fn cmd_relevance(
    config: &mut AppConfig,
    args: &RelevanceArgs,
) -> error::Result<()> {
    if let Some(k) = args.clusters {
        config.clustering.n_clusters = k;
    }
    if let Some(seed) = args.seed {
        config.clustering.seed = seed;
    }
    config.validate()?;

    let report = CorpusAnalyzer::new(config).analyze(&args.dir)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report.write_json(&mut out)?;
    } else {
        report.write_human(&mut out)?;
    }
    out.flush()?;
    Ok(())
}

fn cmd_extract(
    config: &mut AppConfig,
    args: &ExtractArgs,
) -> error::Result<()> {
    let extraction = &mut config.extraction;
    if let Some(range) = args.context_range {
        extraction.context_range = range;
    }
    if let Some(max_merge) = args.max_merge {
        extraction.max_merge = max_merge;
    }
    if args.mark_verbs {
        extraction.mark_verbs = true;
    }

    let reporting =
        ReportingExtractor::from_lexicon_file(&args.lexicon, extraction)?;
    let outcome = reporting.extract_dir(&args.dir)?;

    if !outcome.errors.is_empty() {
        eprintln!("Files with errors:");
        for e in &outcome.errors {
            eprintln!("  {e}");
        }
    }

    if outcome.rows.is_empty() {
        tracing::warn!("no reporting sentences found, nothing written");
        return Ok(());
    }

    extractor::write_csv_file(&outcome.rows, &args.output)?;
    println!(
        "Wrote {} rows to {}",
        outcome.rows.len(),
        args.output.display()
    );
    Ok(())
}
