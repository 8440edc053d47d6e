mod echo;

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};
use owo_colors::OwoColorize;
use reddit_epub_core::{
    CachePolicy, CyclePolicy, DiskCache, Fetcher, HttpTransport, MemoryCache, Paginator, PipelineConfig,
};
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Follow "next" links through Reddit threads and bundle them into an EPUB
#[derive(Parser, Debug)]
#[command(name = "reddit-epub")]
#[command(version)]
#[command(about = "Turn chains of linked Reddit threads into an EPUB", long_about = None)]
struct Args {
    /// Title of the book
    #[arg(short, long, value_name = "TITLE")]
    title: String,

    /// Thread URLs to start each chain from
    #[arg(value_name = "URL", required = true)]
    urls: Vec<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory for cached responses (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Keep responses in memory for this run only
    #[arg(long, conflicts_with_all = ["cache_dir", "max_age"])]
    no_cache: bool,

    /// Refetch cached responses older than this many seconds
    #[arg(long, value_name = "SECS")]
    max_age: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// HTTP timeout in seconds (default: none)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Language of the book
    #[arg(long, default_value = "en", value_name = "LANG")]
    lang: String,

    /// What to do when a chain links back to a visited page (stop, fail)
    #[arg(long, default_value = "stop", value_name = "POLICY")]
    on_cycle: CyclePolicy,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "reddit_epub_core=info",
        1 => "reddit_epub_core=debug,reddit_epub=debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn pipeline_config(args: &Args) -> PipelineConfig {
    let mut builder = PipelineConfig::builder()
        .language(args.lang.as_str())
        .cycle_policy(args.on_cycle)
        .timeout(args.timeout.map(Duration::from_secs));

    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }

    builder.build()
}

fn run(args: &Args) -> anyhow::Result<()> {
    if args.verbose > 0 {
        echo::print_banner();
    }

    let config = pipeline_config(args);
    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;

    let fetcher = if args.no_cache {
        Fetcher::new(transport, MemoryCache::new())
    } else {
        let cache = match &args.cache_dir {
            Some(dir) => DiskCache::new(dir, config.cache_prefix.as_str()),
            None => DiskCache::in_temp_dir(config.cache_prefix.as_str()),
        };
        let policy = CachePolicy { max_age: args.max_age.map(Duration::from_secs) };
        if args.verbose > 0 {
            eprintln!("  {} {}", "Cache:".dimmed(), cache.dir().display().bright_white());
        }
        Fetcher::new(transport, cache.with_policy(policy))
    };

    if args.verbose > 0 {
        echo::print_step(1, 2, &format!("Following {} chain(s)", args.urls.len()));
    }

    let book = Paginator::new(fetcher, config).run(&args.title, &args.urls)?;

    if args.verbose > 0 {
        eprintln!("  {} {}", "Chapters:".dimmed(), book.chapters.len().to_string().bright_white());
        if let Some(author) = &book.author {
            eprintln!("  {} {}", "Author:".dimmed(), author.bright_white());
        }
        echo::print_step(2, 2, "Writing EPUB");
    }

    // Serialize fully before writing so a failure leaves no partial output.
    let mut epub = Vec::new();
    book.write_epub(&mut epub)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &epub).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!(
                "Wrote {} chapters ({}) to {}",
                book.chapters.len(),
                echo::format_size(epub.len()),
                path.display().bright_white()
            ));
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&epub).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            echo::print_error(&echo::error_line(&err));
            ExitCode::FAILURE
        }
    }
}
