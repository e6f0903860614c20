use chrono::{DateTime, TimeZone, Utc};
use clap::Parser;
use log::{error, info, LevelFilter};
use quill::build::build_site;
use quill::config::Config;
use simple_logger::SimpleLogger;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

/// Builds the site in the current directory: `articles/` and `notes/` are
/// rendered through `templates/` into `public/`.
#[derive(Parser)]
#[command(name = "quill", version)]
struct Cli {
    /// The site root
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Log every skipped file and written feed
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("initializing logger: {}", e);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let mut message = e.to_string();
            let mut source = e.source();
            while let Some(cause) = source {
                message.push_str(&format!("\n  caused by: {}", cause));
                source = cause.source();
            }
            error!("build failed: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::from_directory(&cli.root, build_time())?;
    let summary = build_site(&config)?;
    info!(
        "build complete: {} articles, {} notes -> {}",
        summary.articles,
        summary.notes,
        config.output_directory.display()
    );
    Ok(())
}

// Honors SOURCE_DATE_EPOCH so feeds can be rebuilt byte-for-byte.
fn build_time() -> DateTime<Utc> {
    std::env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now)
}
