use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use signal_ocr::parser::validate::validate_fields;
use signal_ocr::{config, format, FieldSet, ParserConfig, SignalParser, SignalRecord};

#[derive(Parser)]
#[command(name = "signal_ocr", about = "Extract trading signals from OCR text")]
struct Cli {
    /// JSON file overriding labels, patterns and OCR corrections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one OCR text (file or stdin)
    Parse {
        /// Input file; reads stdin when omitted
        file: Option<PathBuf>,
        /// Print the channel message instead of JSON
        #[arg(short, long)]
        render: bool,
        /// With --render, append the confirmation prompt
        #[arg(long, requires = "render")]
        confirm: bool,
    },
    /// Parse every .txt file in a directory
    Batch {
        dir: PathBuf,
        /// Write one JSON line per parsed file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Check a JSON field set against the record validator
    Validate { file: PathBuf },
    /// Print the effective parser config as JSON
    Config,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load(path)?,
        None => ParserConfig::default(),
    };

    match cli.command {
        Commands::Parse {
            file,
            render,
            confirm,
        } => {
            let parser = SignalParser::new(cfg)?;
            let text = read_input(file.as_deref())?;
            let Some(record) = parser.parse_signal(&text) else {
                eprintln!("No signal found. Make sure the image shows Symbol, Signal Type, Entry, Target and Stop Loss.");
                std::process::exit(1);
            };
            if confirm {
                println!("{}", format::confirmation(&record));
            } else if render {
                println!("{}", format::render(&record));
            } else {
                println!("{}", serde_json::to_string_pretty(&record)?);
            }
        }
        Commands::Batch { dir, out } => {
            let parser = SignalParser::new(cfg)?;
            let files = list_text_files(&dir)?;
            if files.is_empty() {
                println!("No .txt files in {}", dir.display());
                return Ok(());
            }
            println!("Parsing {} files...", files.len());
            let results = parse_files(&parser, &files);
            let counts = BatchCounts::tally(&results);

            if let Some(out) = out {
                write_jsonl(&out, &results)?;
                info!(path = %out.display(), "Wrote parsed records");
            }
            counts.print();
        }
        Commands::Validate { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let fields: FieldSet = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse field set JSON: {}", file.display()))?;
            if validate_fields(&fields) {
                println!("valid");
            } else {
                match fields.first_missing() {
                    Some(field) => println!("invalid: missing {}", field),
                    None => println!("invalid: empty field or non-canonical direction"),
                }
                std::process::exit(1);
            }
        }
        Commands::Config => {
            // Build first so a config with a bad pattern is reported, not printed.
            let parser = SignalParser::new(cfg)?;
            println!("{}", config::to_json(parser.config())?);
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        eprintln!("Done in {:.1}s", elapsed.as_secs_f64());
    }
    Ok(())
}

struct BatchCounts {
    files: usize,
    parsed: usize,
    rejected: usize,
    unreadable: usize,
}

impl BatchCounts {
    fn tally(results: &[(PathBuf, anyhow::Result<Option<SignalRecord>>)]) -> Self {
        let mut counts = BatchCounts {
            files: results.len(),
            parsed: 0,
            rejected: 0,
            unreadable: 0,
        };
        for (_, r) in results {
            match r {
                Ok(Some(_)) => counts.parsed += 1,
                Ok(None) => counts.rejected += 1,
                Err(_) => counts.unreadable += 1,
            }
        }
        counts
    }

    fn print(&self) {
        println!(
            "{} files: {} parsed, {} rejected, {} unreadable.",
            self.files, self.parsed, self.rejected, self.unreadable,
        );
    }
}

fn parse_files(
    parser: &SignalParser,
    files: &[PathBuf],
) -> Vec<(PathBuf, anyhow::Result<Option<SignalRecord>>)> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(files.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let results = files
        .par_iter()
        .map(|path| {
            let result = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
                .map(|text| parser.parse_signal(&text));
            match &result {
                Ok(None) => warn!(file = %path.display(), "No signal found"),
                Err(e) => warn!(file = %path.display(), "{:#}", e),
                Ok(Some(_)) => {}
            }
            pb.inc(1);
            (path.clone(), result)
        })
        .collect();

    pb.finish_and_clear();
    results
}

fn write_jsonl(
    path: &Path,
    results: &[(PathBuf, anyhow::Result<Option<SignalRecord>>)],
) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for (src, result) in results {
        if let Ok(Some(record)) = result {
            let line = serde_json::json!({ "file": src.display().to_string(), "record": record });
            writeln!(w, "{}", line)?;
        }
    }
    w.flush()?;
    Ok(())
}

fn list_text_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Not a directory: {}", dir.display());
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();
    Ok(files)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
