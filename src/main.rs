use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::fs::{self, File};
use std::io::BufWriter;
use std::process::ExitCode;

use geologtag::{enrich_file, find_city_db, Error, FileOutcome, MaxMindResolver, UniqueIpRegistry};

/// Subdirectory of the log directory that receives enriched output.
const OUT_SUBDIR: &str = "out";

/// Summary of distinct resolved addresses, written after all files complete.
const SUMMARY_FILE: &str = "UniqueIps.csv";

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Directory containing the *.log files to enrich (defaults to the
    /// executable's directory)
    #[clap(short = 'd', long = "dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    dir: Option<Utf8PathBuf>,

    /// Header field whose value holds the client IP address
    #[clap(
        short = 'f',
        long = "field",
        value_name = "FIELD",
        default_value = "c-ip"
    )]
    field: String,

    /// Directory containing the GeoIP2/GeoLite2 city database (defaults to
    /// the working directory)
    #[clap(
        short = 'I',
        long = "include",
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
        env = "GEOIP_MMDB_DIR"
    )]
    include: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_main() -> Result<()> {
    let args = Args::parse();

    let log_dir = match args.dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    let db_dir = args.include.unwrap_or_else(|| Utf8PathBuf::from("."));

    // Both preconditions are fatal: checked before any file is touched.
    let db_path = find_city_db(&db_dir)?;
    let files = discover_log_files(&log_dir)?;

    let resolver = MaxMindResolver::open(&db_path)?;
    log::info!("using city database {db_path}");

    let out_dir = log_dir.join(OUT_SUBDIR);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create output directory {out_dir}"))?;

    let mut registry = UniqueIpRegistry::new();
    for file in &files {
        match enrich_file(file, &out_dir, &args.field, &resolver, &mut registry)? {
            FileOutcome::Enriched { written, dropped } => {
                log::info!("{file}: {written} lines enriched, {dropped} dropped");
            }
            FileOutcome::Skipped(_) => {}
        }
    }

    if !registry.is_empty() {
        let summary_path = out_dir.join(SUMMARY_FILE);
        let summary = File::create(&summary_path)
            .with_context(|| format!("failed to create summary file {summary_path}"))?;
        registry.write_summary(BufWriter::new(summary))?;
        log::info!(
            "wrote {} unique addresses to {summary_path}",
            registry.len()
        );
    }

    Ok(())
}

/// The log directory defaults to wherever the executable lives.
fn default_log_dir() -> Result<Utf8PathBuf> {
    let exe = std::env::current_exe().context("failed to locate the current executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?
        .to_path_buf();
    Utf8PathBuf::from_path_buf(dir).map_err(|p| anyhow::anyhow!("non-UTF-8 path: {}", p.display()))
}

/// Enumerate `*.log` files in `dir`, sorted by name for deterministic runs.
fn discover_log_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut files = Vec::new();
    for entry in dir
        .read_dir_utf8()
        .with_context(|| format!("failed to read log directory {dir}"))?
    {
        let path = entry?.into_path();
        if path.extension() == Some("log") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    if files.is_empty() {
        return Err(Error::NoLogFiles {
            path: dir.to_owned(),
        }
        .into());
    }
    Ok(files)
}
