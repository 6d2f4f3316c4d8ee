//! Pagearc unpacker
//!
//! Validates an archive and recreates its tree, or lists its entries

mod common;

use anyhow::{Context, Result};
use clap::Parser;
use pagearc::{load_archive, Archive};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pagearc-unpack", version)]
#[command(about = "Unpack or list a page-aligned archive")]
struct Args {
    /// Archive file to read
    archive: PathBuf,

    /// Destination directory (created if missing)
    #[arg(required_unless_present = "list")]
    dest: Option<PathBuf>,

    /// List entries instead of extracting
    #[arg(short, long)]
    list: bool,

    /// Print the listing as JSON
    #[arg(long, requires = "list")]
    json: bool,

    /// Log every directory and file as it is extracted
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: &Args) -> Result<()> {
    let blob = load_archive(&args.archive)?;
    let archive = Archive::parse(&blob)
        .with_context(|| format!("{} is not a valid archive", args.archive.display()))?;

    if let Ok(name) = archive.header().name() {
        // stdout carries the JSON document
        if !name.is_empty() && !args.json {
            info!("Archive name: {}", name);
        }
    }

    if args.list {
        if args.json {
            println!("{}", archive.list_json()?);
        } else {
            for entry in &archive.list()? {
                match entry.size {
                    Some(size) => println!("{:>12}  {}", size, entry.path),
                    None => println!("{:>12}  {}/", "-", entry.path),
                }
            }
        }
        return Ok(());
    }

    let dest = args
        .dest
        .as_ref()
        .context("a destination directory is required unless --list is given")?;
    archive
        .extract(dest)
        .with_context(|| format!("failed to extract into {}", dest.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    common::init_tracing(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("ERROR:{:#}", e);
            ExitCode::FAILURE
        }
    }
}
