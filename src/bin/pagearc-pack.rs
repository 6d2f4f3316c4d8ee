//! Pagearc packer
//!
//! Packs a directory tree into a page-aligned archive

mod common;

use anyhow::{Context, Result};
use clap::Parser;
use pagearc::{pack_directory, PackOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "pagearc-pack", version)]
#[command(about = "Pack a directory into a page-aligned archive")]
struct Args {
    /// Archive file to create
    output: PathBuf,

    /// Directory to pack
    source: PathBuf,

    /// Name stored in the archive header (max 47 bytes)
    #[arg(short, long)]
    name: Option<String>,

    /// Log block allocation and header details
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut options = PackOptions::new();
    if let Some(name) = &args.name {
        options = options.name(name.clone());
    }

    info!("Packing {} into {}", args.source.display(), args.output.display());
    let stats = pack_directory(&args.source, &args.output, &options)
        .with_context(|| format!("failed to pack {}", args.source.display()))?;

    info!(
        "Done: {} files, {} entries, {} bytes",
        stats.files, stats.entries, stats.archive_bytes
    );
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
