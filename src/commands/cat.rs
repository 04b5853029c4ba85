//! # Cat Command Implementation
//!
//! This module implements the `cat` subcommand, which reads files through a
//! target's loader and writes them to stdout. It is the quickest way to see
//! what a restriction allows: a path outside the root under `root-only`
//! fails instead of being printed.

use std::io::{self, Write};

use anyhow::{Context as _, Result};
use clap::Args;

use crate::cli::Context;
use crate::commands::report;

/// Print files read through a target's loader
#[derive(Args, Debug)]
pub struct CatArgs {
    /// Directory, file or git repository URL to load from.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Files to print, relative to the target's root.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

fn write_files<W: Write>(args: &CatArgs, ctx: &Context, out: &mut W) -> Result<()> {
    let loader = ctx
        .resolver
        .resolve(ctx.restriction, &args.target)
        .map_err(report)?;

    for path in &args.paths {
        let bytes = loader.load(path).map_err(report)?;
        out.write_all(&bytes)
            .with_context(|| format!("Failed to write {}", path))?;
    }
    out.flush()?;

    loader.close().map_err(report)?;
    Ok(())
}

/// Execute the `cat` command.
pub fn execute(args: CatArgs, ctx: &Context) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_files(&args, ctx, &mut out)
}
