//! # Resolve Command Implementation
//!
//! This module implements the `resolve` subcommand, which classifies a target
//! and prints where its loader is rooted.
//!
//! Remote targets are cloned to find their root; the clone is removed again
//! before the command exits, so the printed path is informational only.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use target_loader::loader::{Loader, RootKind};
use target_loader::output::{kind_label, restriction_label};
use target_loader::restriction::Restriction;

use crate::cli::Context;
use crate::commands::report;

/// Classify a target and print its resolved root
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Directory, file or git repository URL to resolve.
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Remote<'a> {
    location: &'a str,
    #[serde(rename = "ref")]
    revision: &'a str,
    subpath: &'a Path,
}

#[derive(Debug, Serialize)]
struct Resolution<'a> {
    target: &'a str,
    kind: RootKind,
    root: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
    restriction: Restriction,
    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<Remote<'a>>,
}

impl<'a> Resolution<'a> {
    fn new(loader: &'a Loader) -> Self {
        Self {
            target: loader.target(),
            kind: loader.kind(),
            root: loader.root(),
            file_name: loader.file_name(),
            restriction: loader.restriction(),
            remote: loader.repo_spec().map(|spec| Remote {
                location: spec.location(),
                revision: spec.revision_or_head(),
                subpath: spec.subpath(),
            }),
        }
    }
}

fn render_text(ctx: &Context, resolution: &Resolution<'_>) -> String {
    let mut out = format!(
        "{} {}\n  restriction: {}\n",
        kind_label(&ctx.output, resolution.kind),
        resolution.root.display(),
        restriction_label(&ctx.output, resolution.restriction)
    );
    if let Some(file_name) = resolution.file_name {
        out.push_str(&format!("  file: {}\n", file_name));
    }
    if let Some(remote) = &resolution.remote {
        out.push_str(&format!(
            "  repository: {} @ {}\n",
            remote.location, remote.revision
        ));
        if !remote.subpath.as_os_str().is_empty() {
            out.push_str(&format!("  subpath: {}\n", remote.subpath.display()));
        }
    }
    out
}

fn render(args: &ResolveArgs, ctx: &Context) -> Result<String> {
    let loader = ctx
        .resolver
        .resolve(ctx.restriction, &args.target)
        .map_err(report)?;

    let rendered = {
        let resolution = Resolution::new(&loader);
        if args.json {
            format!("{}\n", serde_json::to_string_pretty(&resolution)?)
        } else {
            render_text(ctx, &resolution)
        }
    };

    loader.close().map_err(report)?;
    Ok(rendered)
}

/// Execute the `resolve` command.
pub fn execute(args: ResolveArgs, ctx: &Context) -> Result<()> {
    print!("{}", render(&args, ctx)?);
    Ok(())
}
