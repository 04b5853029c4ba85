//! CLI argument parsing and command dispatch

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::debug;

use target_loader::filesystem::DiskFS;
use target_loader::git::GitExecCloner;
use target_loader::loader::Resolver;
use target_loader::output::OutputConfig;
use target_loader::restriction::Restriction;

use crate::commands;

/// Target Loader - Resolve directories, files and git repositories into root-restricted loaders
#[derive(Parser, Debug)]
#[command(name = "target-loader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Which files local targets may read (root-only, none).
    ///
    /// Remote targets are always root-only.
    #[arg(
        long,
        global = true,
        value_enum,
        value_name = "POLICY",
        env = "TARGET_LOADER_LOAD_RESTRICTOR",
        default_value_t = Restriction::RootOnly
    )]
    load_restrictor: Restriction,

    /// Directory to create temporary clones in.
    ///
    /// Defaults to the system temporary directory.
    #[arg(long, global = true, value_name = "DIR", env = "TARGET_LOADER_TMPDIR")]
    temp_dir: Option<PathBuf>,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace)
    ///
    /// RUST_LOG takes precedence when set.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a target and print its resolved root
    Resolve(commands::resolve::ResolveArgs),

    /// Print files read through a target's loader
    Cat(commands::cat::CatArgs),

    /// Display the tree of bases reachable from a target
    Tree(commands::tree::TreeArgs),
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub resolver: Resolver,
    pub restriction: Restriction,
    pub output: OutputConfig,
}

impl Cli {
    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(&self.log_level);
        // A logger may already be installed when running under tests.
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .try_init();
    }

    fn context(&self) -> Context {
        let mut cloner = GitExecCloner::new();
        if let Some(temp_dir) = &self.temp_dir {
            cloner = cloner.with_temp_root(temp_dir.clone());
        }
        Context {
            resolver: Resolver::with_cloner(Arc::new(DiskFS), Arc::new(cloner)),
            restriction: self.load_restrictor,
            output: OutputConfig::from_env_and_flag(&self.color),
        }
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();
        let ctx = self.context();
        debug!("load restrictor: {}", ctx.restriction);

        match self.command {
            Commands::Resolve(args) => commands::resolve::execute(args, &ctx),
            Commands::Cat(args) => commands::cat::execute(args, &ctx),
            Commands::Tree(args) => commands::tree::execute(args, &ctx),
        }
    }
}
