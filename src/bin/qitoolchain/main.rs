//! qitoolchain CLI - toolchains of prebuilt packages for CMake builds

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use qitoolchain::util::shell::Shell;
use qitoolchain::{PlatformPaths, ToolchainRegistry};

mod cli;
mod commands;

use cli::{Cli, Commands};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub verbose: bool,
    pub paths: PlatformPaths,
}

impl GlobalOptions {
    /// A registry over the resolved platform paths, backed by the filesystem.
    pub fn registry(&self) -> ToolchainRegistry {
        ToolchainRegistry::from_paths(self.paths.clone())
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("qitoolchain=debug")
    } else if cli.quiet {
        EnvFilter::new("qitoolchain=warn")
    } else {
        EnvFilter::new("qitoolchain=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let mut paths = PlatformPaths::resolve(cli.home.as_deref())?;
    if let Some(secs) = cli.lock_timeout {
        paths = paths.with_lock_timeout(Duration::from_secs(secs));
    }

    let global_opts = GlobalOptions {
        shell: Shell::from_flags(cli.quiet, cli.verbose, cli.color),
        verbose: cli.verbose,
        paths,
    };

    // Execute command
    match cli.command {
        Commands::Create(args) => commands::create::execute(args, &global_opts),
        Commands::Add(args) => commands::add::execute(args, &global_opts),
        Commands::Path(args) => commands::path::execute(args, &global_opts),
        Commands::Info(args) => commands::info::execute(args, &global_opts),
        Commands::List => commands::list::execute(&global_opts),
        Commands::Depends(args) => commands::depends::execute(args, &global_opts),
        Commands::Doctor(args) => commands::doctor::execute(args, &global_opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
