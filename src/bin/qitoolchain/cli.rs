//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use qitoolchain::util::shell::ColorChoice;

/// qitoolchain - manage toolchains of prebuilt packages for CMake builds
#[derive(Parser)]
#[command(name = "qitoolchain")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Use this directory as the home for toolchains, caches and configuration
    #[arg(long, global = true, env = "QITOOLCHAIN_HOME")]
    pub home: Option<PathBuf>,

    /// Seconds to wait for a locked configuration or toolchain
    #[arg(long, global = true, env = "QITOOLCHAIN_LOCK_TIMEOUT", value_name = "SECS")]
    pub lock_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new, empty toolchain
    Create(CreateArgs),

    /// Install a package archive into a toolchain
    Add(AddArgs),

    /// Print the installed path of a package
    Path(PathArgs),

    /// Describe a toolchain and its packages
    Info(InfoArgs),

    /// List toolchains
    List,

    /// Record the dependencies of a package
    Depends(DependsArgs),

    /// Check a toolchain for inconsistencies
    Doctor(DoctorArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Toolchain name
    pub name: String,
}

#[derive(Args)]
pub struct AddArgs {
    /// Toolchain name
    pub toolchain: String,

    /// Package name
    pub package: String,

    /// Package archive (.tar.gz, .tar or .zip)
    pub archive: PathBuf,

    /// Dependencies of the package
    #[arg(long = "depends", value_name = "PACKAGE", num_args = 1..)]
    pub depends: Vec<String>,
}

#[derive(Args)]
pub struct PathArgs {
    /// Toolchain name
    pub toolchain: String,

    /// Package name
    pub package: String,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Toolchain name
    pub toolchain: String,

    /// Print machine-readable JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DependsArgs {
    /// Toolchain name
    pub toolchain: String,

    /// Package name
    pub package: String,

    /// Dependencies, replacing any recorded before (none clears them)
    pub depends: Vec<String>,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Toolchain name
    pub toolchain: String,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
