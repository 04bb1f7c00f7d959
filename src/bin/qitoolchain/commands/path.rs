//! `qitoolchain path` command

use anyhow::Result;

use crate::cli::PathArgs;
use crate::GlobalOptions;

pub fn execute(args: PathArgs, global_opts: &GlobalOptions) -> Result<()> {
    let toolchain = global_opts.registry().open(&args.toolchain)?;
    let path = toolchain.get(&args.package)?;
    println!("{}", path.display());
    Ok(())
}
