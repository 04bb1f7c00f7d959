//! `qitoolchain info` command

use anyhow::Result;

use crate::cli::InfoArgs;
use crate::GlobalOptions;
use qitoolchain::ops::toolchain_info::{to_json, ToolchainInfo};

pub fn execute(args: InfoArgs, global_opts: &GlobalOptions) -> Result<()> {
    let toolchain = global_opts.registry().open(&args.toolchain)?;

    if args.json {
        let info = ToolchainInfo::from_toolchain(&toolchain);
        println!("{}", to_json(&info)?);
    } else {
        println!("{}", toolchain);
        println!("  path: {}", toolchain.path().display());
        println!("  toolchain file: {}", toolchain.toolchain_file().display());
    }

    Ok(())
}
