//! `qitoolchain create` command

use anyhow::Result;

use crate::cli::CreateArgs;
use crate::GlobalOptions;
use qitoolchain::util::shell::Status;

pub fn execute(args: CreateArgs, global_opts: &GlobalOptions) -> Result<()> {
    let registry = global_opts.registry();
    let root = registry.create(&args.name)?;

    global_opts.shell.status(
        Status::Created,
        format!("toolchain `{}` ({})", args.name, root.display()),
    );
    Ok(())
}
