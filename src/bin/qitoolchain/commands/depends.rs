//! `qitoolchain depends` command

use anyhow::Result;

use crate::cli::DependsArgs;
use crate::GlobalOptions;
use qitoolchain::util::shell::Status;

pub fn execute(args: DependsArgs, global_opts: &GlobalOptions) -> Result<()> {
    let toolchain = global_opts.registry().open(&args.toolchain)?;

    if toolchain.package(&args.package).is_none() {
        global_opts.shell.warn(format!(
            "`{}` is not provided by toolchain `{}`",
            args.package, args.toolchain
        ));
    }
    toolchain.set_depends(&args.package, &args.depends)?;

    global_opts.shell.status(
        Status::Updated,
        format!("{} depends on: {}", args.package, args.depends.join(" ")),
    );
    Ok(())
}
