//! `qitoolchain add` command

use anyhow::{Context, Result};

use crate::cli::AddArgs;
use crate::GlobalOptions;
use qitoolchain::ops::toolchain_add::{add_package, AddOptions};
use qitoolchain::util::shell::Status;

pub fn execute(args: AddArgs, global_opts: &GlobalOptions) -> Result<()> {
    let shell = &global_opts.shell;
    let registry = global_opts.registry();

    let opts = AddOptions {
        toolchain: args.toolchain.clone(),
        package: args.package.clone(),
        archive: args.archive,
        depends: args.depends,
    };

    let result = add_package(&registry, &opts).with_context(|| {
        format!(
            "failed to add `{}` to toolchain `{}`",
            opts.package, opts.toolchain
        )
    })?;

    if result.replaced {
        shell.status(
            Status::Updated,
            format!("{} in {}", opts.package, opts.toolchain),
        );
    } else {
        shell.status(
            Status::Added,
            format!("{} to {}", opts.package, opts.toolchain),
        );
    }
    shell.status(Status::Installed, result.path.display());
    if !opts.depends.is_empty() {
        shell.note(format!("{} depends on {}", opts.package, opts.depends.join(" ")));
    }
    if global_opts.verbose {
        shell.note(format!("toolchain file: {}", result.toolchain_file.display()));
    }

    Ok(())
}
