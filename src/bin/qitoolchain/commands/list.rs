//! `qitoolchain list` command

use anyhow::Result;

use crate::GlobalOptions;

pub fn execute(global_opts: &GlobalOptions) -> Result<()> {
    let names = global_opts.registry().list()?;

    if names.is_empty() {
        global_opts.shell.note("no toolchains found");
    }
    for name in names {
        println!("{}", name);
    }

    Ok(())
}
