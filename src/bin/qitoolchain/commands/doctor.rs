//! `qitoolchain doctor` command

use anyhow::Result;

use crate::cli::DoctorArgs;
use crate::GlobalOptions;
use qitoolchain::ops::doctor::{doctor, format_report};

pub fn execute(args: DoctorArgs, global_opts: &GlobalOptions) -> Result<()> {
    let toolchain = global_opts.registry().open(&args.toolchain)?;
    let report = doctor(&toolchain)?;

    // Print the formatted report
    print!("{}", format_report(&report, global_opts.verbose));

    // Exit with error code if required checks failed
    if !report.all_required_passed() {
        std::process::exit(1);
    }

    Ok(())
}
