//! Toolchain consistency checks.
//!
//! Adding a package touches three things in sequence: the package
//! directory, the `provide` list in the configuration file, and the
//! generated toolchain file. An interrupted `add` can leave them out of
//! step. The `doctor` command reports such drift; it never repairs it.
//!
//! ## Usage
//!
//! ```bash
//! qitoolchain doctor linux
//! ```
//!
//! ## Checks Performed
//!
//! - every provided package has a directory under the toolchain root
//! - every provided package has an entry in the toolchain file
//! - every package directory is provided (a crash after extraction)
//! - no toolchain file entry is repeated (optional, re-adding does this)

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use crate::builder::toolchain_file::ToolchainFileWriter;
use crate::core::error::Result;
use crate::core::toolchain::Toolchain;
use crate::util::fs::{to_posix_path, visible_subdirs};

/// Result of a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check
    pub name: String,

    /// Whether the check passed
    pub passed: bool,

    /// Human-readable status message
    pub message: String,

    /// Offending items, one per line in the report
    pub details: Vec<String>,

    /// Whether a failure makes the toolchain inconsistent
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result.
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            details: Vec::new(),
            required: true,
        }
    }

    /// Create a failing check result.
    pub fn fail(name: impl Into<String>, message: impl Into<String>) -> Self {
        CheckResult {
            name: name.into(),
            passed: false,
            message: message.into(),
            details: Vec::new(),
            required: true,
        }
    }

    /// Mark this check as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

/// Summary of all checks for one toolchain.
#[derive(Debug, Clone)]
pub struct DoctorReport {
    pub toolchain: String,
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    pub fn new(toolchain: impl Into<String>) -> Self {
        DoctorReport {
            toolchain: toolchain.into(),
            checks: Vec::new(),
        }
    }

    pub fn add(&mut self, check: CheckResult) {
        self.checks.push(check);
    }

    /// Check if all required checks passed.
    pub fn all_required_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.required).all(|c| c.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    pub fn required_failed_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .count()
    }
}

/// Check a loaded toolchain against its directory and toolchain file.
pub fn doctor(toolchain: &Toolchain) -> Result<DoctorReport> {
    let mut report = DoctorReport::new(toolchain.name());

    let provided: Vec<&str> = toolchain.packages().iter().map(|p| p.name.as_str()).collect();
    let on_disk = visible_subdirs(toolchain.path())?;
    let entries: Vec<String> = ToolchainFileWriter::new(toolchain.store())
        .entries(toolchain.toolchain_file())?
        .iter()
        .map(|p| to_posix_path(p))
        .collect();

    tracing::debug!(
        "checking {}: provided [{}], on disk [{}], {} toolchain file entries",
        toolchain.name(),
        provided.join(" "),
        on_disk.join(" "),
        entries.len()
    );

    report.add(check_directories(&provided, &on_disk));
    report.add(check_entries(toolchain, &provided, &entries));
    report.add(check_unrecorded(&provided, &on_disk));
    report.add(check_duplicates(&entries));

    Ok(report)
}

fn check_directories(provided: &[&str], on_disk: &[String]) -> CheckResult {
    let name = "Package directories";
    let missing: Vec<String> = provided
        .iter()
        .filter(|p| !on_disk.iter().any(|d| d.as_str() == **p))
        .map(|p| p.to_string())
        .collect();

    if missing.is_empty() {
        CheckResult::pass(name, format!("{} provided package(s) installed", provided.len()))
    } else {
        CheckResult::fail(name, "provided but not installed").with_details(missing)
    }
}

fn check_entries(toolchain: &Toolchain, provided: &[&str], entries: &[String]) -> CheckResult {
    let name = "Toolchain file";
    let entries: HashSet<&str> = entries.iter().map(String::as_str).collect();
    let missing: Vec<String> = provided
        .iter()
        .filter(|p| {
            let expected = to_posix_path(&toolchain.path().join(p));
            !entries.contains(expected.as_str())
        })
        .map(|p| p.to_string())
        .collect();

    if missing.is_empty() {
        CheckResult::pass(name, "every provided package is on the prefix path")
    } else {
        CheckResult::fail(name, "provided but missing from the toolchain file").with_details(missing)
    }
}

fn check_unrecorded(provided: &[&str], on_disk: &[String]) -> CheckResult {
    let name = "Unrecorded packages";
    let unrecorded: Vec<String> = on_disk
        .iter()
        .filter(|d| !provided.contains(&d.as_str()))
        .cloned()
        .collect();

    if unrecorded.is_empty() {
        CheckResult::pass(name, "every package directory is provided")
    } else {
        CheckResult::fail(name, "installed but not provided").with_details(unrecorded)
    }
}

fn check_duplicates(entries: &[String]) -> CheckResult {
    let name = "Duplicate entries";
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.as_str()).or_default() += 1;
    }
    let repeated: Vec<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(entry, n)| format!("{} ({} times)", entry, n))
        .collect();

    if repeated.is_empty() {
        CheckResult::pass(name, "no repeated prefix paths").optional()
    } else {
        CheckResult::fail(name, "prefix paths listed more than once")
            .with_details(repeated)
            .optional()
    }
}

/// Format a doctor report for display.
pub fn format_report(report: &DoctorReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Toolchain {}", report.toolchain);
    let _ = writeln!(output);
    let _ = writeln!(output, "Checks:");
    for check in &report.checks {
        let status = if check.passed { "[OK]" } else { "[!!]" };
        let required = if check.required { "" } else { " (optional)" };
        let _ = writeln!(output, "  {} {}{}", status, check.name, required);

        if verbose || !check.passed {
            let _ = writeln!(output, "      {}", check.message);
        }
        for detail in &check.details {
            let _ = writeln!(output, "        {}", detail);
        }
    }
    let _ = writeln!(output);

    let passed = report.passed_count();
    let failed = report.failed_count();
    let required_failed = report.required_failed_count();
    let _ = writeln!(output, "Summary: {} passed, {} failed", passed, failed);

    if required_failed > 0 {
        let _ = writeln!(
            output,
            "\nWarning: {} required check(s) failed. Re-add the affected packages to fix them.",
            required_failed
        );
    } else if failed > 0 {
        let _ = writeln!(
            output,
            "\nToolchain is consistent. {} optional check(s) failed.",
            failed
        );
    } else {
        let _ = writeln!(output, "\nToolchain is consistent.");
    }

    output
}
