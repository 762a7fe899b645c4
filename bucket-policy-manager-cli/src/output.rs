//! Rendering of listings and per-bucket results.

use bucket_policy_manager_core::{
    BackupStore, BucketStatus, OperationReport, PolicyManagerResult, TemplateCatalog,
};
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Exit code for a run with a failed bucket or nothing to list.
const EXIT_FAILURE: i32 = 1;

pub(crate) fn print_templates(catalog: &TemplateCatalog, templates: &[String]) -> i32 {
    if templates.is_empty() {
        eprintln!(
            "\nNo policy templates found in {}",
            catalog.dir().display()
        );
        eprintln!("Please add policy templates as JSON files in this directory.");
        return EXIT_FAILURE;
    }

    println!("\nAvailable policy templates:");
    for (i, name) in templates.iter().enumerate() {
        println!("{}. {}", i + 1, name);
    }
    0
}

pub(crate) fn print_backups(store: &BackupStore, backups: &[PathBuf]) {
    if backups.is_empty() {
        println!("\nNo policy backups found in {}", store.dir().display());
        return;
    }

    println!("\nAvailable policy backups:");
    for (i, backup) in backups.iter().enumerate() {
        let name = backup
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| backup.display().to_string());
        println!("{}. {}", i + 1, name);
    }
}

/// Print the outcome of a restore. A failed restore is reported, not escalated,
/// so the run still exits 0.
pub(crate) fn print_restore(bucket: &str, result: &PolicyManagerResult<()>) -> io::Result<()> {
    write_restore(bucket, result, &mut io::stdout().lock())
}

fn write_restore<W: Write>(
    bucket: &str,
    result: &PolicyManagerResult<()>,
    out: &mut W,
) -> io::Result<()> {
    writeln!(out, "\nRestore result for {bucket}:")?;
    match result {
        Ok(()) => writeln!(out, "Status: {}", "Success".green()),
        Err(e) => {
            writeln!(out, "Status: {}", "Error".red())?;
            writeln!(out, "Error message: {e}")
        }
    }
}

/// Print the per-bucket summary and return the exit code for the run.
pub(crate) fn print_report(report: &OperationReport) -> io::Result<i32> {
    write_report(report, &mut io::stdout().lock())
}

fn write_report<W: Write>(report: &OperationReport, out: &mut W) -> io::Result<i32> {
    writeln!(out, "\nOperation Results:")?;
    for outcome in &report.outcomes {
        writeln!(out, "\nBucket: {}", outcome.bucket)?;
        match &outcome.status {
            BucketStatus::Success { backup_file } => {
                writeln!(out, "Status: {}", "Success".green())?;
                if let Some(path) = backup_file {
                    writeln!(out, "Backup saved to: {}", path.display())?;
                }
            }
            BucketStatus::Skipped(reason) => {
                writeln!(out, "Status: {} - {}", "Skipped".yellow(), reason)?;
            }
            BucketStatus::Error(message) => {
                writeln!(out, "Status: {} - {}", "Error".red(), message)?;
            }
        }
    }

    Ok(if report.has_errors() { EXIT_FAILURE } else { 0 })
}
