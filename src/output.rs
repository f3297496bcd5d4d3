use crate::metadata::FormatTable;
use crate::progress::EraseEvent;
use crate::report::{Action, ErasureReport};
use crate::utils::{display_path, format_size, plural};
use colored::Colorize;
use std::path::Path;

/// Print one human-readable progress line for `event`.
pub fn print_event(event: &EraseEvent<'_>) {
    match event {
        EraseEvent::FileStarted { path, len, passes } => {
            println!(
                "{} Securely deleting file: {} ({}, {})",
                "[*]".cyan().bold(),
                display_path(path),
                format_size(*len).yellow(),
                plural(u64::from(*passes), "pass", "passes")
            );
        }
        EraseEvent::Pass { pass, passes, .. } => {
            println!("    - Pass {pass}/{passes}");
        }
        EraseEvent::FileErased { path } => {
            println!("{} File securely deleted: {}", "[+]".green().bold(), display_path(path).dimmed());
        }
        EraseEvent::Unlinked { path } => {
            println!("{} Link removed: {}", "[+]".green().bold(), display_path(path).dimmed());
        }
        EraseEvent::DirStarted { path } => {
            println!("{} Securely deleting directory: {}", "[*]".cyan().bold(), display_path(path));
        }
        EraseEvent::DirRemoved { path } => {
            println!("{} Directory removed: {}", "[+]".green().bold(), display_path(path).dimmed());
        }
        EraseEvent::Failed { error, .. } => {
            println!("{} {}", "[!]".red().bold(), error.to_string().red());
        }
    }
}

pub fn print_summary(report: &ErasureReport) {
    println!();
    println!("{}", "=== Summary ===".bold().white());
    println!(
        "  {:<24} {}",
        "Files erased:",
        succeeded(report, Action::EraseFile).to_string().green()
    );
    let unlinked = succeeded(report, Action::Unlink);
    if unlinked > 0 {
        println!("  {:<24} {}", "Links removed:", unlinked.to_string().green());
    }
    let dirs = succeeded(report, Action::RemoveDir);
    if dirs > 0 {
        println!("  {:<24} {}", "Directories removed:", dirs.to_string().green());
    }
    println!("  {:<24} {}", "Data overwritten:", format_size(report.bytes_erased()).green());

    let failures = report.failure_count();
    if failures > 0 {
        println!("  {:<24} {}", "Failures:", failures.to_string().red().bold());
        for outcome in report.failures() {
            let reason = outcome
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            println!("    {} {}", "Failed".red().bold(), reason.red());
        }
    }

    if report.cancelled() {
        println!(
            "{}",
            "Cancelled: remaining entries were left untouched.".yellow().bold()
        );
    } else if failures == 0 {
        println!("{}", "Done.".green().bold());
    }
}

fn succeeded(report: &ErasureReport, action: Action) -> usize {
    report
        .outcomes()
        .iter()
        .filter(|o| o.action == action && o.succeeded())
        .count()
}

pub fn print_json(report: &ErasureReport) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

pub fn print_formats(table: &FormatTable) {
    println!("{}", "Supported file formats:".bold());
    for (category, extensions) in table.categories() {
        println!("  {:<8} {}", format!("{}:", category.label()), extensions.join(", "));
    }
}

pub fn print_supported(table: &FormatTable) {
    println!(
        "{} {}",
        "Supported formats are:".cyan().bold(),
        table.supported_extensions().join(", ")
    );
}

pub fn print_stripped(output: &Path) {
    println!("{} Metadata removed: {}", "[+]".green().bold(), display_path(output));
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg.red());
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), msg);
}
