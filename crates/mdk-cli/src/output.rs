//! Human-readable command output

use std::path::Path;

use colored::Colorize;
use mdk_core::{Artifact, MinifierLevel};

/// What one project's pack produced
#[derive(Debug)]
pub struct PackSummary {
    pub project: String,
    pub level: MinifierLevel,
    pub characters: usize,
    pub artifacts: Vec<Artifact>,
    pub dry_run: bool,
}

pub fn print_pack_summary(summary: &PackSummary) {
    let prefix = if summary.dry_run {
        "[dry run]".yellow().bold()
    } else {
        "Packed".green().bold()
    };
    println!(
        "{} {} ({}, {} characters)",
        prefix,
        summary.project.bold(),
        summary.level,
        summary.characters
    );
    for artifact in &summary.artifacts {
        println!(
            "  {} {} ({} bytes)",
            "->".dimmed(),
            artifact.path.display(),
            artifact.bytes
        );
    }
}

pub fn print_pack_failure(root: &Path, error: &anyhow::Error) {
    eprintln!(
        "{} {}: {:#}",
        "error:".red().bold(),
        root.display(),
        error
    );
}
