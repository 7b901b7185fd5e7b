use std::io::Write;
use std::path::Path;

use owo_colors::OwoColorize;
use papersense_parsing::{Journal, ParsedDocument, ParsingError};

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print the catalogue of supported journals.
pub fn print_journals(w: &mut dyn Write, color: ColorMode) -> std::io::Result<()> {
    for journal in Journal::ALL {
        if color.enabled() {
            writeln!(w, "  {:<10} {}", journal.id().bold(), journal.display_name())?;
        } else {
            writeln!(w, "  {:<10} {}", journal.id(), journal.display_name())?;
        }
    }
    Ok(())
}

/// Print the outcome of one successfully parsed document.
pub fn print_document(
    w: &mut dyn Write,
    name: &str,
    doc: &ParsedDocument,
    written: &[impl AsRef<Path>],
    color: ColorMode,
) -> std::io::Result<()> {
    if doc.stats.fragment_stream_empty {
        let msg = format!("{name}: no text found (scanned or empty PDF?)");
        if color.enabled() {
            writeln!(w, "{}", msg.yellow())?;
        } else {
            writeln!(w, "{}", msg)?;
        }
        return Ok(());
    }

    if color.enabled() {
        writeln!(w, "{} {}", "✓".green().bold(), name.bold())?;
    } else {
        writeln!(w, "OK {}", name)?;
    }
    writeln!(
        w,
        "    {} sections, {} references ({} cited)",
        doc.stats.total_sections,
        doc.stats.total_entries,
        doc.references.len()
    )?;

    let stats = &doc.stats;
    let detail = format!(
        "    {} citations matched against the bibliography, {} unmatched, {} skipped",
        stats.mentions.saturating_sub(stats.unmatched_mentions),
        stats.unmatched_mentions,
        stats.citation_skips
    );
    if color.enabled() {
        writeln!(w, "{}", detail.dimmed())?;
    } else {
        writeln!(w, "{}", detail)?;
    }

    for path in written {
        writeln!(w, "    -> {}", path.as_ref().display())?;
    }
    Ok(())
}

/// Print a per-document failure, with a hint when the selected journal is
/// the likely cause.
pub fn print_failure(
    w: &mut dyn Write,
    name: &str,
    error: &ParsingError,
    journal: Journal,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}: {}", "✗".red().bold(), name.bold(), error.red())?;
    } else {
        writeln!(w, "FAILED {}: {}", name, error)?;
    }
    if error.is_profile_mismatch() {
        let hint = format!(
            "    This file may not match the selected journal ({}). Check --journal.",
            journal.display_name()
        );
        if color.enabled() {
            writeln!(w, "{}", hint.yellow())?;
        } else {
            writeln!(w, "{}", hint)?;
        }
    }
    Ok(())
}

/// Print a per-document failure that happened outside parsing, such as an
/// export error or a crashed worker.
pub fn print_error(
    w: &mut dyn Write,
    name: &str,
    error: &dyn std::fmt::Display,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}: {}", "✗".red().bold(), name.bold(), error.to_string().red())?;
    } else {
        writeln!(w, "FAILED {}: {}", name, error)?;
    }
    Ok(())
}

/// Print the batch totals.
pub fn print_summary(
    w: &mut dyn Write,
    parsed: usize,
    failed: usize,
    archive: Option<&Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    let line = format!("{} parsed, {} failed", parsed, failed);
    if color.enabled() {
        if failed > 0 {
            writeln!(w, "{}", line.yellow().bold())?;
        } else {
            writeln!(w, "{}", line.green().bold())?;
        }
    } else {
        writeln!(w, "{}", line)?;
    }
    if let Some(path) = archive {
        writeln!(w, "Results bundled in {}", path.display())?;
    }
    Ok(())
}
