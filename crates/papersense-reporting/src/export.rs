use std::io::Write;
use std::path::{Path, PathBuf};

use papersense_core::ParsedDocument;

use crate::ExportFormat;

/// Make a cell safe for spreadsheet import: line breaks become spaces and
/// double quotes become single quotes.
pub fn sanitize_cell(s: &str) -> String {
    s.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('"', "'")
}

fn csv_escape(s: &str) -> String {
    if s.contains('"') || s.contains(',') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_cell(s: &str) -> String {
    csv_escape(&sanitize_cell(s))
}

/// The section table: one row per section, in document order.
pub fn sections_csv(doc: &ParsedDocument) -> String {
    let mut out = String::from("section,text\n");
    for row in &doc.sections {
        out.push_str(&csv_cell(&row.heading));
        out.push(',');
        out.push_str(&csv_cell(&row.text));
        out.push('\n');
    }
    out
}

/// The reference index: one row per cited entry, citing sections joined
/// with commas.
pub fn references_csv(doc: &ParsedDocument) -> String {
    let mut out = String::from("reference,section\n");
    for row in &doc.references {
        out.push_str(&csv_cell(&row.reference));
        out.push(',');
        out.push_str(&csv_cell(&row.citing_sections()));
        out.push('\n');
    }
    out
}

fn write_file(path: &Path, content: &str) -> Result<(), String> {
    let mut file =
        std::fs::File::create(path).map_err(|e| format!("Failed to create file: {}", e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| format!("Failed to write: {}", e))?;
    Ok(())
}

/// Write the results for one document into `dir`, naming files after
/// `stem`. Returns the paths written.
///
/// CSV writes `<stem>_sections.csv` and `<stem>_references.csv`; JSON
/// writes `<stem>.json`.
pub fn export_document(
    doc: &ParsedDocument,
    stem: &str,
    dir: &Path,
    format: ExportFormat,
) -> Result<Vec<PathBuf>, String> {
    let written = match format {
        ExportFormat::Csv => {
            let sections = dir.join(format!("{stem}_sections.csv"));
            let references = dir.join(format!("{stem}_references.csv"));
            write_file(&sections, &sections_csv(doc))?;
            write_file(&references, &references_csv(doc))?;
            vec![sections, references]
        }
        ExportFormat::Json => {
            let path = dir.join(format!("{stem}.json"));
            let json = serde_json::to_string_pretty(doc)
                .map_err(|e| format!("Failed to serialize results: {}", e))?;
            write_file(&path, &json)?;
            vec![path]
        }
    };
    tracing::debug!(stem, files = written.len(), %format, "exported document");
    Ok(written)
}
