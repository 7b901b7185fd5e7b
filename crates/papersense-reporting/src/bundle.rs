use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;

/// Archive name used when the caller does not choose one.
pub const DEFAULT_ARCHIVE_NAME: &str = "paper-sense-results.zip";

/// Bundle `files` into a zip archive at `dest`. Entries are stored flat,
/// under their file names.
pub fn write_zip(files: &[PathBuf], dest: &Path) -> Result<(), String> {
    let file = File::create(dest).map_err(|e| format!("Failed to create archive: {}", e))?;
    let mut zip = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("Not a file: {}", path.display()))?;
        let content =
            std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        zip.start_file(name, options)
            .map_err(|e| format!("Failed to add zip entry: {}", e))?;
        zip.write_all(&content)
            .map_err(|e| format!("Failed to write zip entry: {}", e))?;
    }

    zip.finish()
        .map_err(|e| format!("Failed to finish archive: {}", e))?;
    tracing::debug!(archive = %dest.display(), entries = files.len(), "wrote archive");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_contains_flat_entries() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("paper_sections.csv");
        let b = dir.path().join("paper_references.csv");
        std::fs::write(&a, "section,text\n").unwrap();
        std::fs::write(&b, "reference,section\n").unwrap();

        let dest = dir.path().join(DEFAULT_ARCHIVE_NAME);
        write_zip(&[a, b], &dest).unwrap();

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(names, vec!["paper_references.csv", "paper_sections.csv"]);

        let mut entry = archive.by_name("paper_sections.csv").unwrap();
        let mut content = String::new();
        std::io::Read::read_to_string(&mut entry, &mut content).unwrap();
        assert_eq!(content, "section,text\n");
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.zip");
        let err = write_zip(&[dir.path().join("absent.csv")], &dest).unwrap_err();
        assert!(err.contains("absent.csv"));
    }
}
