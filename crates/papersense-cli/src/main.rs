use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use papersense_core::config_file::{self, ConfigFile, DefaultsConfig, MatchingConfig};
use papersense_parsing::{
    DocumentParser, Journal, ProfileOverrides, WholeWordMatch, registry,
};
use papersense_pdf_mupdf::MupdfBackend;
use papersense_reporting::{DEFAULT_ARCHIVE_NAME, ExportFormat, export_document, write_zip};

mod output;

use output::ColorMode;

/// Paper Sense - Extract sections and citation locations from journal PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse one or more PDFs set in the same journal's template
    Parse {
        /// PDF files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Journal profile (see `papersense journals`)
        #[arg(short, long)]
        journal: Option<Journal>,

        /// Directory the result files are written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Output format: csv or json
        #[arg(short, long)]
        format: Option<ExportFormat>,

        /// Also bundle every result file into one zip archive
        #[arg(long)]
        zip: bool,

        /// Archive file name used with --zip
        #[arg(long, default_value = DEFAULT_ARCHIVE_NAME)]
        zip_name: String,

        /// Require cited surnames to match whole words of a reference
        #[arg(long)]
        strict_surnames: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// List the supported journals
    Journals {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show the effective configuration, or store new defaults
    Config {
        /// Default journal profile
        #[arg(long)]
        journal: Option<Journal>,

        /// Default output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Default output format
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Default for whole-word surname matching
        #[arg(long)]
        strict_surnames: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = config_file::load_config();

    match cli.command {
        Command::Journals { no_color } => {
            let mut stdout = std::io::stdout();
            output::print_journals(&mut stdout, ColorMode(!no_color))?;
            Ok(())
        }
        Command::Config {
            journal,
            output_dir,
            format,
            strict_surnames,
        } => update_config(config, journal, output_dir, format, strict_surnames),
        Command::Parse {
            files,
            journal,
            output_dir,
            format,
            zip,
            zip_name,
            strict_surnames,
            no_color,
        } => {
            let settings = resolve_settings(
                &config,
                CliOverrides {
                    journal,
                    output_dir,
                    format,
                    strict_surnames,
                    zip,
                },
                EnvOverrides::from_env(),
            )?;
            parse(files, &config, settings, zip_name, ColorMode(!no_color)).await
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Values given on the command line.
#[derive(Debug, Default)]
struct CliOverrides {
    journal: Option<Journal>,
    output_dir: Option<PathBuf>,
    format: Option<ExportFormat>,
    strict_surnames: bool,
    zip: bool,
}

/// Values read from the environment (including `.env`).
#[derive(Debug, Default)]
struct EnvOverrides {
    journal: Option<String>,
    output_dir: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            journal: std::env::var("PAPERSENSE_JOURNAL").ok(),
            output_dir: std::env::var("PAPERSENSE_OUTPUT_DIR").ok(),
        }
    }
}

/// Fully resolved settings for a `parse` run.
#[derive(Debug, PartialEq)]
struct Settings {
    journal: Journal,
    output_dir: PathBuf,
    format: ExportFormat,
    strict_surnames: bool,
    zip: bool,
}

/// Resolve settings: CLI flags > env vars > config file > defaults.
fn resolve_settings(
    config: &ConfigFile,
    cli: CliOverrides,
    env: EnvOverrides,
) -> anyhow::Result<Settings> {
    let defaults = config.defaults.clone().unwrap_or_default();

    let journal = match cli.journal {
        Some(j) => j,
        None => {
            let name = env.journal.or(defaults.journal).context(
                "no journal selected: pass --journal, set PAPERSENSE_JOURNAL, or set defaults.journal in the config file",
            )?;
            name.parse::<Journal>()?
        }
    };

    let output_dir = cli
        .output_dir
        .or_else(|| env.output_dir.map(PathBuf::from))
        .or_else(|| defaults.output_dir.map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));

    let format = match cli.format {
        Some(f) => f,
        None => match defaults.format {
            Some(f) => f.parse::<ExportFormat>().map_err(anyhow::Error::msg)?,
            None => ExportFormat::default(),
        },
    };

    let strict_surnames = cli.strict_surnames
        || config
            .matching
            .as_ref()
            .and_then(|m| m.strict_surnames)
            .unwrap_or(false);

    Ok(Settings {
        journal,
        output_dir,
        format,
        strict_surnames,
        zip: cli.zip || defaults.zip.unwrap_or(false),
    })
}

fn build_parser(config: &ConfigFile, settings: &Settings) -> DocumentParser {
    let mut profile = registry::profile(settings.journal);
    let tunables = config
        .journals
        .as_ref()
        .and_then(|j| j.get(settings.journal.id()));
    if let Some(tunables) = tunables {
        let overrides = ProfileOverrides::from(tunables);
        if !overrides.is_empty() {
            tracing::debug!(journal = %settings.journal, ?overrides, "applying config tunables");
            profile.apply(&overrides);
        }
    }

    let parser = DocumentParser::new(profile);
    if settings.strict_surnames {
        parser.with_surname_match(Box::new(WholeWordMatch))
    } else {
        parser
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Output stems for a batch, in input order. A stem already taken gets the
/// next free `-N` suffix so no two documents write to the same files.
fn unique_stems(paths: &[PathBuf]) -> Vec<String> {
    let mut taken = HashSet::new();
    paths
        .iter()
        .map(|path| {
            let base = file_stem(path);
            let mut stem = base.clone();
            let mut n = 1;
            // Case-folded so case-insensitive filesystems don't collide either.
            while !taken.insert(stem.to_lowercase()) {
                n += 1;
                stem = format!("{base}-{n}");
            }
            stem
        })
        .collect()
}

async fn parse(
    files: Vec<PathBuf>,
    config: &ConfigFile,
    settings: Settings,
    zip_name: String,
    color: ColorMode,
) -> anyhow::Result<()> {
    std::fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let parser = Arc::new(build_parser(config, &settings));
    let backend = Arc::new(MupdfBackend::new());

    // Documents share nothing, so each one gets its own blocking task.
    let stems = unique_stems(&files);
    let mut tasks = Vec::with_capacity(files.len());
    for (path, stem) in files.into_iter().zip(stems) {
        let parser = Arc::clone(&parser);
        let backend = Arc::clone(&backend);
        let task_path = path.clone();
        let handle = tokio::task::spawn_blocking(move || {
            parser.parse_path(&task_path, backend.as_ref())
        });
        tasks.push((path, stem, handle));
    }

    let mut stdout = std::io::stdout();
    let mut written = Vec::new();
    let mut parsed = 0usize;
    let mut failed = 0usize;

    for (path, stem, handle) in tasks {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match handle.await {
            Ok(Ok(doc)) => {
                let files = if doc.stats.fragment_stream_empty {
                    Vec::new()
                } else {
                    match export_document(&doc, &stem, &settings.output_dir, settings.format) {
                        Ok(files) => files,
                        Err(e) => {
                            tracing::warn!(file = %path.display(), error = %e, "export failed");
                            output::print_error(&mut stdout, &name, &e, color)?;
                            failed += 1;
                            continue;
                        }
                    }
                };
                output::print_document(&mut stdout, &name, &doc, &files, color)?;
                written.extend(files);
                parsed += 1;
            }
            Ok(Err(e)) => {
                tracing::debug!(file = %path.display(), error = %e, "document failed");
                output::print_failure(&mut stdout, &name, &e, settings.journal, color)?;
                failed += 1;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "parser task panicked");
                output::print_error(&mut stdout, &name, &e, color)?;
                failed += 1;
            }
        }
    }

    let archive = if settings.zip && !written.is_empty() {
        let dest = settings.output_dir.join(&zip_name);
        write_zip(&written, &dest).map_err(anyhow::Error::msg)?;
        Some(dest)
    } else {
        None
    };

    output::print_summary(&mut stdout, parsed, failed, archive.as_deref(), color)?;

    if parsed == 0 && failed > 0 {
        anyhow::bail!("no document could be parsed");
    }
    Ok(())
}

fn update_config(
    current: ConfigFile,
    journal: Option<Journal>,
    output_dir: Option<PathBuf>,
    format: Option<ExportFormat>,
    strict_surnames: Option<bool>,
) -> anyhow::Result<()> {
    let changed =
        journal.is_some() || output_dir.is_some() || format.is_some() || strict_surnames.is_some();

    if changed {
        let stored = config_file::config_path()
            .and_then(|p| config_file::load_from_path(&p))
            .unwrap_or_default();
        let update = ConfigFile {
            defaults: Some(DefaultsConfig {
                journal: journal.map(|j| j.id().to_string()),
                output_dir: output_dir.map(|p| p.display().to_string()),
                format: format.map(|f| f.to_string()),
                zip: None,
            }),
            matching: Some(MatchingConfig { strict_surnames }),
            journals: None,
        };
        let path = config_file::save_config(&config_file::merge(stored, update))
            .map_err(anyhow::Error::msg)?;
        println!("Saved {}", path.display());
        return Ok(());
    }

    if let Some(path) = config_file::config_path() {
        println!("# {}", path.display());
    }
    print!("{}", toml::to_string_pretty(&current)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_journal(journal: &str) -> ConfigFile {
        ConfigFile {
            defaults: Some(DefaultsConfig {
                journal: Some(journal.to_string()),
                format: Some("json".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn flags_beat_env_beat_config() {
        let config = config_with_journal("asq");
        let env = || EnvOverrides {
            journal: Some("jom".into()),
            output_dir: Some("env-out".into()),
        };

        let s =
            resolve_settings(&config, CliOverrides::default(), EnvOverrides::default()).unwrap();
        assert_eq!(s.journal, Journal::Asq);
        assert_eq!(s.format, ExportFormat::Json);
        assert_eq!(s.output_dir, PathBuf::from("."));

        let s = resolve_settings(&config, CliOverrides::default(), env()).unwrap();
        assert_eq!(s.journal, Journal::Jom);
        assert_eq!(s.output_dir, PathBuf::from("env-out"));

        let cli = CliOverrides {
            journal: Some(Journal::Aom),
            format: Some(ExportFormat::Csv),
            ..Default::default()
        };
        let s = resolve_settings(&config, cli, env()).unwrap();
        assert_eq!(s.journal, Journal::Aom);
        assert_eq!(s.format, ExportFormat::Csv);
    }

    #[test]
    fn missing_or_unknown_journal_is_an_error() {
        let err = resolve_settings(
            &ConfigFile::default(),
            CliOverrides::default(),
            EnvOverrides::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("--journal"));

        assert!(
            resolve_settings(
                &config_with_journal("nature"),
                CliOverrides::default(),
                EnvOverrides::default()
            )
            .is_err()
        );
    }

    #[test]
    fn strict_surnames_from_config() {
        let config = ConfigFile {
            matching: Some(MatchingConfig {
                strict_surnames: Some(true),
            }),
            ..config_with_journal("personnel")
        };
        let s =
            resolve_settings(&config, CliOverrides::default(), EnvOverrides::default()).unwrap();
        assert!(s.strict_surnames);
        let parser = build_parser(&config, &s);
        assert_eq!(parser.profile().id, "personnel");
    }

    #[test]
    fn config_tunables_reach_the_profile() {
        let mut journals = std::collections::BTreeMap::new();
        journals.insert(
            "orgsci".to_string(),
            config_file::JournalTunables {
                skip_first_pages: Some(1),
                ..Default::default()
            },
        );
        let config = ConfigFile {
            journals: Some(journals),
            ..config_with_journal("orgsci")
        };
        let s =
            resolve_settings(&config, CliOverrides::default(), EnvOverrides::default()).unwrap();
        let parser = build_parser(&config, &s);
        assert_eq!(parser.profile().layout.skip_first_pages, 1);
    }

    #[test]
    fn stem_falls_back_for_odd_paths() {
        assert_eq!(file_stem(Path::new("dir/paper.pdf")), "paper");
        assert_eq!(file_stem(Path::new("/")), "document");
    }

    #[test]
    fn same_named_inputs_get_distinct_stems() {
        let paths: Vec<PathBuf> = [
            "a/paper.pdf",
            "b/paper.pdf",
            "paper-2.pdf",
            "c/Paper.pdf",
            "x.pdf",
        ]
        .iter()
        .map(PathBuf::from)
        .collect();
        assert_eq!(
            unique_stems(&paths),
            vec!["paper", "paper-2", "paper-2-2", "Paper-3", "x"]
        );
    }
}
