use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub defaults: Option<DefaultsConfig>,
    pub matching: Option<MatchingConfig>,
    /// Per-journal tunables keyed by profile id (`orgsci`, `asq`, ...).
    pub journals: Option<BTreeMap<String, JournalTunables>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub journal: Option<String>,
    pub output_dir: Option<String>,
    /// `csv` or `json`.
    pub format: Option<String>,
    pub zip: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Require surnames to match whole words of the reference text.
    pub strict_surnames: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JournalTunables {
    pub oversized_fragment_threshold: Option<usize>,
    /// Crop insets `[left, top, right, bottom]` in points.
    pub crop: Option<[f32; 4]>,
    pub skip_first_pages: Option<usize>,
    pub skip_last_pages: Option<usize>,
    pub rounding_decimals: Option<u32>,
}

/// Platform config directory path: `<config_dir>/papersense/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("papersense").join("config.toml"))
}

/// Load config by cascading CWD `.papersense.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".papersense.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let base_defaults = base.defaults.unwrap_or_default();
    let overlay_defaults = overlay.defaults.unwrap_or_default();
    let base_matching = base.matching.unwrap_or_default();
    let overlay_matching = overlay.matching.unwrap_or_default();

    let mut journals = base.journals.unwrap_or_default();
    for (id, over) in overlay.journals.unwrap_or_default() {
        let merged = match journals.remove(&id) {
            Some(under) => merge_tunables(under, over),
            None => over,
        };
        journals.insert(id, merged);
    }

    ConfigFile {
        defaults: Some(DefaultsConfig {
            journal: overlay_defaults.journal.or(base_defaults.journal),
            output_dir: overlay_defaults.output_dir.or(base_defaults.output_dir),
            format: overlay_defaults.format.or(base_defaults.format),
            zip: overlay_defaults.zip.or(base_defaults.zip),
        }),
        matching: Some(MatchingConfig {
            strict_surnames: overlay_matching
                .strict_surnames
                .or(base_matching.strict_surnames),
        }),
        journals: if journals.is_empty() {
            None
        } else {
            Some(journals)
        },
    }
}

fn merge_tunables(base: JournalTunables, overlay: JournalTunables) -> JournalTunables {
    JournalTunables {
        oversized_fragment_threshold: overlay
            .oversized_fragment_threshold
            .or(base.oversized_fragment_threshold),
        crop: overlay.crop.or(base.crop),
        skip_first_pages: overlay.skip_first_pages.or(base.skip_first_pages),
        skip_last_pages: overlay.skip_last_pages.or(base.skip_last_pages),
        rounding_decimals: overlay.rounding_decimals.or(base.rounding_decimals),
    }
}

/// Save the config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(&path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(path)
}
