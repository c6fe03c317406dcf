use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub segmentation: Option<SegmentationConfig>,
    pub database: Option<DatabaseConfig>,
    pub corpus: Option<CorpusConfig>,
    pub concurrency: Option<ConcurrencyConfig>,
}

/// Calibration constants of the segmentation engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub corruption_sample_chars: Option<usize>,
    pub min_alpha_ratio: Option<f64>,
    pub max_nonprintable_ratio: Option<f64>,
    pub max_noise_run: Option<usize>,
    pub keyword_window_chars: Option<usize>,
    pub min_abstract_chars: Option<usize>,
    pub reference_floor: Option<f64>,
    pub reference_floor_min_len: Option<usize>,
    pub evidence_window_chars: Option<usize>,
    pub keep_heading: Option<bool>,
    /// Extra section-opener keywords (regex fragments) appended to the defaults.
    pub extra_openers: Option<Vec<String>>,
    /// Extra reference heading keywords (regex fragments) appended to the defaults.
    pub extra_reference_headings: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: Option<String>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusConfig {
    pub root: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConcurrencyConfig {
    pub num_workers: Option<usize>,
}

/// Platform config directory path: `<config_dir>/delfi/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("delfi").join("config.toml"))
}

/// Load config by cascading CWD `.delfi.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".delfi.toml"));

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
    toml::from_str(&content).ok()
}

fn pick<T: Clone>(overlay: Option<&T>, base: Option<&T>) -> Option<T> {
    overlay.or(base).cloned()
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bs = base.segmentation.unwrap_or_default();
    let os = overlay.segmentation.unwrap_or_default();
    let bd = base.database.unwrap_or_default();
    let od = overlay.database.unwrap_or_default();
    let bc = base.corpus.unwrap_or_default();
    let oc = overlay.corpus.unwrap_or_default();
    let bn = base.concurrency.unwrap_or_default();
    let on = overlay.concurrency.unwrap_or_default();

    ConfigFile {
        segmentation: Some(SegmentationConfig {
            corruption_sample_chars: pick(
                os.corruption_sample_chars.as_ref(),
                bs.corruption_sample_chars.as_ref(),
            ),
            min_alpha_ratio: pick(os.min_alpha_ratio.as_ref(), bs.min_alpha_ratio.as_ref()),
            max_nonprintable_ratio: pick(
                os.max_nonprintable_ratio.as_ref(),
                bs.max_nonprintable_ratio.as_ref(),
            ),
            max_noise_run: pick(os.max_noise_run.as_ref(), bs.max_noise_run.as_ref()),
            keyword_window_chars: pick(
                os.keyword_window_chars.as_ref(),
                bs.keyword_window_chars.as_ref(),
            ),
            min_abstract_chars: pick(
                os.min_abstract_chars.as_ref(),
                bs.min_abstract_chars.as_ref(),
            ),
            reference_floor: pick(os.reference_floor.as_ref(), bs.reference_floor.as_ref()),
            reference_floor_min_len: pick(
                os.reference_floor_min_len.as_ref(),
                bs.reference_floor_min_len.as_ref(),
            ),
            evidence_window_chars: pick(
                os.evidence_window_chars.as_ref(),
                bs.evidence_window_chars.as_ref(),
            ),
            keep_heading: pick(os.keep_heading.as_ref(), bs.keep_heading.as_ref()),
            extra_openers: pick(os.extra_openers.as_ref(), bs.extra_openers.as_ref()),
            extra_reference_headings: pick(
                os.extra_reference_headings.as_ref(),
                bs.extra_reference_headings.as_ref(),
            ),
        }),
        database: Some(DatabaseConfig {
            path: pick(od.path.as_ref(), bd.path.as_ref()),
            batch_size: pick(od.batch_size.as_ref(), bd.batch_size.as_ref()),
        }),
        corpus: Some(CorpusConfig {
            root: pick(oc.root.as_ref(), bc.root.as_ref()),
        }),
        concurrency: Some(ConcurrencyConfig {
            num_workers: pick(on.num_workers.as_ref(), bn.num_workers.as_ref()),
        }),
    }
}

/// Save the current config to the platform config directory.
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
