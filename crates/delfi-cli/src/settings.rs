//! Resolution of runtime settings: CLI flags > environment > config file >
//! defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;

use delfi_core::config_file::{self, ConfigFile};
use delfi_segment::{SegmentConfigBuilder, Segmenter};
use delfi_store::DEFAULT_BATCH_SIZE;

pub const DB_PATH_ENV: &str = "DELFI_DB_PATH";
pub const CORPUS_ROOT_ENV: &str = "DELFI_CORPUS_ROOT";
const DEFAULT_DB_PATH: &str = "delfi.sqlite";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub file: ConfigFile,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// First of flag, environment value and config-file value.
fn resolve_path(
    flag: Option<PathBuf>,
    env: Option<String>,
    file: Option<&String>,
) -> Option<PathBuf> {
    flag.or_else(|| env.map(PathBuf::from))
        .or_else(|| file.map(PathBuf::from))
}

impl Settings {
    /// Load `explicit` if given (it must exist and parse), otherwise the
    /// layered platform + working-directory config.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let file = match explicit {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => config_file::load_config(),
        };
        Ok(Self { file })
    }

    pub fn segmenter(&self) -> anyhow::Result<Segmenter> {
        let builder = match &self.file.segmentation {
            Some(s) => SegmentConfigBuilder::from_file_config(s),
            None => SegmentConfigBuilder::new(),
        };
        let config = builder
            .build()
            .context("invalid keyword pattern in [segmentation]")?;
        Ok(Segmenter::with_config(config))
    }

    pub fn db_path(&self, flag: Option<PathBuf>) -> PathBuf {
        let file = self.file.database.as_ref().and_then(|d| d.path.as_ref());
        resolve_path(flag, env_var(DB_PATH_ENV), file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    pub fn corpus_root(&self, flag: Option<PathBuf>) -> Option<PathBuf> {
        let file = self.file.corpus.as_ref().and_then(|c| c.root.as_ref());
        resolve_path(flag, env_var(CORPUS_ROOT_ENV), file)
    }

    pub fn batch_size(&self, flag: Option<usize>) -> usize {
        flag.or_else(|| self.file.database.as_ref().and_then(|d| d.batch_size))
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .max(1)
    }

    pub fn num_workers(&self, flag: Option<usize>) -> usize {
        flag.or_else(|| self.file.concurrency.as_ref().and_then(|c| c.num_workers))
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delfi_core::config_file::{ConcurrencyConfig, DatabaseConfig};

    #[test]
    fn flag_beats_env_beats_file() {
        let file = "from-file.sqlite".to_string();
        assert_eq!(
            resolve_path(
                Some(PathBuf::from("flag.sqlite")),
                Some("env.sqlite".into()),
                Some(&file)
            ),
            Some(PathBuf::from("flag.sqlite"))
        );
        assert_eq!(
            resolve_path(None, Some("env.sqlite".into()), Some(&file)),
            Some(PathBuf::from("env.sqlite"))
        );
        assert_eq!(
            resolve_path(None, None, Some(&file)),
            Some(PathBuf::from("from-file.sqlite"))
        );
        assert_eq!(resolve_path(None, None, None), None);
    }

    #[test]
    fn numeric_settings() {
        let settings = Settings {
            file: ConfigFile {
                database: Some(DatabaseConfig {
                    path: None,
                    batch_size: Some(0),
                }),
                concurrency: Some(ConcurrencyConfig {
                    num_workers: Some(3),
                }),
                ..Default::default()
            },
        };
        assert_eq!(settings.batch_size(None), 1);
        assert_eq!(settings.batch_size(Some(20)), 20);
        assert_eq!(settings.num_workers(None), 3);
        assert_eq!(settings.num_workers(Some(8)), 8);
        assert_eq!(Settings::default().batch_size(None), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delfi.toml");
        std::fs::write(
            &path,
            "[segmentation]\nkeyword_window_chars = 1500\nextra_openers = [\"Problemstellung\"]\n",
        )
        .unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        let segmenter = settings.segmenter().unwrap();
        assert_eq!(segmenter.config().keyword_window_chars(), 1500);

        assert!(Settings::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn invalid_keyword_pattern_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delfi.toml");
        std::fs::write(&path, "[segmentation]\nextra_reference_headings = [\"(\"]\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert!(settings.segmenter().is_err());
    }
}
