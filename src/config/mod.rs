// src/config/mod.rs
//! Service configuration (TOML) with env overrides.
//!
//! Lookup order:
//! 1) `$NEWS_TRENDS_CONFIG_PATH` (must exist)
//! 2) `config/news_trends.toml`
//! 3) built-in defaults
//!
//! Then `NEWS_TRENDS_STORAGE`, `NEWS_TRENDS_DATA_DIR` and `GDELT_MAX_RECORDS`
//! override whatever the file said.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::sentiment::SentimentAnalyzer;
use crate::store::{JsonlFileStore, MemoryStore, RecordStore};

pub const DEFAULT_CONFIG_PATH: &str = "config/news_trends.toml";
pub const ENV_CONFIG_PATH: &str = "NEWS_TRENDS_CONFIG_PATH";
pub const ENV_STORAGE: &str = "NEWS_TRENDS_STORAGE";
pub const ENV_DATA_DIR: &str = "NEWS_TRENDS_DATA_DIR";
pub const ENV_GDELT_MAX_RECORDS: &str = "GDELT_MAX_RECORDS";

/// GDELT caps artlist responses at 250 records.
const GDELT_MAX_RECORDS_CAP: u32 = 250;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gdelt: GdeltConfig,
    pub storage: StorageConfig,
    pub sentiment: SentimentConfig,
}

fn default_base_url() -> String {
    "https://api.gdeltproject.org/api/v2/doc/doc".to_string()
}
fn default_max_records() -> u32 {
    10
}
fn default_source_lang() -> String {
    "english".to_string()
}
fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct GdeltConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_max_records")]
    pub max_records: u32,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GdeltConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            max_records: default_max_records(),
            source_lang: default_source_lang(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Jsonl,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "jsonl" | "file" => Ok(StorageBackend::Jsonl),
            other => Err(anyhow!("unsupported storage backend '{other}'")),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl StorageConfig {
    pub fn build_store(&self) -> Arc<dyn RecordStore> {
        match self.backend {
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
            StorageBackend::Jsonl => Arc::new(JsonlFileStore::new(self.data_dir.clone())),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SentimentConfig {
    /// Inline lexicon additions (word -> weight). Win over `extras_path`.
    pub extras: HashMap<String, i32>,
    /// Optional JSON file with more lexicon additions.
    pub extras_path: Option<PathBuf>,
}

impl SentimentConfig {
    pub fn build_analyzer(&self) -> Result<SentimentAnalyzer> {
        let mut merged: HashMap<String, i32> = HashMap::new();
        if let Some(p) = &self.extras_path {
            let raw = fs::read_to_string(p)
                .with_context(|| format!("reading lexicon extras from {}", p.display()))?;
            let from_file: HashMap<String, i32> = serde_json::from_str(&raw)
                .with_context(|| format!("parsing lexicon extras {}", p.display()))?;
            merged.extend(from_file);
        }
        merged.extend(self.extras.iter().map(|(k, v)| (k.clone(), *v)));
        Ok(SentimentAnalyzer::with_extras(merged))
    }
}

impl AppConfig {
    /// Parse a TOML file (no env overrides).
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(cfg.sanitized())
    }

    /// File lookup (env path, default path, built-ins) plus env overrides.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            Self::load_from(&pb)?
        } else {
            let p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(&p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides()?;
        Ok(cfg.sanitized())
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var(ENV_STORAGE) {
            self.storage.backend = v.parse()?;
        }
        if let Ok(v) = std::env::var(ENV_DATA_DIR) {
            if !v.trim().is_empty() {
                self.storage.data_dir = PathBuf::from(v.trim());
            }
        }
        if let Ok(v) = std::env::var(ENV_GDELT_MAX_RECORDS) {
            self.gdelt.max_records = v
                .trim()
                .parse()
                .with_context(|| format!("{ENV_GDELT_MAX_RECORDS} must be an integer, got '{v}'"))?;
        }
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        self.gdelt.max_records = self.gdelt.max_records.clamp(1, GDELT_MAX_RECORDS_CAP);
        if self.gdelt.timeout_secs == 0 {
            self.gdelt.timeout_secs = default_timeout_secs();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
[storage]
backend = "jsonl"
"#,
        )
        .unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Jsonl);
        assert_eq!(cfg.storage.data_dir, PathBuf::from("data"));
        assert_eq!(cfg.gdelt.max_records, 10);
        assert_eq!(cfg.gdelt.source_lang, "english");
        assert!(cfg.sentiment.extras.is_empty());
    }

    #[test]
    fn max_records_is_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("c.toml");
        fs::write(&p, "[gdelt]\nmax_records = 9000\ntimeout_secs = 0\n").unwrap();
        let cfg = AppConfig::load_from(&p).unwrap();
        assert_eq!(cfg.gdelt.max_records, 250);
        assert_eq!(cfg.gdelt.timeout_secs, 10);
    }

    #[test]
    fn inline_extras_beat_file_extras() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("extras.json");
        fs::write(&p, r#"{"tesla": 2, "recall": -4}"#).unwrap();
        let mut extras = HashMap::new();
        extras.insert("tesla".to_string(), -1);
        let sc = SentimentConfig {
            extras,
            extras_path: Some(p),
        };
        let a = sc.build_analyzer().unwrap();
        assert_eq!(a.score("tesla").raw_score, -1);
        assert_eq!(a.score("recall").raw_score, -4);
    }

    #[test]
    fn backend_parses_aliases() {
        assert_eq!("FILE".parse::<StorageBackend>().unwrap(), StorageBackend::Jsonl);
        assert_eq!(" mem ".parse::<StorageBackend>().unwrap(), StorageBackend::Memory);
        assert!("dynamo".parse::<StorageBackend>().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_STORAGE);
        env::remove_var(ENV_DATA_DIR);
        env::remove_var(ENV_GDELT_MAX_RECORDS);

        // No files → built-ins
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);

        // ./config/news_trends.toml
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join(DEFAULT_CONFIG_PATH),
            "[gdelt]\nmax_records = 25\n",
        )
        .unwrap();
        assert_eq!(AppConfig::load_default().unwrap().gdelt.max_records, 25);

        // Env path wins over the default file, env overrides win over both
        let p_env = tmp.path().join("other.toml");
        fs::write(&p_env, "[gdelt]\nmax_records = 40\n").unwrap();
        env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
        assert_eq!(AppConfig::load_default().unwrap().gdelt.max_records, 40);

        env::set_var(ENV_GDELT_MAX_RECORDS, "7");
        env::set_var(ENV_STORAGE, "jsonl");
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.gdelt.max_records, 7);
        assert_eq!(cfg.storage.backend, StorageBackend::Jsonl);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(AppConfig::load_default().is_err());

        env::remove_var(ENV_CONFIG_PATH);
        env::remove_var(ENV_STORAGE);
        env::remove_var(ENV_GDELT_MAX_RECORDS);
        env::set_current_dir(&old).unwrap();
    }
}
